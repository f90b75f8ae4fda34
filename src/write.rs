//! Write operations for modifying data in DynamoDB tables.
//!
//! This module provides operations for writing data to DynamoDB:
//! - Putting new items or replacing existing ones
//! - Updating items with set, remove, add and delete actions
//! - Deleting items by primary key
//! - Batch writing multiple items

/// Batch write item operation for efficiently writing multiple items.
pub mod batch_write_item;

/// Arguments and helpers shared by the write builders.
pub(crate) mod common;

/// Delete item operation for removing items from tables.
pub mod delete_item;

/// Put item operation for creating or replacing items.
pub mod put_item;

/// Update item operation for modifying existing items.
pub mod update_item;
