#![deny(missing_docs)]
#![deny(warnings)]

//! # DynamoDB ODM
//!
//! An object-document mapper for Amazon DynamoDB.
//!
//! ## Overview
//!
//! Models describe their table once; every operation is then a fluent builder that:
//! - Compiles attribute paths and values into placeholder-safe expressions
//! - Serializes to the SDK request it would send, without sending it
//! - Executes through any [`Client`], following pages and unprocessed batch items
//!
//! ## Quick Example
//!
//! ```no_run
//! use dynamodb_odm::{Model, common::condition::Conditional, model::Schema};
//! use serde::{Deserialize, Serialize};
//! use std::sync::LazyLock;
//!
//! #[derive(Debug, Deserialize, Serialize)]
//! struct User {
//!     id: String,
//!     name: String,
//!     age: u32,
//! }
//!
//! impl Model for User {
//!     fn schema() -> &'static Schema {
//!         static SCHEMA: LazyLock<Schema> = LazyLock::new(|| Schema::new("users", "id"));
//!         &SCHEMA
//!     }
//! }
//!
//! # async fn example(client: &aws_sdk_dynamodb::Client) -> dynamodb_odm::Result<()> {
//! // "SET #set0_name_0 = :set0_name, #set0_age_0 = #set0_age_0 + :set0_age"
//! let user = User::update(client, serde_json::json!({"id": "1"}))
//!     .set("name").to("Jane")
//!     .set("age").plus(1)
//!     .condition("age").lt(100)
//!     .execute()
//!     .await?;
//! println!("{user:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@common`] - Expression compiler, conditions and key schemas
//! - [`mod@read`] - Read operations (GetItem, Query, Scan, BatchGetItem)
//! - [`mod@write`] - Write operations (PutItem, UpdateItem, DeleteItem, BatchWriteItem)
//! - [`mod@pagination`] - Page-by-page execution of queries, scans and batches

/// Database client seam.
pub mod client;

/// Expression compiler, conditions and key schemas.
pub mod common;

/// Process-wide defaults.
pub mod config;

/// Error types.
pub mod error;

/// Model metadata and operation entry points.
pub mod model;

/// Page-by-page execution of queries, scans and batches.
pub mod pagination;

/// Read operations for retrieving data from DynamoDB tables.
///
/// This module provides operations for:
/// - Getting individual items by key
/// - Querying items with key conditions
/// - Scanning entire tables
/// - Batch retrieving multiple items
pub mod read;

/// Write operations for modifying data in DynamoDB tables.
///
/// This module provides operations for:
/// - Putting new items or replacing existing ones
/// - Updating items with set, remove, add and delete actions
/// - Deleting items by key
/// - Batch writing multiple items
pub mod write;

#[cfg(test)]
mod mock;

pub use client::Client;
pub use config::Config;
pub use error::{Error, Result};
pub use model::Model;
