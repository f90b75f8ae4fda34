//! Common utilities for DynamoDB operations.
//!
//! This module provides the expression compiler and the shared state used across read
//! and write builders: attribute paths, clause accumulation, conditions and keys.

#[doc(hidden)]
pub mod clause;

/// Condition builder surface for filters and conditional writes.
pub mod condition;

/// Expression compiler turning path/operator/operand triples into placeholders.
pub mod expression;

/// Key schema and key extraction.
pub mod key;

/// Attribute path parsing.
pub mod path;

use crate::error::InputError;

use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::{to_attribute_value, to_item};
use std::collections;

/// Raw DynamoDB item.
pub type Item = collections::HashMap<String, types::AttributeValue>;

/// Compiled expression fragment with the placeholders it references.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpressionInput {
    /// Expression fragment.
    pub expression: String,
    /// Name placeholders referenced by the fragment.
    pub expression_attribute_names: collections::HashMap<String, String>,
    /// Value placeholders referenced by the fragment.
    pub expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

pub(crate) fn to_operand(value: impl Serialize) -> Result<expression::Operand, InputError> {
    let value = to_attribute_value(value)?;
    Ok(expression::Operand::One(value))
}

pub(crate) fn to_operand_pair(
    first: impl Serialize,
    second: impl Serialize,
) -> Result<expression::Operand, InputError> {
    let first = to_attribute_value(first)?;
    let second = to_attribute_value(second)?;
    Ok(expression::Operand::Two(first, second))
}

pub(crate) fn to_operand_list<T: Serialize>(
    values: impl IntoIterator<Item = T>,
) -> Result<expression::Operand, InputError> {
    let mut serialized = Vec::new();
    for value in values {
        serialized.push(to_attribute_value(value)?);
    }
    Ok(expression::Operand::Many(serialized))
}

pub(crate) fn to_raw_item(value: impl Serialize) -> Result<Item, InputError> {
    let item = to_item(value)?;
    Ok(item)
}
