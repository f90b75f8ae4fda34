use crate::{
    common,
    config::Config,
    error::Result,
    model::{Model, Timestamps},
};

use aws_sdk_dynamodb::types;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_dynamo::from_item;

/// Arguments shared by every write builder.
///
/// `now` is read once when the builder is created, so that serializing the same
/// builder twice yields the same request.
#[derive(Clone, Debug)]
pub(crate) struct WriteArgs {
    pub(crate) now: DateTime<Utc>,
    pub(crate) return_consumed_capacity: types::ReturnConsumedCapacity,
    pub(crate) return_item_collection_metrics: types::ReturnItemCollectionMetrics,
    pub(crate) table_name: Option<String>,
}

impl Default for WriteArgs {
    fn default() -> Self {
        let config = Config::global();
        Self {
            now: Utc::now(),
            return_consumed_capacity: config.return_consumed_capacity.clone(),
            return_item_collection_metrics: config.return_item_collection_metrics.clone(),
            table_name: None,
        }
    }
}

impl WriteArgs {
    pub(crate) fn table_name<M: Model>(&self) -> String {
        self.table_name
            .clone()
            .unwrap_or_else(|| M::schema().table_name.clone())
    }

    /// Time stored in timestamp attributes.
    pub(crate) fn timestamp(&self) -> String {
        self.now.to_rfc3339()
    }
}

/// generate the setters shared by every write builder
macro_rules! write_args_methods {
    () => {
        /// Write to `table_name` instead of the model's table.
        pub fn table(mut self, table_name: impl Into<String>) -> Self {
            self.write_args.table_name = Some(table_name.into());
            self
        }

        /// Override the consumed capacity level from the configuration.
        pub fn return_consumed_capacity(
            mut self,
            return_consumed_capacity: aws_sdk_dynamodb::types::ReturnConsumedCapacity,
        ) -> Self {
            self.write_args.return_consumed_capacity = return_consumed_capacity;
            self
        }

        /// Override the item collection metrics level from the configuration.
        pub fn return_item_collection_metrics(
            mut self,
            return_item_collection_metrics: aws_sdk_dynamodb::types::ReturnItemCollectionMetrics,
        ) -> Self {
            self.write_args.return_item_collection_metrics = return_item_collection_metrics;
            self
        }

        /// Stamp timestamp attributes with `now` instead of the builder's creation time.
        pub fn now(mut self, now: chrono::DateTime<chrono::Utc>) -> Self {
            self.write_args.now = now;
            self
        }
    };
}
pub(crate) use write_args_methods;

/// Stamp `updated_at`, and `created_at` unless the item already carries one.
pub(crate) fn stamp(item: &mut common::Item, timestamps: &Timestamps, now: &str) {
    let now = types::AttributeValue::S(now.to_string());
    let created_at = item
        .entry(timestamps.created_at.clone())
        .or_insert_with(|| types::AttributeValue::Null(true));
    if created_at.is_null() {
        *created_at = now.clone();
    }
    item.insert(timestamps.updated_at.clone(), now);
}

/// Model built from the attributes returned by a write, if any.
pub(crate) fn returned<M: DeserializeOwned>(
    attributes: Option<common::Item>,
) -> Result<Option<M>> {
    let item = attributes
        .filter(|attributes| !attributes.is_empty())
        .map(from_item)
        .transpose()?;
    Ok(item)
}
