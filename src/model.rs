//! Model metadata and the entry points of every operation.

use crate::{
    client::Client,
    common::key::KeySchema,
    error::{Error, Result},
    read::{batch_get_item::BatchGet, get_item::Get, query::Query, scan::Scan},
    write::{batch_write_item::BatchWrite, delete_item::Delete, put_item::Put, update_item::Update},
};

use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};

/// Attribute names maintained automatically on writes.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Timestamps {
    /// Set once, when the item is first put.
    pub created_at: String,
    /// Set on every put and update.
    pub updated_at: String,
}

impl Default for Timestamps {
    fn default() -> Self {
        Self {
            created_at: "created_at".to_string(),
            updated_at: "updated_at".to_string(),
        }
    }
}

/// Table metadata of a model.
///
/// ```rust
/// use dynamodb_odm::{common::key::KeySchema, model::{Schema, Timestamps}};
///
/// let schema = Schema::new("events", "user_id")
///     .sort_key("at")
///     .index("by_kind", KeySchema::new("kind").sort_key("at"))
///     .timestamps(Timestamps::default());
/// assert_eq!(schema.key_schema(Some("by_kind")).unwrap().partition_key, "kind");
/// assert!(schema.key_schema(Some("by_status")).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    /// Table name.
    pub table_name: String,
    /// Primary key of the table.
    pub key: KeySchema,
    /// Secondary indexes by name.
    pub indexes: IndexMap<String, KeySchema>,
    /// Automatic timestamps, if any.
    pub timestamps: Option<Timestamps>,
}

impl Schema {
    /// Schema of a table keyed by `partition_key` only.
    pub fn new(table_name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            key: KeySchema::new(partition_key),
            indexes: IndexMap::new(),
            timestamps: None,
        }
    }

    /// Add a sort key to the primary key.
    pub fn sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.key = self.key.sort_key(sort_key);
        self
    }

    /// Register a secondary index.
    pub fn index(mut self, name: impl Into<String>, key: KeySchema) -> Self {
        self.indexes.insert(name.into(), key);
        self
    }

    /// Maintain creation and update timestamps.
    pub fn timestamps(mut self, timestamps: Timestamps) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    /// Key schema of the table, or of the named index.
    pub fn key_schema(&self, index: Option<&str>) -> Result<&KeySchema> {
        match index {
            None => Ok(&self.key),
            Some(name) => self.indexes.get(name).ok_or_else(|| {
                Error::Schema(format!(
                    "unknown index `{name}` on table `{}`",
                    self.table_name
                ))
            }),
        }
    }
}

/// A type stored as items of one table.
///
/// Keys passed to the entry points can be any value serializing to a map holding
/// the key attributes; a full model instance works too.
///
/// ```rust,no_run
/// use dynamodb_odm::{Model, model::Schema};
/// use serde::{Deserialize, Serialize};
/// use std::sync::LazyLock;
///
/// #[derive(Deserialize, Serialize)]
/// struct User {
///     id: String,
///     name: String,
/// }
///
/// impl Model for User {
///     fn schema() -> &'static Schema {
///         static SCHEMA: LazyLock<Schema> = LazyLock::new(|| Schema::new("users", "id"));
///         &SCHEMA
///     }
/// }
///
/// # async fn example(client: &aws_sdk_dynamodb::Client) -> dynamodb_odm::Result<()> {
/// let _user = User::get(client, serde_json::json!({"id": "1"})).execute().await?;
/// # Ok(())
/// # }
/// ```
pub trait Model: Serialize + DeserializeOwned + Send + Sync {
    /// Table metadata.
    fn schema() -> &'static Schema;

    /// Check the instance before it is written.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Put `item`, replacing any item with the same key.
    fn put<C: Client + ?Sized>(client: &C, item: Self) -> Put<'_, Self, C> {
        Put::new(client, item)
    }

    /// Get the item with `key`.
    fn get<C: Client + ?Sized>(client: &C, key: impl Serialize) -> Get<'_, Self, C> {
        Get::new(client, key)
    }

    /// Query the items whose partition key equals `partition`.
    fn query<C: Client + ?Sized>(client: &C, partition: impl Serialize) -> Query<'_, Self, C> {
        Query::new(client, partition)
    }

    /// Scan the table.
    fn scan<C: Client + ?Sized>(client: &C) -> Scan<'_, Self, C> {
        Scan::new(client)
    }

    /// Update the item with `key`.
    fn update<C: Client + ?Sized>(client: &C, key: impl Serialize) -> Update<'_, Self, C> {
        Update::new(client, key)
    }

    /// Delete the item with `key`.
    fn delete<C: Client + ?Sized>(client: &C, key: impl Serialize) -> Delete<'_, Self, C> {
        Delete::new(client, key)
    }

    /// Get the items with `keys`.
    fn batch_get<C: Client + ?Sized, K: Serialize>(
        client: &C,
        keys: impl IntoIterator<Item = K>,
    ) -> BatchGet<'_, Self, C> {
        BatchGet::new(client, keys)
    }

    /// Put and delete items in batches.
    fn batch_write<C: Client + ?Sized>(client: &C) -> BatchWrite<'_, Self, C> {
        BatchWrite::new(client)
    }
}
