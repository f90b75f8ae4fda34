use crate::{
    client::Client,
    common,
    error::{Error, InputError, Result},
    model::Model,
    pagination::{BatchWriteRequest, Paginator},
    read, write,
};

use aws_sdk_dynamodb::{
    operation::batch_write_item::{BatchWriteItemInput, BatchWriteItemOutput},
    types,
};
use futures::{Stream, StreamExt, TryStreamExt};
use serde::Serialize;
use std::{collections, marker};

/// Most write requests DynamoDB accepts in one BatchWriteItem request.
pub const MAX_WRITES_PER_REQUEST: usize = 25;

/// One BatchWriteItem round.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchWritePage {
    /// Capacity consumed by the round.
    pub consumed_capacity: Vec<types::ConsumedCapacity>,
    /// Item collection metrics by table name.
    pub item_collection_metrics: collections::HashMap<String, Vec<types::ItemCollectionMetrics>>,
    /// Number of writes left unprocessed, sent again in the next round.
    pub unprocessed: usize,
}

impl From<BatchWriteItemOutput> for BatchWritePage {
    fn from(output: BatchWriteItemOutput) -> Self {
        let unprocessed = output
            .unprocessed_items
            .iter()
            .flat_map(|unprocessed| unprocessed.values())
            .map(Vec::len)
            .sum();
        Self {
            consumed_capacity: output.consumed_capacity.unwrap_or_default(),
            item_collection_metrics: output.item_collection_metrics.unwrap_or_default(),
            unprocessed,
        }
    }
}

#[derive(Debug)]
enum Write {
    Put(Result<common::Item, InputError>),
    Invalid(String),
    Delete(Result<common::Item, InputError>),
}

/// Batch write item operation.
///
/// Puts and deletes are collected up front and sent in chunks of
/// [`MAX_WRITES_PER_REQUEST`]; unprocessed writes are sent again until the service
/// reports none.
///
/// ```rust,no_run
/// # use dynamodb_odm::{Client, Model};
/// # async fn example<M: Model, C: Client>(client: &C, items: Vec<M>) -> dynamodb_odm::Result<()> {
/// let consumed_capacity = items
///     .iter()
///     .fold(M::batch_write(client), |batch, item| batch.put(item))
///     .delete(serde_json::json!({"id": "stale"}))
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BatchWrite<'c, M, C: ?Sized> {
    client: &'c C,
    writes: Vec<Write>,
    write_args: write::common::WriteArgs,
    model: marker::PhantomData<fn() -> M>,
}

impl<'c, M: Model, C: Client + ?Sized> BatchWrite<'c, M, C> {
    pub(crate) fn new(client: &'c C) -> Self {
        Self {
            client,
            writes: Vec::new(),
            write_args: write::common::WriteArgs::default(),
            model: marker::PhantomData,
        }
    }

    write::common::write_args_methods!();

    /// Put `item`, replacing any item with the same key.
    pub fn put(mut self, item: &M) -> Self {
        let write = match item.validate() {
            Ok(()) => Write::Put(common::to_raw_item(item)),
            Err(reason) => Write::Invalid(reason),
        };
        self.writes.push(write);
        self
    }

    /// Delete the item with `key`.
    pub fn delete(mut self, key: impl Serialize) -> Self {
        self.writes.push(Write::Delete(common::to_raw_item(key)));
        self
    }

    fn write_request(&self, write: &Write) -> Result<types::WriteRequest> {
        let schema = M::schema();
        let request = match write {
            Write::Put(item) => {
                let mut item = item.as_ref().map_err(Clone::clone)?.clone();
                schema.key.extract(&item)?;
                if let Some(timestamps) = &schema.timestamps {
                    write::common::stamp(&mut item, timestamps, &self.write_args.timestamp());
                }
                let put_request = types::PutRequest::builder().set_item(Some(item)).build()?;
                types::WriteRequest::builder().put_request(put_request).build()
            }
            Write::Invalid(reason) => return Err(Error::Validation(reason.clone())),
            Write::Delete(key) => {
                let key = schema.key.extract(key.as_ref().map_err(Clone::clone)?)?;
                let delete_request = types::DeleteRequest::builder().set_key(Some(key)).build()?;
                types::WriteRequest::builder().delete_request(delete_request).build()
            }
        };
        Ok(request)
    }

    /// Serialize the writes into the first round plus the queued chunks.
    ///
    /// `None` when there is nothing to write.
    pub fn to_request(&self) -> Result<Option<BatchWriteRequest>> {
        let table_name = self.write_args.table_name::<M>();
        let requests = self
            .writes
            .iter()
            .map(|write| self.write_request(write))
            .collect::<Result<Vec<_>>>()?;
        let mut chunks: collections::VecDeque<_> = requests
            .chunks(MAX_WRITES_PER_REQUEST)
            .map(|chunk| collections::HashMap::from([(table_name.clone(), chunk.to_vec())]))
            .collect();
        let Some(request_items) = chunks.pop_front() else {
            return Ok(None);
        };
        let input = BatchWriteItemInput::builder()
            .set_request_items(Some(request_items))
            .return_consumed_capacity(self.write_args.return_consumed_capacity.clone())
            .return_item_collection_metrics(
                self.write_args.return_item_collection_metrics.clone(),
            )
            .build()?;
        Ok(Some(BatchWriteRequest {
            input,
            pending: chunks,
        }))
    }

    /// Lazy stream of rounds; an empty batch yields no round.
    pub fn pages(&self) -> Result<impl Stream<Item = Result<BatchWritePage>> + use<'c, M, C>> {
        let request = self.to_request()?;
        let pages = Paginator::resume(self.client, request)
            .into_stream()
            .map(|output| output.map(BatchWritePage::from));
        Ok(pages)
    }

    /// Execute every round and return the capacity consumed by the batch.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_odm.batch_write_item", skip_all, err)
    )]
    pub async fn execute(&self) -> Result<Option<types::ConsumedCapacity>> {
        let consumed_capacity = self
            .pages()?
            .map_ok(|page| page.consumed_capacity)
            .try_concat()
            .await?;
        Ok(read::common::aggregate_capacity(consumed_capacity))
    }
}
