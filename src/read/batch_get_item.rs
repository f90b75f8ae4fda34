use crate::{
    client::Client,
    common,
    error::{InputError, Result},
    model::Model,
    pagination::{BatchGetRequest, Paginator},
    read,
};

use aws_sdk_dynamodb::{
    operation::batch_get_item::{BatchGetItemInput, BatchGetItemOutput},
    types,
};
use futures::{Stream, StreamExt, TryStreamExt};
use serde::{Serialize, de::DeserializeOwned};
use std::{collections, marker};

/// Most keys DynamoDB accepts in one BatchGetItem request.
pub const MAX_KEYS_PER_REQUEST: usize = 100;

/// One BatchGetItem round.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchGetPage<M> {
    /// Items returned by the round.
    pub items: Vec<M>,
    /// Capacity consumed by the round.
    pub consumed_capacity: Vec<types::ConsumedCapacity>,
    /// Number of keys left unprocessed, sent again in the next round.
    pub unprocessed: usize,
}

impl<M: DeserializeOwned> BatchGetPage<M> {
    fn from_output(output: BatchGetItemOutput, table_name: &str) -> Result<Self> {
        let items = output
            .responses
            .and_then(|mut responses| responses.remove(table_name));
        let unprocessed = output
            .unprocessed_keys
            .iter()
            .flat_map(|unprocessed| unprocessed.values())
            .map(|keys| keys.keys.len())
            .sum();
        Ok(Self {
            items: read::common::from_items(items)?,
            consumed_capacity: output.consumed_capacity.unwrap_or_default(),
            unprocessed,
        })
    }
}

/// Batch get item operation.
///
/// Keys are sent in chunks of [`MAX_KEYS_PER_REQUEST`]; unprocessed keys are sent
/// again until the service reports none.
///
/// ```rust,no_run
/// # use dynamodb_odm::{Client, Model};
/// # async fn example<M: Model, C: Client>(client: &C) -> dynamodb_odm::Result<()> {
/// let keys = (1..=250).map(|id| serde_json::json!({"id": id.to_string()}));
/// let items: Vec<M> = M::batch_get(client, keys).select(["id", "name"]).execute().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BatchGet<'c, M, C: ?Sized> {
    client: &'c C,
    keys: Vec<Result<common::Item, InputError>>,
    read_args: read::common::ReadArgs,
    model: marker::PhantomData<fn() -> M>,
}

impl<'c, M: Model, C: Client + ?Sized> BatchGet<'c, M, C> {
    pub(crate) fn new<K: Serialize>(client: &'c C, keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            client,
            keys: keys.into_iter().map(common::to_raw_item).collect(),
            read_args: read::common::ReadArgs::default(),
            model: marker::PhantomData,
        }
    }

    read::common::read_args_methods!();

    /// Serialize the keys into the first round plus the queued chunks.
    ///
    /// `None` when there is no key to get.
    pub fn to_request(&self) -> Result<Option<BatchGetRequest>> {
        let clauses = &self.read_args.clauses;
        clauses.check()?;
        let schema = M::schema();
        let table_name = self.read_args.table_name::<M>();
        let mut chunks = collections::VecDeque::new();
        for chunk in self.keys.chunks(MAX_KEYS_PER_REQUEST) {
            let mut keys = Vec::with_capacity(chunk.len());
            for key in chunk {
                let key = key.as_ref().map_err(Clone::clone)?;
                keys.push(schema.key.extract(key)?);
            }
            let keys_and_attributes = types::KeysAndAttributes::builder()
                .set_keys(Some(keys))
                .set_consistent_read(self.read_args.consistent_read)
                .set_projection_expression(clauses.projection())
                .set_expression_attribute_names(clauses.names())
                .build()?;
            chunks.push_back(collections::HashMap::from([(
                table_name.clone(),
                keys_and_attributes,
            )]));
        }
        let Some(request_items) = chunks.pop_front() else {
            return Ok(None);
        };
        let input = BatchGetItemInput::builder()
            .set_request_items(Some(request_items))
            .return_consumed_capacity(self.read_args.return_consumed_capacity.clone())
            .build()?;
        Ok(Some(BatchGetRequest {
            input,
            pending: chunks,
        }))
    }

    /// Lazy stream of rounds; an empty key list yields no round.
    pub fn pages(
        &self,
    ) -> Result<impl Stream<Item = Result<BatchGetPage<M>>> + use<'c, M, C>> {
        let request = self.to_request()?;
        let table_name = self.read_args.table_name::<M>();
        let pages = Paginator::resume(self.client, request)
            .into_stream()
            .map(move |output| {
                output.and_then(|output| BatchGetPage::from_output(output, &table_name))
            });
        Ok(pages)
    }

    /// Execute every round and return the items found, in no particular order.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_odm.batch_get_item", skip_all, err)
    )]
    pub async fn execute(&self) -> Result<Vec<M>> {
        self.pages()?
            .map_ok(|page| page.items)
            .try_concat()
            .await
    }
}
