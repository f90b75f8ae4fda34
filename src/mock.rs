//! Scripted client and sample models shared by the unit tests.

use crate::{
    client::Client,
    common::key::KeySchema,
    model::{Model, Schema, Timestamps},
};

use aws_sdk_dynamodb::{
    Error,
    operation::{
        batch_get_item::{BatchGetItemInput, BatchGetItemOutput},
        batch_write_item::{BatchWriteItemInput, BatchWriteItemOutput},
        delete_item::{DeleteItemInput, DeleteItemOutput},
        get_item::{GetItemInput, GetItemOutput},
        put_item::{PutItemInput, PutItemOutput},
        query::{QueryInput, QueryOutput},
        scan::{ScanInput, ScanOutput},
        update_item::{UpdateItemInput, UpdateItemOutput},
    },
    types,
};
use serde::{Deserialize, Serialize};
use std::{collections, sync};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Request {
    Put(PutItemInput),
    Get(GetItemInput),
    Query(QueryInput),
    Scan(ScanInput),
    Update(UpdateItemInput),
    Delete(DeleteItemInput),
    BatchGet(BatchGetItemInput),
    BatchWrite(BatchWriteItemInput),
}

#[derive(Debug)]
pub(crate) enum Response {
    Put(PutItemOutput),
    Get(GetItemOutput),
    Query(QueryOutput),
    Scan(ScanOutput),
    Update(UpdateItemOutput),
    Delete(DeleteItemOutput),
    BatchGet(BatchGetItemOutput),
    BatchWrite(BatchWriteItemOutput),
    Error(Error),
}

impl Response {
    pub(crate) fn not_found() -> Self {
        let exception = types::error::ResourceNotFoundException::builder()
            .message("table not found")
            .build();
        Self::Error(Error::ResourceNotFoundException(exception))
    }
}

/// Records every request and answers with the scripted responses in order.
#[derive(Debug, Default)]
pub(crate) struct MockClient {
    requests: sync::Mutex<Vec<Request>>,
    responses: sync::Mutex<collections::VecDeque<Response>>,
}

impl MockClient {
    pub(crate) fn new(responses: impl IntoIterator<Item = Response>) -> Self {
        Self {
            requests: sync::Mutex::default(),
            responses: sync::Mutex::new(responses.into_iter().collect()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

macro_rules! respond {
    ($client:expr, $variant:ident, $input:expr) => {{
        $client.requests.lock().unwrap().push(Request::$variant($input));
        match $client.responses.lock().unwrap().pop_front() {
            Some(Response::$variant(output)) => Ok(output),
            Some(Response::Error(error)) => Err(error),
            Some(response) => panic!("unexpected response {response:?}"),
            None => panic!("no response scripted for {}", stringify!($variant)),
        }
    }};
}

#[async_trait::async_trait]
impl Client for MockClient {
    async fn put(&self, input: PutItemInput) -> Result<PutItemOutput, Error> {
        respond!(self, Put, input)
    }

    async fn get(&self, input: GetItemInput) -> Result<GetItemOutput, Error> {
        respond!(self, Get, input)
    }

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, Error> {
        respond!(self, Query, input)
    }

    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, Error> {
        respond!(self, Scan, input)
    }

    async fn update(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, Error> {
        respond!(self, Update, input)
    }

    async fn delete(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, Error> {
        respond!(self, Delete, input)
    }

    async fn batch_get(&self, input: BatchGetItemInput) -> Result<BatchGetItemOutput, Error> {
        respond!(self, BatchGet, input)
    }

    async fn batch_write(
        &self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, Error> {
        respond!(self, BatchWrite, input)
    }
}

/// Model keyed by `id` only.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) age: Option<u32>,
}

impl User {
    pub(crate) fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            age: None,
        }
    }
}

impl Model for User {
    fn schema() -> &'static Schema {
        static SCHEMA: sync::LazyLock<Schema> = sync::LazyLock::new(|| Schema::new("users", "id"));
        &SCHEMA
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("name must not be empty".to_string());
        }
        Ok(())
    }
}

/// Model with a composite key, an index and timestamps.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub(crate) struct Event {
    pub(crate) user_id: String,
    pub(crate) at: String,
    pub(crate) kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) updated_at: Option<String>,
}

impl Event {
    pub(crate) fn new(user_id: &str, at: &str, kind: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            at: at.to_string(),
            kind: kind.to_string(),
            ..Default::default()
        }
    }
}

impl Model for Event {
    fn schema() -> &'static Schema {
        static SCHEMA: sync::LazyLock<Schema> = sync::LazyLock::new(|| {
            Schema::new("events", "user_id")
                .sort_key("at")
                .index("by_kind", KeySchema::new("kind").sort_key("at"))
                .timestamps(Timestamps::default())
        });
        &SCHEMA
    }
}

/// Model whose key attribute names contain dots.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct Metric {
    #[serde(rename = "metric.name")]
    pub(crate) name: String,
    #[serde(rename = "window.start")]
    pub(crate) start: String,
}

impl Metric {
    pub(crate) fn new(name: &str, start: &str) -> Self {
        Self {
            name: name.to_string(),
            start: start.to_string(),
        }
    }
}

impl Model for Metric {
    fn schema() -> &'static Schema {
        static SCHEMA: sync::LazyLock<Schema> = sync::LazyLock::new(|| {
            Schema::new("metrics", "metric.name").sort_key("window.start")
        });
        &SCHEMA
    }
}

pub(crate) fn s(value: &str) -> types::AttributeValue {
    types::AttributeValue::S(value.to_string())
}

pub(crate) fn n(value: &str) -> types::AttributeValue {
    types::AttributeValue::N(value.to_string())
}

pub(crate) fn item<const N: usize>(
    attributes: [(&str, types::AttributeValue); N],
) -> crate::common::Item {
    attributes
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
