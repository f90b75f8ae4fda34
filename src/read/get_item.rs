use crate::{
    client::Client,
    common::{self, clause::Clauses},
    error::{InputError, Result},
    model::Model,
    read,
};

use aws_sdk_dynamodb::operation::get_item::GetItemInput;
use serde::Serialize;
use serde_dynamo::from_item;
use std::marker;

/// Get item operation.
///
/// ```rust,no_run
/// # use dynamodb_odm::{Client, Model};
/// # async fn example<M: Model, C: Client>(client: &C) -> dynamodb_odm::Result<()> {
/// let item: Option<M> = M::get(client, serde_json::json!({"id": "1"}))
///     .select(["name", "address.city"])
///     .consistent_read(true)
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Get<'c, M, C: ?Sized> {
    client: &'c C,
    key: Result<common::Item, InputError>,
    read_args: read::common::ReadArgs,
    model: marker::PhantomData<fn() -> M>,
}

impl<'c, M: Model, C: Client + ?Sized> Get<'c, M, C> {
    pub(crate) fn new(client: &'c C, key: impl Serialize) -> Self {
        Self {
            client,
            key: common::to_raw_item(key),
            read_args: read::common::ReadArgs::default(),
            model: marker::PhantomData,
        }
    }

    read::common::read_args_methods!();

    fn clauses(&self) -> &Clauses {
        &self.read_args.clauses
    }

    /// Serialize the accumulated state into a request.
    pub fn to_request(&self) -> Result<GetItemInput> {
        self.clauses().check()?;
        let key = self.key.as_ref().map_err(Clone::clone)?;
        let key = M::schema().key.extract(key)?;
        let input = GetItemInput::builder()
            .table_name(self.read_args.table_name::<M>())
            .set_key(Some(key))
            .set_consistent_read(self.read_args.consistent_read)
            .set_projection_expression(self.clauses().projection())
            .set_expression_attribute_names(self.clauses().names())
            .return_consumed_capacity(self.read_args.return_consumed_capacity.clone())
            .build()?;
        Ok(input)
    }

    /// Execute the get item operation; `None` when no item has the key.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_odm.get_item", skip_all, err)
    )]
    pub async fn execute(&self) -> Result<Option<M>> {
        let input = self.to_request()?;
        let output = self.client.get(input).await?;
        let item = output
            .item
            .filter(|item| !item.is_empty())
            .map(from_item)
            .transpose()?;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        config::Config,
        error::Error,
        mock::{Event, MockClient, Request, Response, User, item, s},
    };
    use aws_sdk_dynamodb::{operation::get_item::GetItemOutput, types};
    use rstest::rstest;
    use serde_json::json;
    use std::collections;

    fn consumed_capacity() -> types::ReturnConsumedCapacity {
        Config::global().return_consumed_capacity.clone()
    }

    #[rstest]
    #[case::key_only(
        User::get(&MockClient::default(), json!({"id": "a"})).to_request().unwrap(),
        GetItemInput::builder()
            .table_name("users")
            .set_key(
                Some(
                    item([("id", s("a"))])
                )
            )
            .return_consumed_capacity(consumed_capacity())
            .build()
            .unwrap()
    )]
    #[case::full_model_as_key(
        Event::get(&MockClient::default(), Event::new("a", "b", "c"))
            .table("events_copy")
            .consistent_read(true)
            .select(["kind", "meta.tags[0]"])
            .to_request()
            .unwrap(),
        GetItemInput::builder()
            .table_name("events_copy")
            .set_key(
                Some(
                    item([("user_id", s("a")), ("at", s("b"))])
                )
            )
            .consistent_read(true)
            .projection_expression(
                "#projection0_kind_0, \
                 #projection0_meta_2e_tags_5b_0_5d__0.#projection0_meta_2e_tags_5b_0_5d__1[0]"
            )
            .set_expression_attribute_names(
                Some(
                    collections::HashMap::from(
                        [
                            ("#projection0_kind_0".to_string(), "kind".to_string()),
                            ("#projection0_meta_2e_tags_5b_0_5d__0".to_string(), "meta".to_string()),
                            ("#projection0_meta_2e_tags_5b_0_5d__1".to_string(), "tags".to_string()),
                        ]
                    )
                )
            )
            .return_consumed_capacity(consumed_capacity())
            .build()
            .unwrap()
    )]
    fn test_get(#[case] actual: GetItemInput, #[case] expected: GetItemInput) {
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::missing_key(json!({"name": "a"}))]
    #[case::not_a_map(json!("a"))]
    fn test_get_invalid_key(#[case] key: serde_json::Value) {
        let client = MockClient::default();
        let error = User::get(&client, key).to_request().unwrap_err();
        assert!(matches!(error, Error::MissingKey(_) | Error::Input(_)));
    }

    #[tokio::test]
    async fn test_execute() {
        let client = MockClient::new([
            Response::Get(
                GetItemOutput::builder()
                    .set_item(Some(item([("id", s("a")), ("name", s("b"))])))
                    .build(),
            ),
            Response::Get(GetItemOutput::builder().build()),
            Response::not_found(),
        ]);
        let get = User::get(&client, json!({"id": "a"}));
        assert_eq!(get.execute().await.unwrap(), Some(User::new("a", "b")));
        assert_eq!(get.execute().await.unwrap(), None);
        assert!(matches!(get.execute().await, Err(Error::Client(_))));
        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        assert!(
            requests
                .iter()
                .all(|request| request == &Request::Get(get.to_request().unwrap()))
        );
    }
}
