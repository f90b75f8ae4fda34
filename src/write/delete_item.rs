use crate::{
    client::Client,
    common::{self, clause::Clauses, condition::Conditional, expression::ClauseKind},
    error::{InputError, Result},
    model::Model,
    write,
};

use aws_sdk_dynamodb::{operation::delete_item::DeleteItemInput, types};
use serde::Serialize;
use std::marker;

/// Delete item operation.
///
/// ```rust,no_run
/// # use dynamodb_odm::{Client, Model, common::condition::Conditional};
/// # async fn example<M: Model, C: Client>(client: &C) -> dynamodb_odm::Result<()> {
/// let deleted: Option<M> = M::delete(client, serde_json::json!({"id": "1"}))
///     .condition("status").eq("archived")
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Delete<'c, M, C: ?Sized> {
    client: &'c C,
    clauses: Clauses,
    key: Result<common::Item, InputError>,
    write_args: write::common::WriteArgs,
    model: marker::PhantomData<fn() -> M>,
}

impl<'c, M: Model, C: Client + ?Sized> Delete<'c, M, C> {
    pub(crate) fn new(client: &'c C, key: impl Serialize) -> Self {
        Self {
            client,
            clauses: Clauses::default(),
            key: common::to_raw_item(key),
            write_args: write::common::WriteArgs::default(),
            model: marker::PhantomData,
        }
    }

    write::common::write_args_methods!();

    /// Serialize the accumulated state into a request.
    pub fn to_request(&self) -> Result<DeleteItemInput> {
        let clauses = &self.clauses;
        clauses.check()?;
        let key = self.key.as_ref().map_err(Clone::clone)?;
        let key = M::schema().key.extract(key)?;
        let input = DeleteItemInput::builder()
            .table_name(self.write_args.table_name::<M>())
            .set_key(Some(key))
            .set_condition_expression(clauses.condition(ClauseKind::Condition))
            .set_expression_attribute_names(clauses.names())
            .set_expression_attribute_values(clauses.values())
            .return_values(types::ReturnValue::AllOld)
            .return_consumed_capacity(self.write_args.return_consumed_capacity.clone())
            .return_item_collection_metrics(
                self.write_args.return_item_collection_metrics.clone(),
            )
            .build()?;
        Ok(input)
    }

    /// Execute the delete item operation; returns the deleted item, if any.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_odm.delete_item", skip_all, err)
    )]
    pub async fn execute(&self) -> Result<Option<M>> {
        let input = self.to_request()?;
        let output = self.client.delete(input).await?;
        write::common::returned(output.attributes)
    }
}

impl<M, C: ?Sized> Conditional for Delete<'_, M, C> {
    fn clauses(&mut self) -> &mut Clauses {
        &mut self.clauses
    }

    fn condition_kind(&self) -> ClauseKind {
        ClauseKind::Condition
    }
}
