use crate::{
    client::Client,
    common::{
        self,
        clause::Clauses,
        condition::Conditional,
        expression::{ClauseKind, Operand, Operator},
    },
    error::{Error, Result},
    model::Model,
    write,
};

use aws_sdk_dynamodb::{operation::put_item::PutItemInput, types};

/// Put item operation.
///
/// The model is validated and stamped before it is written; the previous item, if
/// any, is returned.
///
/// ```rust,no_run
/// # use dynamodb_odm::{Client, Model, common::condition::Conditional};
/// # async fn example<M: Model, C: Client>(client: &C, item: M) -> dynamodb_odm::Result<()> {
/// let previous: Option<M> = M::put(client, item)
///     .overwrite(false)
///     .condition("status").ne("locked")
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Put<'c, M, C: ?Sized> {
    client: &'c C,
    clauses: Clauses,
    item: M,
    overwrite: bool,
    write_args: write::common::WriteArgs,
}

impl<'c, M: Model, C: Client + ?Sized> Put<'c, M, C> {
    pub(crate) fn new(client: &'c C, item: M) -> Self {
        Self {
            client,
            clauses: Clauses::default(),
            item,
            overwrite: true,
            write_args: write::common::WriteArgs::default(),
        }
    }

    write::common::write_args_methods!();

    /// Whether an existing item with the same key may be replaced.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Serialize the accumulated state into a request.
    pub fn to_request(&self) -> Result<PutItemInput> {
        self.clauses.check()?;
        self.item.validate().map_err(Error::Validation)?;
        let schema = M::schema();
        let mut item = common::to_raw_item(&self.item)?;
        schema.key.extract(&item)?;
        if let Some(timestamps) = &schema.timestamps {
            write::common::stamp(&mut item, timestamps, &self.write_args.timestamp());
        }
        let mut clauses = self.clauses.clone();
        let guard = if self.overwrite {
            None
        } else {
            clauses.compile_name(
                ClauseKind::Condition,
                &schema.key.partition_key,
                Operator::NotExists,
                Ok(Operand::None),
            )
        };
        clauses.check()?;
        let condition = match (guard, clauses.condition(ClauseKind::Condition)) {
            (Some(guard), Some(condition)) => Some(format!("{guard} AND ({condition})")),
            (guard, condition) => guard.or(condition),
        };
        let input = PutItemInput::builder()
            .table_name(self.write_args.table_name::<M>())
            .set_item(Some(item))
            .set_condition_expression(condition)
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

    /// Execute the put item operation; returns the replaced item, if any.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_odm.put_item", skip_all, err)
    )]
    pub async fn execute(&self) -> Result<Option<M>> {
        let input = self.to_request()?;
        let output = self.client.put(input).await?;
        write::common::returned(output.attributes)
    }
}

impl<M, C: ?Sized> Conditional for Put<'_, M, C> {
    fn clauses(&mut self) -> &mut Clauses {
        &mut self.clauses
    }

    fn condition_kind(&self) -> ClauseKind {
        ClauseKind::Condition
    }
}
