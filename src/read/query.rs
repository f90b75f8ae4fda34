use crate::{
    client::Client,
    common::{
        self,
        clause::Clauses,
        condition::{Conditional, Where},
        expression::{ClauseKind, Comparator, Operand, Operator},
    },
    error::{Error, Result},
    model::Model,
    pagination::Paginator,
    read,
};

use aws_sdk_dynamodb::{operation::query::QueryInput, types};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::marker;

/// Query operation.
///
/// ```rust,no_run
/// # use dynamodb_odm::{Client, Model};
/// # async fn example<M: Model, C: Client>(client: &C) -> dynamodb_odm::Result<()> {
/// let events = M::query(client, "user-1")
///     .sort_key().begins_with("2024-")
///     .filter("kind").is_in(["login", "logout"])
///     .descending()
///     .limit(50)
///     .execute()
///     .await?;
/// println!("{} events", events.count);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Query<'c, M, C: ?Sized> {
    client: &'c C,
    count: bool,
    descending: bool,
    exclusive_start_key: Option<common::Item>,
    index_name: Option<String>,
    limit: Option<i32>,
    partition: Option<types::AttributeValue>,
    read_args: read::common::ReadArgs,
    sort_key: Option<(Operator, Operand)>,
    model: marker::PhantomData<fn() -> M>,
}

impl<'c, M: Model, C: Client + ?Sized> Query<'c, M, C> {
    pub(crate) fn new(client: &'c C, partition: impl Serialize) -> Self {
        let mut read_args = read::common::ReadArgs::default();
        let partition = match common::to_operand(partition) {
            Ok(Operand::One(value)) => Some(value),
            Ok(_) => None,
            Err(error) => {
                read_args.clauses.fail(error);
                None
            }
        };
        Self {
            client,
            count: false,
            descending: false,
            exclusive_start_key: None,
            index_name: None,
            limit: None,
            partition,
            read_args,
            sort_key: None,
            model: marker::PhantomData,
        }
    }

    read::common::read_args_methods!();

    /// Start a condition on the sort key of the table or index.
    pub fn sort_key(self) -> SortKey<'c, M, C> {
        SortKey { query: self }
    }

    /// Start a filter on the attribute at `path`.
    pub fn filter(self, path: impl Into<String>) -> Where<Self> {
        self.condition(path)
    }

    /// Query the secondary index `index_name`.
    pub fn index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Evaluate at most `limit` items per page.
    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Return items in descending sort key order.
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Only count the matching items; cannot be combined with `select`.
    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Resume after `last_evaluated_key` of a previous page.
    pub fn start_key(mut self, last_evaluated_key: common::Item) -> Self {
        self.exclusive_start_key = Some(last_evaluated_key);
        self
    }

    /// Serialize the accumulated state into the request of the first page.
    pub fn to_request(&self) -> Result<QueryInput> {
        self.read_args.clauses.check()?;
        let schema = M::schema();
        let keys = schema.key_schema(self.index_name.as_deref())?;
        let mut clauses = self.read_args.clauses.clone();
        if let Some(partition) = &self.partition {
            clauses.push_name(
                ClauseKind::KeyCondition,
                &keys.partition_key,
                Operator::Compare(Comparator::Eq),
                Ok(Operand::One(partition.clone())),
            );
        }
        if let Some((operator, operand)) = &self.sort_key {
            let sort_key = keys.sort_key.as_deref().ok_or_else(|| {
                Error::Schema(format!(
                    "no sort key on `{}`",
                    self.index_name.as_deref().unwrap_or(&schema.table_name)
                ))
            })?;
            clauses.push_name(
                ClauseKind::KeyCondition,
                sort_key,
                operator.clone(),
                Ok(operand.clone()),
            );
        }
        clauses.check()?;
        if self.count && !clauses.is_empty(ClauseKind::Projection) {
            return Err(Error::Conflict("`count` cannot be combined with `select`"));
        }
        let input = QueryInput::builder()
            .table_name(self.read_args.table_name::<M>())
            .set_index_name(self.index_name.clone())
            .set_key_condition_expression(clauses.key_condition())
            .set_filter_expression(clauses.condition(ClauseKind::Filter))
            .set_projection_expression(clauses.projection())
            .set_expression_attribute_names(clauses.names())
            .set_expression_attribute_values(clauses.values())
            .set_consistent_read(self.read_args.consistent_read)
            .set_exclusive_start_key(self.exclusive_start_key.clone())
            .set_limit(self.limit)
            .set_scan_index_forward(self.descending.then_some(false))
            .set_select(self.count.then_some(types::Select::Count))
            .return_consumed_capacity(self.read_args.return_consumed_capacity.clone())
            .build()?;
        Ok(input)
    }

    /// Lazy stream of pages; a page is only requested when the stream is polled.
    pub fn pages(
        &self,
    ) -> Result<impl Stream<Item = Result<read::common::Page<M>>> + use<'c, M, C>> {
        let input = self.to_request()?;
        let pages = Paginator::new(self.client, input)
            .into_stream()
            .map(|output| output.and_then(read::common::Page::try_from));
        Ok(pages)
    }

    /// Execute the query, following every page.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_odm.query", skip_all, err)
    )]
    pub async fn execute(&self) -> Result<read::common::Items<M>> {
        read::common::collect(self.pages()?).await
    }
}

impl<M, C: ?Sized> Conditional for Query<'_, M, C> {
    fn clauses(&mut self) -> &mut Clauses {
        &mut self.read_args.clauses
    }

    fn condition_kind(&self) -> ClauseKind {
        ClauseKind::Filter
    }
}

/// Key condition on the sort key; every operator returns the query.
#[derive(Debug)]
pub struct SortKey<'c, M, C: ?Sized> {
    query: Query<'c, M, C>,
}

impl<'c, M: Model, C: Client + ?Sized> SortKey<'c, M, C> {
    fn apply(
        mut self,
        operator: Operator,
        operand: Result<Operand, crate::error::InputError>,
    ) -> Query<'c, M, C> {
        match operand {
            Ok(operand) => self.query.sort_key = Some((operator, operand)),
            Err(error) => self.query.read_args.clauses.fail(error),
        }
        self.query
    }

    /// `sort_key = value`
    pub fn eq(self, value: impl Serialize) -> Query<'c, M, C> {
        self.apply(Operator::Compare(Comparator::Eq), common::to_operand(value))
    }

    /// `sort_key < value`
    pub fn lt(self, value: impl Serialize) -> Query<'c, M, C> {
        self.apply(Operator::Compare(Comparator::Lt), common::to_operand(value))
    }

    /// `sort_key <= value`
    pub fn lte(self, value: impl Serialize) -> Query<'c, M, C> {
        self.apply(Operator::Compare(Comparator::Lte), common::to_operand(value))
    }

    /// `sort_key > value`
    pub fn gt(self, value: impl Serialize) -> Query<'c, M, C> {
        self.apply(Operator::Compare(Comparator::Gt), common::to_operand(value))
    }

    /// `sort_key >= value`
    pub fn gte(self, value: impl Serialize) -> Query<'c, M, C> {
        self.apply(Operator::Compare(Comparator::Gte), common::to_operand(value))
    }

    /// `sort_key BETWEEN low AND high`
    pub fn between(self, low: impl Serialize, high: impl Serialize) -> Query<'c, M, C> {
        self.apply(Operator::Between, common::to_operand_pair(low, high))
    }

    /// `begins_with(sort_key, prefix)`
    pub fn begins_with(self, prefix: impl Serialize) -> Query<'c, M, C> {
        self.apply(Operator::BeginsWith, common::to_operand(prefix))
    }
}
