use crate::{
    client::Client,
    common::{
        self,
        clause::Clauses,
        condition::Conditional,
        expression::{ClauseKind, Operand, Operator},
    },
    error::{Error, InputError, Result},
    model::Model,
    write,
};

use aws_sdk_dynamodb::{operation::update_item::UpdateItemInput, types};
use serde::Serialize;
use std::marker;

/// Sections of an update expression, at least one of which must be populated.
const MUTATIONS: [ClauseKind; 4] = [
    ClauseKind::Set,
    ClauseKind::Remove,
    ClauseKind::Add,
    ClauseKind::Delete,
];

/// Update item operation.
///
/// Every call appends to its section of the update expression; the same path may
/// be used several times and gets distinct placeholders.
///
/// ```rust,no_run
/// # use dynamodb_odm::{Client, Model, common::condition::Conditional};
/// # async fn example<M: Model, C: Client>(client: &C) -> dynamodb_odm::Result<()> {
/// let updated: Option<M> = M::update(client, serde_json::json!({"id": "1"}))
///     .set("name").to("John")
///     .set("visits").plus(1)
///     .set("tags").append(["new"])
///     .remove(["nickname"])
///     .add("badges", serde_json::json!(["gold"]))
///     .condition("status").ne("banned")
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Update<'c, M, C: ?Sized> {
    client: &'c C,
    clauses: Clauses,
    key: Result<common::Item, InputError>,
    write_args: write::common::WriteArgs,
    model: marker::PhantomData<fn() -> M>,
}

impl<'c, M: Model, C: Client + ?Sized> Update<'c, M, C> {
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

    fn push(
        mut self,
        kind: ClauseKind,
        path: &str,
        operator: Operator,
        operand: Result<Operand, InputError>,
    ) -> Self {
        self.clauses.push(kind, path, operator, operand);
        self
    }

    /// Start a SET action on the attribute at `path`.
    pub fn set(self, path: impl Into<String>) -> Set<'c, M, C> {
        Set {
            update: self,
            path: path.into(),
        }
    }

    /// Remove the attributes at `paths`.
    pub fn remove<P: Into<String>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
        for path in paths {
            self = self.push(ClauseKind::Remove, &path.into(), Operator::Path, Ok(Operand::None));
        }
        self
    }

    /// Add `value` to the number or set at `path`.
    pub fn add(self, path: impl Into<String>, value: impl Serialize) -> Self {
        self.push(ClauseKind::Add, &path.into(), Operator::Add, common::to_operand(value))
    }

    /// Delete the elements of `value` from the set at `path`.
    pub fn delete(self, path: impl Into<String>, value: impl Serialize) -> Self {
        let operand = common::to_operand(value);
        self.push(ClauseKind::Delete, &path.into(), Operator::Delete, operand)
    }

    /// Serialize the accumulated state into a request.
    ///
    /// Fails with [`Error::EmptyExpression`] when nothing is set, removed, added or
    /// deleted. Timestamp attributes are only stamped when no action already
    /// addresses them.
    pub fn to_request(&self) -> Result<UpdateItemInput> {
        self.clauses.check()?;
        let key = self.key.as_ref().map_err(Clone::clone)?;
        let schema = M::schema();
        let key = schema.key.extract(key)?;
        let mut clauses = self.clauses.clone();
        if MUTATIONS.iter().all(|kind| clauses.is_empty(*kind)) {
            return Err(Error::EmptyExpression);
        }
        if let Some(timestamps) = &schema.timestamps {
            let now = self.write_args.timestamp();
            let stamps = [
                (&timestamps.created_at, Operator::IfNotExists),
                (&timestamps.updated_at, Operator::Assign),
            ];
            for (name, operator) in stamps {
                if !self.clauses.touches(&MUTATIONS, name) {
                    clauses.push_name(ClauseKind::Set, name, operator, common::to_operand(&now));
                }
            }
        }
        clauses.check()?;
        let input = UpdateItemInput::builder()
            .table_name(self.write_args.table_name::<M>())
            .set_key(Some(key))
            .set_update_expression(clauses.update())
            .set_condition_expression(clauses.condition(ClauseKind::Condition))
            .set_expression_attribute_names(clauses.names())
            .set_expression_attribute_values(clauses.values())
            .return_values(types::ReturnValue::AllNew)
            .return_consumed_capacity(self.write_args.return_consumed_capacity.clone())
            .return_item_collection_metrics(
                self.write_args.return_item_collection_metrics.clone(),
            )
            .build()?;
        Ok(input)
    }

    /// Execute the update item operation; returns the item as updated.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_odm.update_item", skip_all, err)
    )]
    pub async fn execute(&self) -> Result<Option<M>> {
        let input = self.to_request()?;
        let output = self.client.update(input).await?;
        write::common::returned(output.attributes)
    }
}

impl<M, C: ?Sized> Conditional for Update<'_, M, C> {
    fn clauses(&mut self) -> &mut Clauses {
        &mut self.clauses
    }

    fn condition_kind(&self) -> ClauseKind {
        ClauseKind::Condition
    }
}

/// SET action on one attribute; every operator returns the update.
#[derive(Debug)]
pub struct Set<'c, M, C: ?Sized> {
    update: Update<'c, M, C>,
    path: String,
}

impl<'c, M: Model, C: Client + ?Sized> Set<'c, M, C> {
    fn apply(
        self,
        operator: Operator,
        operand: Result<Operand, InputError>,
    ) -> Update<'c, M, C> {
        self.update.push(ClauseKind::Set, &self.path, operator, operand)
    }

    /// `path = value`; an empty string is stored as NULL.
    pub fn to(self, value: impl Serialize) -> Update<'c, M, C> {
        self.apply(Operator::Assign, common::to_operand(value))
    }

    /// `path = path + value`
    pub fn plus(self, value: impl Serialize) -> Update<'c, M, C> {
        self.apply(Operator::Increment, common::to_operand(value))
    }

    /// `path = path - value`
    pub fn minus(self, value: impl Serialize) -> Update<'c, M, C> {
        self.apply(Operator::Decrement, common::to_operand(value))
    }

    /// `path = list_append(path, values)`
    pub fn append(self, values: impl Serialize) -> Update<'c, M, C> {
        self.apply(Operator::Append, common::to_operand(values))
    }

    /// `path = list_append(values, path)`
    pub fn prepend(self, values: impl Serialize) -> Update<'c, M, C> {
        self.apply(Operator::Prepend, common::to_operand(values))
    }

    /// `path = if_not_exists(path, value)`
    pub fn if_not_exists(self, value: impl Serialize) -> Update<'c, M, C> {
        self.apply(Operator::IfNotExists, common::to_operand(value))
    }
}
