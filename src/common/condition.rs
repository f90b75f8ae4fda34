use crate::{
    common::{
        self,
        clause::Clauses,
        expression::{AttributeType, ClauseKind, Comparator, Operand, Operator},
    },
    error::InputError,
};

use serde::Serialize;
use std::ops;

/// Logical operator for combining conditions.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogicalOperator {
    /// Logical AND - all conditions must be true.
    #[default]
    And,
    /// Logical OR - at least one condition must be true.
    Or,
}

impl ops::Deref for LogicalOperator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Builders accepting condition (or filter) clauses.
///
/// ```rust
/// use dynamodb_odm::common::condition::{Conditional, LogicalOperator};
/// # use dynamodb_odm::{Client, Model, write::update_item::Update};
/// # fn example<M: Model, C: Client>(update: Update<'_, M, C>) -> Update<'_, M, C> {
/// update
///     .condition("status").eq("active")
///     .or(|group| group.condition("retries").lt(3).condition("forced").eq(true))
///     .logic(LogicalOperator::And)
/// # }
/// ```
pub trait Conditional: Sized {
    #[doc(hidden)]
    fn clauses(&mut self) -> &mut Clauses;

    #[doc(hidden)]
    fn condition_kind(&self) -> ClauseKind;

    #[doc(hidden)]
    fn record(&mut self, fragment: String) {
        let kind = self.condition_kind();
        self.clauses().insert(kind, fragment);
    }

    #[doc(hidden)]
    fn set_logic(&mut self, logic: LogicalOperator) {
        self.clauses().logic = logic;
    }

    #[doc(hidden)]
    fn push_condition(
        &mut self,
        path: &str,
        operator: Operator,
        operand: Result<Operand, InputError>,
    ) {
        let kind = self.condition_kind();
        if let Some(fragment) = self.clauses().compile(kind, path, operator, operand) {
            self.record(fragment);
        }
    }

    /// Start a condition on the attribute at `path`.
    fn condition(self, path: impl Into<String>) -> Where<Self> {
        Where::new(self, path.into())
    }

    /// Set the connective joining the conditions of this builder.
    fn logic(mut self, logic: LogicalOperator) -> Self {
        self.set_logic(logic);
        self
    }

    /// Add a parenthesized group whose conditions are joined with `AND`.
    fn and<F>(self, build: F) -> Self
    where
        F: for<'g> FnOnce(Group<'g>) -> Group<'g>,
    {
        self.group(LogicalOperator::And, build)
    }

    /// Add a parenthesized group whose conditions are joined with `OR`.
    fn or<F>(self, build: F) -> Self
    where
        F: for<'g> FnOnce(Group<'g>) -> Group<'g>,
    {
        self.group(LogicalOperator::Or, build)
    }

    /// Add a parenthesized group joined with `logic`.
    fn group<F>(mut self, logic: LogicalOperator, build: F) -> Self
    where
        F: for<'g> FnOnce(Group<'g>) -> Group<'g>,
    {
        let kind = self.condition_kind();
        let fragment = build(Group::new(self.clauses(), kind, logic)).finish();
        if let Some(fragment) = fragment {
            self.record(fragment);
        }
        self
    }
}

/// Nested condition group sharing the placeholders of its parent.
#[derive(Debug)]
pub struct Group<'g> {
    clauses: &'g mut Clauses,
    fragments: Vec<String>,
    kind: ClauseKind,
    logic: LogicalOperator,
}

impl<'g> Group<'g> {
    fn new(clauses: &'g mut Clauses, kind: ClauseKind, logic: LogicalOperator) -> Self {
        Self {
            clauses,
            fragments: Vec::new(),
            kind,
            logic,
        }
    }

    fn finish(self) -> Option<String> {
        match self.fragments.len() {
            0 => None,
            1 => self.fragments.into_iter().next(),
            _ => Some(format!("({})", self.fragments.join(&*self.logic))),
        }
    }
}

impl Conditional for Group<'_> {
    fn clauses(&mut self) -> &mut Clauses {
        &mut *self.clauses
    }

    fn condition_kind(&self) -> ClauseKind {
        self.kind
    }

    fn record(&mut self, fragment: String) {
        if !self.fragments.contains(&fragment) {
            self.fragments.push(fragment);
        }
    }

    fn set_logic(&mut self, logic: LogicalOperator) {
        self.logic = logic;
    }
}

/// Operator suite for one attribute path; every operator returns the parent builder.
#[derive(Debug)]
pub struct Where<B> {
    builder: B,
    negated: bool,
    path: String,
}

impl<B: Conditional> Where<B> {
    fn new(builder: B, path: String) -> Self {
        Self {
            builder,
            negated: false,
            path,
        }
    }

    fn apply(mut self, operator: Operator, operand: Result<Operand, InputError>) -> B {
        let operator = if self.negated {
            Operator::Not(Box::new(operator))
        } else {
            operator
        };
        self.builder.push_condition(&self.path, operator, operand);
        self.builder
    }

    /// Negate the next operator.
    #[allow(clippy::should_implement_trait)]
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// `path = value`
    pub fn eq(self, value: impl Serialize) -> B {
        self.apply(Operator::Compare(Comparator::Eq), common::to_operand(value))
    }

    /// `path <> value`
    pub fn ne(self, value: impl Serialize) -> B {
        self.apply(Operator::Compare(Comparator::Ne), common::to_operand(value))
    }

    /// `path < value`
    pub fn lt(self, value: impl Serialize) -> B {
        self.apply(Operator::Compare(Comparator::Lt), common::to_operand(value))
    }

    /// `path <= value`
    pub fn lte(self, value: impl Serialize) -> B {
        self.apply(Operator::Compare(Comparator::Lte), common::to_operand(value))
    }

    /// `path > value`
    pub fn gt(self, value: impl Serialize) -> B {
        self.apply(Operator::Compare(Comparator::Gt), common::to_operand(value))
    }

    /// `path >= value`
    pub fn gte(self, value: impl Serialize) -> B {
        self.apply(Operator::Compare(Comparator::Gte), common::to_operand(value))
    }

    /// `path BETWEEN low AND high` (inclusive).
    pub fn between(self, low: impl Serialize, high: impl Serialize) -> B {
        self.apply(Operator::Between, common::to_operand_pair(low, high))
    }

    /// `begins_with(path, prefix)`
    pub fn begins_with(self, prefix: impl Serialize) -> B {
        self.apply(Operator::BeginsWith, common::to_operand(prefix))
    }

    /// `contains(path, value)`
    pub fn contains(self, value: impl Serialize) -> B {
        self.apply(Operator::Contains, common::to_operand(value))
    }

    /// `path IN (values)`
    pub fn is_in<T: Serialize>(self, values: impl IntoIterator<Item = T>) -> B {
        self.apply(Operator::In, common::to_operand_list(values))
    }

    /// `attribute_exists(path)`
    pub fn exists(self) -> B {
        self.apply(Operator::Exists, Ok(Operand::None))
    }

    /// `attribute_not_exists(path)`
    pub fn not_exists(self) -> B {
        self.apply(Operator::NotExists, Ok(Operand::None))
    }

    /// `attribute_type(path, type)`
    pub fn attribute_type(self, attribute_type: AttributeType) -> B {
        self.apply(Operator::Type, common::to_operand(attribute_type.code()))
    }

    /// Compare the size of the attribute instead of its value.
    pub fn size(self) -> Size<B> {
        Size { condition: self }
    }
}

/// Comparisons on `size(path)`.
#[derive(Debug)]
pub struct Size<B> {
    condition: Where<B>,
}

impl<B: Conditional> Size<B> {
    fn apply(self, comparator: Comparator, value: impl Serialize) -> B {
        self.condition
            .apply(Operator::Size(comparator), common::to_operand(value))
    }

    /// `size(path) = value`
    pub fn eq(self, value: impl Serialize) -> B {
        self.apply(Comparator::Eq, value)
    }

    /// `size(path) <> value`
    pub fn ne(self, value: impl Serialize) -> B {
        self.apply(Comparator::Ne, value)
    }

    /// `size(path) < value`
    pub fn lt(self, value: impl Serialize) -> B {
        self.apply(Comparator::Lt, value)
    }

    /// `size(path) <= value`
    pub fn lte(self, value: impl Serialize) -> B {
        self.apply(Comparator::Lte, value)
    }

    /// `size(path) > value`
    pub fn gt(self, value: impl Serialize) -> B {
        self.apply(Comparator::Gt, value)
    }

    /// `size(path) >= value`
    pub fn gte(self, value: impl Serialize) -> B {
        self.apply(Comparator::Gte, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use std::collections;

    #[derive(Debug, Default)]
    struct Conditions {
        clauses: Clauses,
    }

    impl Conditional for Conditions {
        fn clauses(&mut self) -> &mut Clauses {
            &mut self.clauses
        }

        fn condition_kind(&self) -> ClauseKind {
            ClauseKind::Condition
        }
    }

    fn n(value: &str) -> types::AttributeValue {
        types::AttributeValue::N(value.to_string())
    }

    #[rstest]
    #[case::and(
        Conditions::default()
            .condition("a").eq(1)
            .condition("b").gt(2),
        "#condition0_a_0 = :condition0_a AND #condition0_b_0 > :condition0_b"
    )]
    #[case::or(
        Conditions::default()
            .logic(LogicalOperator::Or)
            .condition("a").eq(1)
            .condition("b").gt(2),
        "#condition0_a_0 = :condition0_a OR #condition0_b_0 > :condition0_b"
    )]
    #[case::logic_after_conditions(
        Conditions::default()
            .condition("a").eq(1)
            .condition("b").gt(2)
            .logic(LogicalOperator::Or),
        "#condition0_a_0 = :condition0_a OR #condition0_b_0 > :condition0_b"
    )]
    #[case::nested_group(
        Conditions::default()
            .condition("a").eq(1)
            .or(|group| group.condition("b").lt(2).condition("c").exists()),
        "#condition0_a_0 = :condition0_a AND \
         (#condition0_b_0 < :condition0_b OR attribute_exists(#condition0_c_0))"
    )]
    #[case::deeply_nested_group(
        Conditions::default()
            .or(|group| {
                group
                    .condition("a").eq(1)
                    .and(|inner| inner.condition("a").eq(2).condition("b").eq(3))
            }),
        "(#condition0_a_0 = :condition0_a OR \
         (#condition1_a_0 = :condition1_a AND #condition0_b_0 = :condition0_b))"
    )]
    #[case::single_condition_group(
        Conditions::default().and(|group| group.condition("a").ne(1)),
        "#condition0_a_0 <> :condition0_a"
    )]
    #[case::negation(
        Conditions::default()
            .condition("a").not().exists()
            .condition("b").not().begins_with("x"),
        "attribute_not_exists(#condition0_a_0) AND \
         NOT (begins_with(#condition0_b_0, :condition0_b))"
    )]
    #[case::size(
        Conditions::default().condition("tags").size().gte(1),
        "size(#condition0_tags_0) >= :condition0_tags"
    )]
    fn test_conditions(#[case] conditions: Conditions, #[case] expected: &str) {
        assert!(conditions.clauses.check().is_ok());
        let actual = conditions.clauses.condition(ClauseKind::Condition).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_a_eq_1_and_b_gt_2_round_trip() {
        let conditions = Conditions::default()
            .condition("A").eq(1)
            .condition("B").gt(2);
        let expression = conditions.clauses.condition(ClauseKind::Condition).unwrap();
        let names = conditions.clauses.names().unwrap();
        let values = conditions.clauses.values().unwrap();
        assert_eq!(
            names,
            collections::HashMap::from(
                [
                    ("#condition0_A_0".to_string(), "A".to_string()),
                    ("#condition0_B_0".to_string(), "B".to_string()),
                ]
            )
        );
        assert_eq!(
            values,
            collections::HashMap::from(
                [
                    (":condition0_A".to_string(), n("1")),
                    (":condition0_B".to_string(), n("2")),
                ]
            )
        );
        assert_eq!(expression.split(" AND ").count(), 2);
        for placeholder in names.keys().chain(values.keys()) {
            assert!(expression.contains(placeholder.as_str()));
        }
    }

    #[test]
    fn test_empty_group_adds_nothing() {
        let conditions = Conditions::default().or(|group| group);
        assert!(conditions.clauses.condition(ClauseKind::Condition).is_none());
        assert!(conditions.clauses.names().is_none());
    }

    #[test]
    fn test_empty_in_is_rejected() {
        let conditions = Conditions::default()
            .condition("a")
            .is_in(Vec::<String>::new());
        assert!(matches!(
            conditions.clauses.check(),
            Err(InputError::InvalidOperand { .. })
        ));
    }
}
