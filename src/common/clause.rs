use crate::{
    common::{
        condition::LogicalOperator,
        expression::{ClauseKind, Operand, Operation, Operator},
    },
    error::InputError,
};

use aws_sdk_dynamodb::types;
use indexmap::{IndexMap, IndexSet};
use std::collections;

/// Update sections in the order they are serialized.
const UPDATE_SECTIONS: [(ClauseKind, &str); 4] = [
    (ClauseKind::Set, "SET"),
    (ClauseKind::Remove, "REMOVE"),
    (ClauseKind::Add, "ADD"),
    (ClauseKind::Delete, "DELETE"),
];

/// Accumulated expression state of a builder.
///
/// Fragments are kept per clause in insertion order with duplicates collapsed.
/// Placeholder maps only ever hold entries of fragments that were recorded.
#[derive(Clone, Debug, Default)]
pub struct Clauses {
    fragments: IndexMap<ClauseKind, IndexSet<String>>,
    expression_attribute_names: collections::HashMap<String, String>,
    expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
    counters: collections::HashMap<(ClauseKind, String), usize>,
    pub(crate) logic: LogicalOperator,
    error: Option<InputError>,
}

impl Clauses {
    /// Compile a fragment, merging its placeholders, without recording it.
    ///
    /// The first error is kept and reported by [`Clauses::check`].
    pub(crate) fn compile(
        &mut self,
        kind: ClauseKind,
        path: &str,
        operator: Operator,
        operand: Result<Operand, InputError>,
    ) -> Option<String> {
        self.bind(kind, path, operand, |count| {
            Operation::new(kind, path, operator, count)
        })
    }

    /// Like [`Clauses::compile`] for a top-level attribute name taken from the schema.
    pub(crate) fn compile_name(
        &mut self,
        kind: ClauseKind,
        name: &str,
        operator: Operator,
        operand: Result<Operand, InputError>,
    ) -> Option<String> {
        self.bind(kind, name, operand, |count| {
            Operation::name(kind, name, operator, count)
        })
    }

    fn bind<'a>(
        &mut self,
        kind: ClauseKind,
        path: &str,
        operand: Result<Operand, InputError>,
        operation: impl FnOnce(usize) -> Operation<'a>,
    ) -> Option<String> {
        let counter = self.counters.entry((kind, path.to_string())).or_default();
        let count = *counter;
        *counter += 1;
        let compiled = operand.and_then(|operand| operation(count).bind(operand));
        match compiled {
            Ok(input) => {
                self.expression_attribute_names
                    .extend(input.expression_attribute_names);
                self.expression_attribute_values
                    .extend(input.expression_attribute_values);
                Some(input.expression)
            }
            Err(error) => {
                self.fail(error);
                None
            }
        }
    }

    pub(crate) fn insert(&mut self, kind: ClauseKind, fragment: String) {
        self.fragments.entry(kind).or_default().insert(fragment);
    }

    pub(crate) fn push(
        &mut self,
        kind: ClauseKind,
        path: &str,
        operator: Operator,
        operand: Result<Operand, InputError>,
    ) {
        if let Some(fragment) = self.compile(kind, path, operator, operand) {
            self.insert(kind, fragment);
        }
    }

    pub(crate) fn push_name(
        &mut self,
        kind: ClauseKind,
        name: &str,
        operator: Operator,
        operand: Result<Operand, InputError>,
    ) {
        if let Some(fragment) = self.compile_name(kind, name, operator, operand) {
            self.insert(kind, fragment);
        }
    }

    /// Whether any of `kinds` already addresses the attribute `name` or a path inside it.
    pub(crate) fn touches(&self, kinds: &[ClauseKind], name: &str) -> bool {
        self.counters.keys().any(|(kind, path)| {
            kinds.contains(kind)
                && path
                    .strip_prefix(name)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with(['.', '[']))
        })
    }

    pub(crate) fn fail(&mut self, error: InputError) {
        self.error.get_or_insert(error);
    }

    pub(crate) fn check(&self) -> Result<(), InputError> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    pub(crate) fn is_empty(&self, kind: ClauseKind) -> bool {
        self.fragments.get(&kind).is_none_or(IndexSet::is_empty)
    }

    fn join(&self, kind: ClauseKind, separator: &str) -> Option<String> {
        let fragments = self.fragments.get(&kind).filter(|set| !set.is_empty())?;
        let fragments: Vec<_> = fragments.iter().map(String::as_str).collect();
        Some(fragments.join(separator))
    }

    /// Condition or filter expression joined by the builder's connective.
    pub(crate) fn condition(&self, kind: ClauseKind) -> Option<String> {
        self.join(kind, &self.logic)
    }

    pub(crate) fn key_condition(&self) -> Option<String> {
        self.join(ClauseKind::KeyCondition, &LogicalOperator::And)
    }

    pub(crate) fn projection(&self) -> Option<String> {
        self.join(ClauseKind::Projection, ", ")
    }

    /// `SET … REMOVE … ADD … DELETE …`, skipping empty sections.
    pub(crate) fn update(&self) -> Option<String> {
        let sections: Vec<_> = UPDATE_SECTIONS
            .iter()
            .filter_map(|(kind, keyword)| {
                self.join(*kind, ", ")
                    .map(|fragments| format!("{keyword} {fragments}"))
            })
            .collect();
        if sections.is_empty() {
            None
        } else {
            Some(sections.join(" "))
        }
    }

    pub(crate) fn names(&self) -> Option<collections::HashMap<String, String>> {
        Some(self.expression_attribute_names.clone()).filter(|names| !names.is_empty())
    }

    pub(crate) fn values(
        &self,
    ) -> Option<collections::HashMap<String, types::AttributeValue>> {
        Some(self.expression_attribute_values.clone()).filter(|values| !values.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::common::expression::Comparator;
    use rstest::rstest;

    fn n(value: &str) -> Result<Operand, InputError> {
        Ok(Operand::One(types::AttributeValue::N(value.to_string())))
    }

    #[test]
    fn test_repeated_path_gets_distinct_placeholders() {
        let mut clauses = Clauses::default();
        clauses.push(ClauseKind::Set, "a", Operator::Increment, n("1"));
        clauses.push(ClauseKind::Set, "a", Operator::Increment, n("2"));
        clauses.push(ClauseKind::Add, "a", Operator::Add, n("3"));
        assert_eq!(
            clauses.update().unwrap(),
            "SET #set0_a_0 = #set0_a_0 + :set0_a, #set1_a_0 = #set1_a_0 + :set1_a \
             ADD #add0_a_0 :add0_a"
        );
        let values = clauses.values().unwrap();
        assert_eq!(values.len(), 3);
        assert!(values.contains_key(":set0_a"));
        assert!(values.contains_key(":set1_a"));
        assert!(values.contains_key(":add0_a"));
    }

    #[test]
    fn test_update_section_order() {
        let mut clauses = Clauses::default();
        clauses.push(ClauseKind::Delete, "d", Operator::Delete, n("1"));
        clauses.push(ClauseKind::Remove, "r", Operator::Path, Ok(Operand::None));
        clauses.push(ClauseKind::Set, "s", Operator::Assign, n("1"));
        assert_eq!(
            clauses.update().unwrap(),
            "SET #set0_s_0 = :set0_s REMOVE #remove0_r_0 DELETE #delete0_d_0 :delete0_d"
        );
    }

    #[test]
    fn test_condition_connective() {
        let mut clauses = Clauses::default();
        clauses.push(ClauseKind::Condition, "a", Operator::Compare(Comparator::Eq), n("1"));
        clauses.push(ClauseKind::Condition, "b", Operator::Compare(Comparator::Gt), n("2"));
        assert_eq!(
            clauses.condition(ClauseKind::Condition).unwrap(),
            "#condition0_a_0 = :condition0_a AND #condition0_b_0 > :condition0_b"
        );
        clauses.logic = LogicalOperator::Or;
        assert_eq!(
            clauses.condition(ClauseKind::Condition).unwrap(),
            "#condition0_a_0 = :condition0_a OR #condition0_b_0 > :condition0_b"
        );
    }

    #[test]
    fn test_empty_clauses_are_omitted() {
        let clauses = Clauses::default();
        assert!(clauses.update().is_none());
        assert!(clauses.condition(ClauseKind::Condition).is_none());
        assert!(clauses.projection().is_none());
        assert!(clauses.names().is_none());
        assert!(clauses.values().is_none());
        assert!(clauses.is_empty(ClauseKind::Set));
    }

    #[test]
    fn test_duplicate_fragments_collapse() {
        let mut clauses = Clauses::default();
        clauses.insert(ClauseKind::Projection, "#x".to_string());
        clauses.insert(ClauseKind::Projection, "#x".to_string());
        assert_eq!(clauses.projection().unwrap(), "#x");
    }

    #[rstest]
    #[case::same(ClauseKind::Set, "updated_at", true)]
    #[case::nested(ClauseKind::Remove, "updated_at.by", true)]
    #[case::indexed(ClauseKind::Add, "updated_at[0]", true)]
    #[case::prefix_only(ClauseKind::Set, "updated_at_old", false)]
    #[case::other_kind(ClauseKind::Condition, "updated_at", false)]
    fn test_touches(#[case] kind: ClauseKind, #[case] path: &str, #[case] expected: bool) {
        let mut clauses = Clauses::default();
        clauses.push(kind, path, Operator::Path, Ok(Operand::None));
        let mutations = [ClauseKind::Set, ClauseKind::Remove, ClauseKind::Add];
        assert_eq!(clauses.touches(&mutations, "updated_at"), expected);
    }

    #[test]
    fn test_name_is_not_split() {
        let mut clauses = Clauses::default();
        let eq = Operator::Compare(Comparator::Eq);
        clauses.push_name(ClauseKind::KeyCondition, "a.b", eq.clone(), n("1"));
        clauses.push(ClauseKind::Filter, "a.b", eq, n("2"));
        assert_eq!(clauses.key_condition().unwrap(), "#key0_a_2e_b_0 = :key0_a_2e_b");
        assert_eq!(
            clauses.condition(ClauseKind::Filter).unwrap(),
            "#filter0_a_2e_b_0.#filter0_a_2e_b_1 = :filter0_a_2e_b"
        );
        let names = clauses.names().unwrap();
        assert_eq!(names["#key0_a_2e_b_0"], "a.b");
        assert_eq!(names["#filter0_a_2e_b_0"], "a");
        assert_eq!(names["#filter0_a_2e_b_1"], "b");
    }

    #[test]
    fn test_first_error_is_kept() {
        let mut clauses = Clauses::default();
        clauses.push(ClauseKind::Set, "a..b", Operator::Assign, n("1"));
        clauses.push(
            ClauseKind::Set,
            "c",
            Operator::Assign,
            Err(InputError::Serialize("boom".to_string())),
        );
        assert!(matches!(
            clauses.check(),
            Err(InputError::InvalidPath { .. })
        ));
        assert!(clauses.update().is_none());
    }
}
