use crate::{
    common::{self, path},
    error::InputError,
};

use aws_sdk_dynamodb::types;
use std::collections;

/// Expression clause an operation contributes to.
///
/// The kind prefixes every placeholder so that clauses never share one.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ClauseKind {
    /// `ConditionExpression` of a write.
    Condition,
    /// `FilterExpression` of a query or scan.
    Filter,
    /// `KeyConditionExpression` of a query.
    KeyCondition,
    /// `ProjectionExpression` of a read.
    Projection,
    /// `SET` section of an update.
    Set,
    /// `REMOVE` section of an update.
    Remove,
    /// `ADD` section of an update.
    Add,
    /// `DELETE` section of an update.
    Delete,
}

impl ClauseKind {
    /// Placeholder prefix of the clause.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Condition => "condition",
            Self::Filter => "filter",
            Self::KeyCondition => "key",
            Self::Projection => "projection",
            Self::Set => "set",
            Self::Remove => "remove",
            Self::Add => "add",
            Self::Delete => "delete",
        }
    }
}

/// Comparison operator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Comparator {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
}

impl Comparator {
    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

/// DynamoDB attribute type, as tested by `attribute_type`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttributeType {
    /// `B`
    Binary,
    /// `BS`
    BinarySet,
    /// `BOOL`
    Boolean,
    /// `L`
    List,
    /// `M`
    Map,
    /// `NULL`
    Null,
    /// `N`
    Number,
    /// `NS`
    NumberSet,
    /// `S`
    String,
    /// `SS`
    StringSet,
}

impl AttributeType {
    /// Type descriptor used by the expression language.
    pub fn code(self) -> &'static str {
        match self {
            Self::Binary => "B",
            Self::BinarySet => "BS",
            Self::Boolean => "BOOL",
            Self::List => "L",
            Self::Map => "M",
            Self::Null => "NULL",
            Self::Number => "N",
            Self::NumberSet => "NS",
            Self::String => "S",
            Self::StringSet => "SS",
        }
    }
}

/// Operator applied to an attribute path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operator {
    /// Bare attribute reference, used by REMOVE and projections.
    Path,
    /// `path = value`
    Assign,
    /// `path = path + value`
    Increment,
    /// `path = path - value`
    Decrement,
    /// `path = list_append(path, value)`
    Append,
    /// `path = list_append(value, path)`
    Prepend,
    /// `path = if_not_exists(path, value)`
    IfNotExists,
    /// `path value` inside an ADD section.
    Add,
    /// `path value` inside a DELETE section.
    Delete,
    /// `path <comparator> value`
    Compare(Comparator),
    /// `path BETWEEN low AND high`
    Between,
    /// `begins_with(path, value)`
    BeginsWith,
    /// `contains(path, value)`
    Contains,
    /// `path IN (values)`
    In,
    /// `attribute_exists(path)`
    Exists,
    /// `attribute_not_exists(path)`
    NotExists,
    /// `size(path) <comparator> value`
    Size(Comparator),
    /// `attribute_type(path, value)`
    Type,
    /// `NOT (inner)`
    Not(Box<Operator>),
}

impl Operator {
    fn name(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Assign => "assign",
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Append => "append",
            Self::Prepend => "prepend",
            Self::IfNotExists => "if_not_exists",
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Compare(_) => "compare",
            Self::Between => "between",
            Self::BeginsWith => "begins_with",
            Self::Contains => "contains",
            Self::In => "in",
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
            Self::Size(_) => "size",
            Self::Type => "attribute_type",
            Self::Not(inner) => inner.name(),
        }
    }

    fn invalid_operand(&self, expected: &'static str) -> InputError {
        InputError::InvalidOperand {
            operator: self.name(),
            expected,
        }
    }

    fn render(
        &self,
        reference: &str,
        base: &str,
        operand: Operand,
        values: &mut collections::HashMap<String, types::AttributeValue>,
    ) -> Result<String, InputError> {
        match self {
            Self::Path | Self::Exists | Self::NotExists => {
                if operand != Operand::None {
                    return Err(self.invalid_operand("no value"));
                }
                let expression = match self {
                    Self::Exists => format!("attribute_exists({reference})"),
                    Self::NotExists => format!("attribute_not_exists({reference})"),
                    _ => reference.to_string(),
                };
                Ok(expression)
            }
            Self::Not(inner) => match inner.as_ref() {
                Self::Exists => Self::NotExists.render(reference, base, operand, values),
                Self::NotExists => Self::Exists.render(reference, base, operand, values),
                inner => {
                    let expression = inner.render(reference, base, operand, values)?;
                    Ok(format!("NOT ({expression})"))
                }
            },
            Self::Between => {
                let Operand::Two(low, high) = operand else {
                    return Err(self.invalid_operand("two values"));
                };
                let low_placeholder = format!(":{base}_0");
                let high_placeholder = format!(":{base}_1");
                let expression =
                    format!("{reference} BETWEEN {low_placeholder} AND {high_placeholder}");
                values.insert(low_placeholder, low);
                values.insert(high_placeholder, high);
                Ok(expression)
            }
            Self::In => {
                let items = match operand {
                    Operand::Many(items) if !items.is_empty() => items,
                    _ => return Err(self.invalid_operand("a non-empty list of values")),
                };
                let mut placeholders = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let placeholder = format!(":{base}_{index}");
                    values.insert(placeholder.clone(), item);
                    placeholders.push(placeholder);
                }
                Ok(format!("{reference} IN ({})", placeholders.join(", ")))
            }
            _ => {
                let Operand::One(value) = operand else {
                    return Err(self.invalid_operand("a single value"));
                };
                let value = match (self, value) {
                    // an empty string is stored as NULL, not removed
                    (Self::Assign, types::AttributeValue::S(string)) if string.is_empty() => {
                        types::AttributeValue::Null(true)
                    }
                    (_, value) => value,
                };
                let placeholder = format!(":{base}");
                let expression = match self {
                    Self::Assign => format!("{reference} = {placeholder}"),
                    Self::Increment => format!("{reference} = {reference} + {placeholder}"),
                    Self::Decrement => format!("{reference} = {reference} - {placeholder}"),
                    Self::Append => {
                        format!("{reference} = list_append({reference}, {placeholder})")
                    }
                    Self::Prepend => {
                        format!("{reference} = list_append({placeholder}, {reference})")
                    }
                    Self::IfNotExists => {
                        format!("{reference} = if_not_exists({reference}, {placeholder})")
                    }
                    Self::Add | Self::Delete => format!("{reference} {placeholder}"),
                    Self::Compare(comparator) => {
                        format!("{reference} {} {placeholder}", comparator.symbol())
                    }
                    Self::BeginsWith => format!("begins_with({reference}, {placeholder})"),
                    Self::Contains => format!("contains({reference}, {placeholder})"),
                    Self::Size(comparator) => {
                        format!("size({reference}) {} {placeholder}", comparator.symbol())
                    }
                    _ => format!("attribute_type({reference}, {placeholder})"),
                };
                values.insert(placeholder, value);
                Ok(expression)
            }
        }
    }
}

/// Operand bound to an operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// No value (REMOVE, projections, existence checks).
    None,
    /// One value.
    One(types::AttributeValue),
    /// Two values (BETWEEN).
    Two(types::AttributeValue, types::AttributeValue),
    /// A list of values (IN).
    Many(Vec<types::AttributeValue>),
}

/// Encode a path so that distinct paths always yield distinct placeholder stems.
///
/// ASCII alphanumerics are kept, `_` is doubled and anything else becomes `_<hex>_`.
fn encode(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for character in path.chars() {
        match character {
            character if character.is_ascii_alphanumeric() => encoded.push(character),
            '_' => encoded.push_str("__"),
            character => encoded.push_str(&format!("_{:x}_", u32::from(character))),
        }
    }
    encoded
}

/// A path, operator and disambiguation counter awaiting its operand.
///
/// ```rust
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use dynamodb_odm::common::expression::{ClauseKind, Operand, Operation, Operator};
///
/// let input = Operation::new(ClauseKind::Set, "a.b[0]", Operator::Increment, 1)
///     .bind(Operand::One(AttributeValue::N("1".to_string())))
///     .unwrap();
/// assert_eq!(
///     input.expression,
///     "#set1_a_2e_b_5b_0_5d__0.#set1_a_2e_b_5b_0_5d__1[0] = \
///      #set1_a_2e_b_5b_0_5d__0.#set1_a_2e_b_5b_0_5d__1[0] + :set1_a_2e_b_5b_0_5d_",
/// );
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operation<'a> {
    kind: ClauseKind,
    path: &'a str,
    operator: Operator,
    count: usize,
    nested: bool,
}

impl<'a> Operation<'a> {
    /// Bind the path, the operator and the disambiguation counter.
    pub fn new(kind: ClauseKind, path: &'a str, operator: Operator, count: usize) -> Self {
        Self {
            kind,
            path,
            operator,
            count,
            nested: true,
        }
    }

    /// Like [`Operation::new`] for a top-level attribute `name`, which is never split.
    ///
    /// Key and timestamp attributes are named by the schema, so `a.b` there is one
    /// attribute rather than a map entry.
    pub fn name(kind: ClauseKind, name: &'a str, operator: Operator, count: usize) -> Self {
        Self {
            nested: false,
            ..Self::new(kind, name, operator, count)
        }
    }

    /// Bind the operand and compile the expression fragment.
    pub fn bind(self, operand: Operand) -> Result<common::ExpressionInput, InputError> {
        let segments = if self.nested || self.path.is_empty() {
            path::parse(self.path)?
        } else {
            vec![path::Segment::Name(self.path)]
        };
        let base = format!("{}{}_{}", self.kind.prefix(), self.count, encode(self.path));
        let mut expression_attribute_names = collections::HashMap::new();
        let mut reference = String::new();
        let mut name_index = 0;
        for segment in segments {
            match segment {
                path::Segment::Name(name) => {
                    if !reference.is_empty() {
                        reference.push('.');
                    }
                    let placeholder = format!("#{base}_{name_index}");
                    name_index += 1;
                    reference.push_str(&placeholder);
                    expression_attribute_names.insert(placeholder, name.to_string());
                }
                path::Segment::Index(index) => reference.push_str(&format!("[{index}]")),
            }
        }
        let mut expression_attribute_values = collections::HashMap::new();
        let expression = self.operator.render(
            &reference,
            &base,
            operand,
            &mut expression_attribute_values,
        )?;
        Ok(common::ExpressionInput {
            expression,
            expression_attribute_names,
            expression_attribute_values,
        })
    }
}
