//! Error types returned by builders and their execution.

/// Errors detected while a builder accumulates input.
///
/// Builder methods return the builder itself, so these are recorded and surfaced
/// by the first `to_request` or `execute` call.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum InputError {
    /// The attribute path cannot be parsed.
    #[error("invalid attribute path `{path}`: {reason}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// The operand does not match what the operator expects.
    #[error("operator `{operator}` expects {expected}")]
    InvalidOperand {
        /// The operator name.
        operator: &'static str,
        /// The expected operand shape.
        expected: &'static str,
    },
    /// A value could not be converted into a DynamoDB attribute value.
    #[error("cannot serialize value: {0}")]
    Serialize(String),
}

impl From<serde_dynamo::Error> for InputError {
    fn from(error: serde_dynamo::Error) -> Self {
        Self::Serialize(error.to_string())
    }
}

/// Errors returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An update was executed without any SET, REMOVE, ADD or DELETE clause.
    #[error("empty update expression: nothing to set, remove, add or delete")]
    EmptyExpression,
    /// A key attribute required by the schema is missing.
    #[error("missing value for key attribute `{0}`")]
    MissingKey(String),
    /// The request does not fit the model schema.
    #[error("schema error: {0}")]
    Schema(String),
    /// Builder options DynamoDB does not accept together.
    #[error("conflicting options: {0}")]
    Conflict(&'static str),
    /// The model rejected the item.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Deferred builder input error.
    #[error(transparent)]
    Input(#[from] InputError),
    /// A response item could not be converted into the model.
    #[error(transparent)]
    Serde(#[from] serde_dynamo::Error),
    /// The SDK rejected the request shape.
    #[error(transparent)]
    Build(#[from] aws_sdk_dynamodb::error::BuildError),
    /// The database client failed; propagated unchanged.
    #[error(transparent)]
    Client(#[from] aws_sdk_dynamodb::Error),
}

/// Result alias using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
