//! Reporting configuration shared by every builder.

use aws_sdk_dynamodb::types;
use std::{env, sync};

/// Environment variable selecting the deployment environment.
pub const ENVIRONMENT_VAR: &str = "DYNAMODB_ODM_ENV";

/// Environment variable overriding the consumed capacity level.
pub const RETURN_CONSUMED_CAPACITY_VAR: &str = "DYNAMODB_ODM_RETURN_CONSUMED_CAPACITY";

/// Environment variable overriding the item collection metrics level.
pub const RETURN_ITEM_COLLECTION_METRICS_VAR: &str = "DYNAMODB_ODM_RETURN_ITEM_COLLECTION_METRICS";

static GLOBAL: sync::LazyLock<Config> = sync::LazyLock::new(Config::from_env);

/// Diagnostic reporting levels requested from DynamoDB.
///
/// Outside production both levels default to the verbose setting (`TOTAL`, `SIZE`);
/// in production they default to `NONE`.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Consumed capacity level sent with every request.
    pub return_consumed_capacity: types::ReturnConsumedCapacity,
    /// Item collection metrics level sent with every write request.
    pub return_item_collection_metrics: types::ReturnItemCollectionMetrics,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            return_consumed_capacity: types::ReturnConsumedCapacity::Total,
            return_item_collection_metrics: types::ReturnItemCollectionMetrics::Size,
        }
    }
}

impl Config {
    /// Silent configuration used in production.
    pub fn production() -> Self {
        Self {
            return_consumed_capacity: types::ReturnConsumedCapacity::None,
            return_item_collection_metrics: types::ReturnItemCollectionMetrics::None,
        }
    }

    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_production = lookup(ENVIRONMENT_VAR).is_some_and(|value| {
            matches!(value.to_ascii_lowercase().as_str(), "production" | "prod")
        });
        let mut config = if is_production {
            Self::production()
        } else {
            Self::default()
        };
        if let Some(level) = lookup(RETURN_CONSUMED_CAPACITY_VAR) {
            config.return_consumed_capacity =
                types::ReturnConsumedCapacity::from(level.to_ascii_uppercase().as_str());
        }
        if let Some(level) = lookup(RETURN_ITEM_COLLECTION_METRICS_VAR) {
            config.return_item_collection_metrics =
                types::ReturnItemCollectionMetrics::from(level.to_ascii_uppercase().as_str());
        }
        config
    }

    /// Process-wide configuration, read from the environment once.
    pub fn global() -> &'static Self {
        &GLOBAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use std::collections;

    #[rstest]
    #[case::unset(
        vec![],
        Config::default()
    )]
    #[case::development(
        vec![
            (ENVIRONMENT_VAR, "development"),
        ],
        Config::default()
    )]
    #[case::production(
        vec![
            (ENVIRONMENT_VAR, "Production"),
        ],
        Config::production()
    )]
    #[case::override_in_production(
        vec![
            (ENVIRONMENT_VAR, "prod"),
            (RETURN_CONSUMED_CAPACITY_VAR, "indexes"),
        ],
        Config {
            return_consumed_capacity: types::ReturnConsumedCapacity::Indexes,
            return_item_collection_metrics: types::ReturnItemCollectionMetrics::None,
        }
    )]
    #[case::override_metrics(
        vec![
            (RETURN_ITEM_COLLECTION_METRICS_VAR, "NONE"),
        ],
        Config {
            return_consumed_capacity: types::ReturnConsumedCapacity::Total,
            return_item_collection_metrics: types::ReturnItemCollectionMetrics::None,
        }
    )]
    fn test_config_from_lookup(#[case] vars: Vec<(&str, &str)>, #[case] expected: Config) {
        let vars: collections::HashMap<_, _> = vars.into_iter().collect();
        let actual = Config::from_lookup(|key| vars.get(key).map(|value| value.to_string()));
        assert_eq!(actual, expected);
    }
}
