use crate::{
    common::Item,
    error::{Error, Result},
};

/// Primary key attribute names of a table or index.
///
/// ```rust
/// use dynamodb_odm::common::key;
///
/// let keys = key::KeySchema::new("id").sort_key("created_at");
/// assert_eq!(keys.partition_key, "id");
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct KeySchema {
    /// The partition key attribute name.
    pub partition_key: String,
    /// The sort key attribute name (only for composite primary keys).
    pub sort_key: Option<String>,
}

impl KeySchema {
    /// Key schema with a partition key only.
    pub fn new(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: None,
        }
    }

    /// Add a sort key.
    pub fn sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    /// Attribute names making up the key.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.partition_key.as_str()).chain(self.sort_key.as_deref())
    }

    /// Keep only the key attributes of `item`.
    ///
    /// Fails with [`Error::MissingKey`] when a key attribute is absent.
    pub fn extract(&self, item: &Item) -> Result<Item> {
        let mut key = Item::with_capacity(2);
        for attribute in self.attributes() {
            let value = item
                .get(attribute)
                .ok_or_else(|| Error::MissingKey(attribute.to_string()))?;
            key.insert(attribute.to_string(), value.clone());
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types;
    use rstest::rstest;

    fn s(value: &str) -> types::AttributeValue {
        types::AttributeValue::S(value.to_string())
    }

    #[rstest]
    #[case::partition_key_only(
        KeySchema::new("a"),
        Item::from(
            [
                ("a".to_string(), s("b")),
                ("c".to_string(), s("d")),
            ]
        ),
        Item::from(
            [
                ("a".to_string(), s("b")),
            ]
        )
    )]
    #[case::partition_key_and_sort_key(
        KeySchema::new("a").sort_key("c"),
        Item::from(
            [
                ("a".to_string(), s("b")),
                ("c".to_string(), types::AttributeValue::N("1".to_string())),
                ("e".to_string(), s("f")),
            ]
        ),
        Item::from(
            [
                ("a".to_string(), s("b")),
                ("c".to_string(), types::AttributeValue::N("1".to_string())),
            ]
        )
    )]
    fn test_extract(#[case] keys: KeySchema, #[case] item: Item, #[case] expected: Item) {
        let actual = keys.extract(&item).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_extract_missing_sort_key() {
        let keys = KeySchema::new("a").sort_key("c");
        let item = Item::from([("a".to_string(), s("b"))]);
        let error = keys.extract(&item).unwrap_err();
        assert!(matches!(error, Error::MissingKey(attribute) if attribute == "c"));
    }
}
