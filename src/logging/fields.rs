//! Structured key/value fields attached to log records.

use std::sync::Arc;

use serde_json::Value;


/// A single structured field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: String,
    value: Value,
}

impl Field {
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Shorthand for [`Field::new`].
#[inline]
pub fn field<K, V>(key: K, value: V) -> Field
where
    K: Into<String>,
    V: Into<Value>,
{
    Field::new(key, value)
}


/// An immutable, ordered set of fields.
///
/// Extending never mutates the receiver; it returns a new set holding
/// the receiver's fields followed by the additions.
#[derive(Debug, Clone, Default)]
pub struct Fields(Arc<[Field]>);

impl Fields {
    #[must_use = "extending returns a new field set"]
    pub fn extended<I>(&self, additions: I) -> Fields
    where
        I: IntoIterator<Item = Field>,
    {
        let mut fields = self.0.to_vec();
        fields.extend(additions);

        Fields(fields.into())
    }

    /// Returns the most recently attached value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0
            .iter()
            .rev()
            .find(|field| field.key == key)
            .map(Field::value)
    }

    #[inline]
    pub fn as_slice(&self) -> &[Field] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
