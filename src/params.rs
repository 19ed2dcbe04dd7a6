//! Raw request parameters as they arrive from a query string or JSON body.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::is_reserved;

/// A single untrusted parameter value.
///
/// Query strings only ever produce `Text`, JSON callers may send numbers, `null`
/// or string arrays. Anything else lands in `Other` so one odd value never
/// rejects the whole request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Text(String),
    Number(serde_json::Number),
    List(Vec<String>),
    Other(serde_json::Value),
}

impl RawValue {
    /// The string payload, if this is a `Text` value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The string payload if it is non-blank after trimming.
    #[must_use]
    pub fn non_blank_text(&self) -> Option<&str> {
        self.as_text().map(str::trim).filter(|text| !text.is_empty())
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for RawValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<Vec<String>> for RawValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// The flat parameter map of one list request.
///
/// Keys are kept sorted so that every stage visits them in the same order no
/// matter how the request spelled them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, RawValue>);

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key)
    }

    /// Text value of `key`, if present and a string.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(RawValue::as_text)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Every non-reserved entry, in key order.
    pub fn filters(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.iter().filter(|(key, _)| !is_reserved(key))
    }

    /// Stable cache key for a read-through cache in front of the list query.
    ///
    /// Entries with a `null` value are dropped, so `?title=` via JSON `null` and an
    /// absent `title` share a key.
    #[must_use]
    pub fn cache_key(&self, prefix: &str) -> String {
        let present: BTreeMap<&str, &RawValue> = self
            .0
            .iter()
            .filter(|(_, value)| !matches!(value, RawValue::Null))
            .map(|(key, value)| (key.as_str(), value))
            .collect();
        let encoded = serde_json::to_string(&present).unwrap_or_default();
        format!("{prefix}_list_{encoded}")
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<RawValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, RawValue>> for QueryParams {
    fn from(map: BTreeMap<String, RawValue>) -> Self {
        Self(map)
    }
}
