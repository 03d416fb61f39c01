//! Incoming query parameters and the mandatory-parameter check

use std::collections::BTreeMap;

use crate::error::{Result, TorqueError};

/// Parameters every upload must carry, checked in this order
pub const MANDATORY_PARAMS: [&str; 4] = ["v", "session", "id", "time"];

/// Query parameters of one upload
///
/// Keys are lower-cased; values are kept verbatim in arrival order. Keys are
/// held sorted so every downstream stage sees the same iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingRequest {
    params: BTreeMap<String, Vec<String>>,
}

impl IncomingRequest {
    /// Decode a raw (still percent-encoded) query string
    pub fn from_query(query: Option<&str>) -> Self {
        let pairs = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes());
        pairs.collect()
    }

    /// First value of `key`
    pub fn first(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// First value of `key`, or "" when absent
    pub fn first_or_empty(&self, key: &str) -> &str {
        self.first(key).unwrap_or_default()
    }

    /// All keys, in lexicographic order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// `(key, first value)` pairs, in lexicographic key order
    pub fn first_values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().filter_map(|(key, values)| {
            values
                .first()
                .map(|value| (key.as_str(), value.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for IncomingRequest
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in iter {
            params
                .entry(key.as_ref().to_lowercase())
                .or_default()
                .push(value.into());
        }
        Self { params }
    }
}

/// Fail with the first mandatory parameter that is absent or empty
pub fn validate_mandatory(request: &IncomingRequest) -> Result<()> {
    for key in MANDATORY_PARAMS {
        if request.first_or_empty(key).is_empty() {
            return Err(TorqueError::MissingParameter(key));
        }
    }
    Ok(())
}
