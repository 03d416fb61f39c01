//! Field normalization
//!
//! Turns the non-control parameters of an upload into typed fields, renaming
//! raw keys through the dictionary.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::params::IncomingRequest;
use super::point::FieldValue;
use crate::dictionary::Dictionary;

/// Parameters consumed as tags or timestamp, never stored as fields
pub const CONTROL_KEYS: [&str; 5] = ["session", "eml", "id", "v", "time"];

/// Marker of values the storage engine cannot hold
const INFINITY_MARKER: &str = "Infinity";

pub fn is_control_key(key: &str) -> bool {
    key.is_empty() || CONTROL_KEYS.contains(&key)
}

/// Whole-string numeric test
///
/// Accepts an optional sign, digits with at most one decimal point where at
/// least one digit follows the point, and an optional exponent. `.5` is
/// numeric, `5.` is not.
pub fn is_numeric_literal(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return false;
        }
    } else if int_digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

/// Coerce a raw value into a field value
///
/// Returns `None` for values containing `Infinity`; those are reported as
/// partial content instead of being stored.
pub fn coerce_value(value: &str) -> Option<FieldValue> {
    if value.contains(INFINITY_MARKER) {
        return None;
    }

    if is_numeric_literal(value) {
        if let Ok(number) = value.parse::<f64>() {
            return Some(FieldValue::Float(number));
        }
    }

    Some(FieldValue::String(value.to_string()))
}

/// A parameter dropped because its value cannot be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredField {
    /// Raw (lower-cased) parameter key
    pub key: String,
    /// Raw value
    pub value: String,
}

/// Result of normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    /// Fields keyed by canonical name
    pub fields: BTreeMap<String, FieldValue>,
    /// Parameters left out because of their value, in key order
    pub filtered: Vec<FilteredField>,
}

/// Build the field set of an upload
///
/// Control keys are skipped. Each remaining key is renamed through the
/// dictionary (or kept as-is when absent) and its first value coerced. Keys
/// are visited in lexicographic order; when two raw keys map to the same
/// canonical key the first one keeps it.
pub fn normalize_fields(request: &IncomingRequest, dictionary: &Dictionary) -> FieldSet {
    let mut set = FieldSet::default();

    for (raw_key, raw_value) in request.first_values() {
        if is_control_key(raw_key) {
            continue;
        }

        let Some(value) = coerce_value(raw_value) else {
            set.filtered.push(FilteredField {
                key: raw_key.to_string(),
                value: raw_value.to_string(),
            });
            continue;
        };

        let canonical = dictionary.lookup(raw_key).unwrap_or(raw_key);
        trace!("{} -> {} = {}", raw_key, canonical, value);

        match set.fields.entry(canonical.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            },
            Entry::Occupied(_) => {
                debug!(
                    "Field {} already set, dropping value of {}",
                    canonical, raw_key
                );
            },
        }
    }

    set
}
