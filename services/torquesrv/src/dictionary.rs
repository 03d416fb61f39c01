//! Key dictionary
//!
//! Maps raw Torque PID keys (`kff1005`, `k0c`, ...) to readable field names.
//! Loaded once at startup from a `raw_key,canonical_key` file and shared
//! read-only between request handlers.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{Result, TorqueError};

/// Immutable, case-insensitive raw key → canonical key mapping
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: HashMap<String, String>,
}

impl Dictionary {
    /// Load dictionary from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let file = std::fs::File::open(path).map_err(|e| TorqueError::Dictionary {
            path: source.clone(),
            message: e.to_string(),
        })?;

        Self::from_reader(file, &source)
    }

    /// Parse dictionary lines from any reader
    ///
    /// Only the first two columns are used. Blank lines are skipped; a line
    /// without a second column, or with either key blank, is rejected with its
    /// line number. Raw keys are trimmed and lower-cased, canonical keys are
    /// kept verbatim, and a repeated raw key takes the value of its last line.
    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self> {
        // No quoting: a line is split on every comma
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut entries = HashMap::new();
        for record in reader.records() {
            let record = record.map_err(|e| TorqueError::Dictionary {
                path: source.to_string(),
                message: e.to_string(),
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            if record.iter().all(|column| column.trim().is_empty()) {
                continue;
            }

            match (record.get(0), record.get(1)) {
                (Some(raw), Some(canonical))
                    if !raw.trim().is_empty() && !canonical.trim().is_empty() =>
                {
                    entries.insert(raw.trim().to_lowercase(), canonical.to_string());
                },
                _ => {
                    return Err(TorqueError::MalformedDictionary {
                        path: source.to_string(),
                        line,
                    })
                },
            }
        }

        debug!("Dictionary {} parsed: {} entries", source, entries.len());
        Ok(Self { entries })
    }

    /// Canonical key for `raw_key`, ignoring case
    pub fn lookup(&self, raw_key: &str) -> Option<&str> {
        let key = if raw_key.chars().any(char::is_uppercase) {
            Cow::Owned(raw_key.to_lowercase())
        } else {
            Cow::Borrowed(raw_key)
        };
        self.entries.get(key.as_ref()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Dictionary
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(raw, canonical)| (raw.as_ref().to_lowercase(), canonical.into()))
                .collect(),
        }
    }
}
