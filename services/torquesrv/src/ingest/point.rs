//! Point assembly and line protocol rendering

use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::num::ParseIntError;

use super::classify::MeasurementCategory;
use super::params::IncomingRequest;
use crate::error::{Result, TorqueError};

/// Field value types
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::String(v) => write!(f, "\"{}\"", escape_string_value(v)),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

/// Timestamp precision of a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Nanoseconds,
    Milliseconds,
}

impl Precision {
    /// Value of the `precision` write parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Milliseconds => "ms",
        }
    }

    /// Convert a nanosecond timestamp to this precision
    pub fn scale(&self, nanos: i64) -> i64 {
        match self {
            Self::Nanoseconds => nanos,
            Self::Milliseconds => nanos / 1_000_000,
        }
    }
}

/// The four tags attached to every point
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityTags {
    /// `eml`; empty when the app does not send it
    pub email: String,
    /// `v`
    pub version: String,
    /// `session`
    pub session: String,
    /// `id`
    pub device: String,
}

impl IdentityTags {
    pub fn from_request(request: &IncomingRequest) -> Self {
        Self {
            email: request.first_or_empty("eml").to_string(),
            version: request.first_or_empty("v").to_string(),
            session: request.first_or_empty("session").to_string(),
            device: request.first_or_empty("id").to_string(),
        }
    }

    /// Tag key/value pairs, sorted by key
    pub fn pairs(&self) -> [(&'static str, &str); 4] {
        [
            ("Device", self.device.as_str()),
            ("Email", self.email.as_str()),
            ("Session", self.session.as_str()),
            ("Version", self.version.as_str()),
        ]
    }
}

/// Convert the `time` parameter (epoch milliseconds) to epoch nanoseconds
///
/// The value must be a plain integer; six zero digits are then appended and
/// the result parsed as an `i64`, so values that overflow once scaled are
/// rejected too.
pub fn derive_timestamp(time: &str) -> Result<i64> {
    let invalid = |source: ParseIntError| TorqueError::InvalidTimestamp {
        value: time.to_string(),
        source,
    };

    // An empty value or a bare sign would parse once the zeros are appended
    time.parse::<i64>().map_err(invalid)?;
    format!("{time}000000").parse::<i64>().map_err(invalid)
}

/// One timestamped, tagged telemetry record
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryPoint {
    measurement: MeasurementCategory,
    tags: IdentityTags,
    fields: BTreeMap<String, FieldValue>,
    timestamp: i64,
}

impl TelemetryPoint {
    /// Assemble a point, applying the storage client's point checks
    ///
    /// An empty field set is accepted.
    pub fn new(
        measurement: MeasurementCategory,
        tags: IdentityTags,
        fields: BTreeMap<String, FieldValue>,
        timestamp: i64,
    ) -> Result<Self> {
        for (key, value) in tags.pairs() {
            if value.contains('\n') {
                return Err(TorqueError::invalid_point(format!(
                    "tag {key} contains a newline"
                )));
            }
        }

        for (key, value) in &fields {
            if key.is_empty() {
                return Err(TorqueError::invalid_point("field key is empty"));
            }
            if key.contains('\n') {
                return Err(TorqueError::invalid_point(format!(
                    "field key {key:?} contains a newline"
                )));
            }
            if let FieldValue::Float(v) = value {
                if v.is_nan() {
                    return Err(TorqueError::invalid_point(format!(
                        "NaN is an unsupported value for field {key}"
                    )));
                }
                if v.is_infinite() {
                    return Err(TorqueError::invalid_point(format!(
                        "+/-Inf is an unsupported value for field {key}"
                    )));
                }
            }
        }

        Ok(Self {
            measurement,
            tags,
            fields,
            timestamp,
        })
    }

    pub fn measurement(&self) -> MeasurementCategory {
        self.measurement
    }

    pub fn tags(&self) -> &IdentityTags {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Nanoseconds since the Unix epoch
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Render as one line of InfluxDB line protocol
    ///
    /// Tags with an empty value are left out.
    pub fn to_line_protocol(&self, precision: Precision) -> String {
        let mut line = escape_measurement(self.measurement.as_str());

        for (key, value) in self.tags.pairs() {
            if value.is_empty() {
                continue;
            }
            let _ = write!(
                line,
                ",{}={}",
                escape_key(key),
                escape_key(value)
            );
        }

        line.push(' ');
        let mut first = true;
        for (key, value) in &self.fields {
            if !first {
                line.push(',');
            }
            let _ = write!(line, "{}={}", escape_key(key), value);
            first = false;
        }

        let _ = write!(line, " {}", precision.scale(self.timestamp));
        line
    }
}

impl fmt::Display for TelemetryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line_protocol(Precision::Nanoseconds))
    }
}

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

// Tag keys, tag values and field keys share the same escaping
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

fn escape_string_value(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
