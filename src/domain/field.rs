use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Structured fields attached to a log entry.
///
/// A `BTreeMap` keeps iteration order stable, which the console sink and
/// the tests rely on.
pub type Fields = BTreeMap<String, FieldValue>;

/// Value of a single log field.
///
/// Only `Str` survives the wire untouched; every other variant except
/// `Binary` is converted through its textual representation when an entry
/// is encoded. `Binary` has no textual form and makes encoding fail.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Duration(Duration),
    Timestamp(DateTime<Utc>),
    Binary(Vec<u8>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Textual representation used at the wire boundary, `None` when the
    /// value has none.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::Str(s) => Some(s.clone()),
            FieldValue::Int(v) => Some(v.to_string()),
            FieldValue::UInt(v) => Some(v.to_string()),
            FieldValue::Float(v) => Some(v.to_string()),
            FieldValue::Bool(v) => Some(v.to_string()),
            FieldValue::Duration(d) => Some(format!("{d:?}")),
            FieldValue::Timestamp(t) => Some(t.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            FieldValue::Binary(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Str(_) => "string",
            FieldValue::Int(_) => "int",
            FieldValue::UInt(_) => "uint",
            FieldValue::Float(_) => "float",
            FieldValue::Bool(_) => "bool",
            FieldValue::Duration(_) => "duration",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Binary(_) => "binary",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
            other => f.write_str(&other.to_text().unwrap_or_default()),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::UInt(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::UInt(value as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Duration> for FieldValue {
    fn from(value: Duration) -> Self {
        FieldValue::Duration(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Binary(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_textual_representations() {
        assert_eq!(FieldValue::from("alice").to_text().as_deref(), Some("alice"));
        assert_eq!(FieldValue::from(-3_i64).to_text().as_deref(), Some("-3"));
        assert_eq!(FieldValue::from(7_u32).to_text().as_deref(), Some("7"));
        assert_eq!(FieldValue::from(true).to_text().as_deref(), Some("true"));
        assert_eq!(
            FieldValue::from(Duration::from_secs(2)).to_text().as_deref(),
            Some("2s")
        );
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            FieldValue::from(ts).to_text().as_deref(),
            Some("2024-05-01T12:00:00.000000000Z")
        );
    }

    #[test]
    fn test_binary_has_no_text() {
        let value = FieldValue::from(vec![0_u8, 1, 2]);
        assert_eq!(value.to_text(), None);
        assert_eq!(value.type_name(), "binary");
        assert_eq!(value.to_string(), "<3 bytes>");
    }

    #[test]
    fn test_as_str_only_for_strings() {
        assert_eq!(FieldValue::from("svc").as_str(), Some("svc"));
        assert_eq!(FieldValue::from(1_i64).as_str(), None);
    }
}
