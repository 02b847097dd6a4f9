//! Entry codecs: the marshal/unmarshal contract between producer and
//! consumer processes.
//!
//! Both wire formats carry the same four logical fields (`fields`,
//! `level`, `timestamp`, `message`). The conversion rules live here so the
//! formats cannot drift apart:
//! - every field value must have a textual representation, otherwise
//!   encoding fails with [`CodecError::UnsupportedFieldType`];
//! - the timestamp travels as RFC 3339 text with nanosecond precision;
//! - an absent level or timestamp decodes to the zero value, an unknown
//!   level is an error;
//! - decoded fields are merged into the destination entry.

pub mod json;
pub mod protobuf;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{FieldValue, Level, LogEntry};
use crate::port::{Decoder, Encoder};

pub use json::JsonCodec;
pub use protobuf::ProtobufCodec;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("field '{key}' of type {type_name} has no textual representation")]
    UnsupportedFieldType {
        key: String,
        type_name: &'static str,
    },
    #[error("attempted to marshal a type other than LogEntry")]
    WrongInputType,
    #[error("attempted to unmarshal into a type other than LogEntry")]
    WrongOutputType,
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("unknown log level '{0}'")]
    UnknownLevel(String),
}

/// Wire format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Protocol buffers (default)
    #[default]
    Protobuf,
    /// JSON object per message
    Json,
}

impl WireFormat {
    pub fn encoder(self) -> Arc<dyn Encoder> {
        match self {
            WireFormat::Protobuf => Arc::new(ProtobufCodec),
            WireFormat::Json => Arc::new(JsonCodec),
        }
    }

    pub fn decoder(self) -> Arc<dyn Decoder> {
        match self {
            WireFormat::Protobuf => Arc::new(ProtobufCodec),
            WireFormat::Json => Arc::new(JsonCodec),
        }
    }
}

pub(crate) fn text_fields(entry: &LogEntry) -> Result<HashMap<String, String>, CodecError> {
    let mut fields = HashMap::with_capacity(entry.fields.len());
    for (key, value) in &entry.fields {
        let text = value
            .to_text()
            .ok_or_else(|| CodecError::UnsupportedFieldType {
                key: key.clone(),
                type_name: value.type_name(),
            })?;
        fields.insert(key.clone(), text);
    }
    Ok(fields)
}

pub(crate) fn timestamp_text(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_level(level: &str) -> Result<Level, CodecError> {
    if level.is_empty() {
        return Ok(Level::default());
    }
    level
        .parse()
        .map_err(|_| CodecError::UnknownLevel(level.to_string()))
}

pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, CodecError> {
    if text.is_empty() {
        return Ok(DateTime::<Utc>::UNIX_EPOCH);
    }
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CodecError::MalformedPayload(format!("invalid timestamp '{text}': {e}")))
}

/// Applies decoded wire values to `entry`. Nothing is written unless every
/// value parses.
pub(crate) fn apply_decoded(
    entry: &mut LogEntry,
    level: &str,
    timestamp: &str,
    message: String,
    fields: HashMap<String, String>,
) -> Result<(), CodecError> {
    let level = parse_level(level)?;
    let timestamp = parse_timestamp(timestamp)?;

    entry.level = level;
    entry.timestamp = timestamp;
    entry.message = message;
    entry.fields.extend(
        fields
            .into_iter()
            .map(|(key, value)| (key, FieldValue::Str(value))),
    );
    Ok(())
}
