//! Protocol buffers wire format.
//!
//! The message is declared with prost's derive instead of generated code;
//! it is equivalent to:
//!
//! ```proto
//! message Entry {
//!   map<string, string> Fields = 1;
//!   string Level = 2;
//!   bytes Timestamp = 3;
//!   string Message = 4;
//! }
//! ```

use prost::Message;
use std::any::Any;
use std::collections::HashMap;

use super::{CodecError, apply_decoded, text_fields, timestamp_text};
use crate::domain::LogEntry;
use crate::port::{Decoder, Encoder};

#[derive(Clone, PartialEq, prost::Message)]
pub struct WireEntry {
    #[prost(map = "string, string", tag = "1")]
    pub fields: HashMap<String, String>,
    #[prost(string, tag = "2")]
    pub level: String,
    #[prost(bytes = "vec", tag = "3")]
    pub timestamp: Vec<u8>,
    #[prost(string, tag = "4")]
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufCodec;

impl Encoder for ProtobufCodec {
    fn encode(&self, entry: &LogEntry) -> Result<Vec<u8>, CodecError> {
        let wire = WireEntry {
            fields: text_fields(entry)?,
            level: entry.level.as_str().to_string(),
            timestamp: timestamp_text(&entry.timestamp).into_bytes(),
            message: entry.message.clone(),
        };
        Ok(wire.encode_to_vec())
    }
}

impl Decoder for ProtobufCodec {
    fn decode(&self, data: &[u8], entry: &mut LogEntry) -> Result<(), CodecError> {
        let wire =
            WireEntry::decode(data).map_err(|e| CodecError::MalformedPayload(e.to_string()))?;
        let timestamp = String::from_utf8(wire.timestamp)
            .map_err(|e| CodecError::MalformedPayload(format!("timestamp is not UTF-8: {e}")))?;
        apply_decoded(entry, &wire.level, &timestamp, wire.message, wire.fields)
    }
}

/// Marshal entry point for call sites that only hold a type-erased value.
pub fn marshal(value: &dyn Any) -> Result<Vec<u8>, CodecError> {
    let entry = value
        .downcast_ref::<LogEntry>()
        .ok_or(CodecError::WrongInputType)?;
    ProtobufCodec.encode(entry)
}

/// Unmarshal counterpart of [`marshal`].
pub fn unmarshal(data: &[u8], value: &mut dyn Any) -> Result<(), CodecError> {
    let entry = value
        .downcast_mut::<LogEntry>()
        .ok_or(CodecError::WrongOutputType)?;
    ProtobufCodec.decode(data, entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldValue, Level};
    use chrono::{TimeZone, Utc};

    fn sample() -> LogEntry {
        LogEntry::new(Level::Info, "it's ice cream time!")
            .with_timestamp(Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap())
            .with_field("flavour", "pistachio")
            .with_field("scoops", "2")
    }

    #[test]
    fn test_round_trip() {
        let source = sample();
        let bytes = ProtobufCodec.encode(&source).unwrap();

        let mut decoded = LogEntry::default();
        ProtobufCodec.decode(&bytes, &mut decoded).unwrap();

        assert_eq!(decoded, source);
    }

    #[test]
    fn test_wire_layout_matches_schema() {
        let bytes = ProtobufCodec.encode(&sample()).unwrap();
        let wire = WireEntry::decode(bytes.as_slice()).unwrap();

        assert_eq!(wire.level, "info");
        assert_eq!(wire.message, "it's ice cream time!");
        assert_eq!(wire.fields.len(), 2);
        assert_eq!(
            String::from_utf8(wire.timestamp).unwrap(),
            "2023-11-14T22:13:20.123456789Z"
        );
    }

    #[test]
    fn test_empty_payload_decodes_to_zero_values() {
        let mut entry = LogEntry::new(Level::Fatal, "kept?");
        ProtobufCodec.decode(&[], &mut entry).unwrap();

        assert_eq!(entry, LogEntry::default());
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let wire = WireEntry {
            level: "catastrophic".to_string(),
            ..WireEntry::default()
        };
        let mut entry = LogEntry::default();
        let err = ProtobufCodec
            .decode(&wire.encode_to_vec(), &mut entry)
            .unwrap_err();
        assert_eq!(err, CodecError::UnknownLevel("catastrophic".to_string()));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let mut entry = LogEntry::default();
        let err = ProtobufCodec
            .decode(&[0xff, 0xff, 0xff], &mut entry)
            .unwrap_err();
        assert!(matches!(err, CodecError::MalformedPayload(_)));
    }

    #[test]
    fn test_non_text_field_fails_encode() {
        let entry = sample().with_field("raw", vec![0xde_u8, 0xad]);
        assert!(matches!(
            ProtobufCodec.encode(&entry),
            Err(CodecError::UnsupportedFieldType { .. })
        ));
    }

    #[test]
    fn test_type_erased_entry_points() {
        let source = sample();
        let bytes = marshal(&source).unwrap();

        let mut decoded = LogEntry::default();
        unmarshal(&bytes, &mut decoded).unwrap();
        assert_eq!(decoded.field("flavour"), Some(&FieldValue::from("pistachio")));

        assert_eq!(marshal(&"not an entry").unwrap_err(), CodecError::WrongInputType);
        let mut wrong = String::new();
        assert_eq!(
            unmarshal(&bytes, &mut wrong).unwrap_err(),
            CodecError::WrongOutputType
        );
    }
}
