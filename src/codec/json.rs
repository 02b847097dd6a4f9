use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{CodecError, apply_decoded, text_fields, timestamp_text};
use crate::domain::LogEntry;
use crate::port::{Decoder, Encoder};

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonEntry {
    #[serde(default)]
    fields: HashMap<String, String>,
    #[serde(default)]
    level: String,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    message: String,
}

/// JSON wire format, one object per message.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Encoder for JsonCodec {
    fn encode(&self, entry: &LogEntry) -> Result<Vec<u8>, CodecError> {
        let wire = JsonEntry {
            fields: text_fields(entry)?,
            level: entry.level.as_str().to_string(),
            timestamp: timestamp_text(&entry.timestamp),
            message: entry.message.clone(),
        };
        serde_json::to_vec(&wire).map_err(|e| CodecError::MalformedPayload(e.to_string()))
    }
}

impl Decoder for JsonCodec {
    fn decode(&self, data: &[u8], entry: &mut LogEntry) -> Result<(), CodecError> {
        let wire: JsonEntry =
            serde_json::from_slice(data).map_err(|e| CodecError::MalformedPayload(e.to_string()))?;
        apply_decoded(entry, &wire.level, &wire.timestamp, wire.message, wire.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldValue, Level};

    #[test]
    fn test_round_trip() {
        let source = LogEntry::new(Level::Error, "Oh dear!").with_field("error", "Test Error");
        let bytes = JsonCodec.encode(&source).unwrap();

        let mut decoded = LogEntry::default();
        JsonCodec.decode(&bytes, &mut decoded).unwrap();
        assert_eq!(decoded, source);
    }

    #[test]
    fn test_missing_keys_are_zero_values() {
        let mut entry = LogEntry::default();
        JsonCodec.decode(br#"{"message":"only"}"#, &mut entry).unwrap();
        assert_eq!(entry.message, "only");
        assert_eq!(entry.level, Level::Debug);
    }

    #[test]
    fn test_encoded_shape() {
        let entry = LogEntry::new(Level::Info, "Hello").with_field("user", "tealeg");
        let value: serde_json::Value =
            serde_json::from_slice(&JsonCodec.encode(&entry).unwrap()).unwrap();
        assert_eq!(value["level"], "info");
        assert_eq!(value["message"], "Hello");
        assert_eq!(value["fields"]["user"], "tealeg");
    }

    #[test]
    fn test_not_json_is_malformed() {
        let mut entry = LogEntry::default().with_field("keep", "me");
        assert!(matches!(
            JsonCodec.decode(b"<xml/>", &mut entry),
            Err(CodecError::MalformedPayload(_))
        ));
        assert_eq!(entry.field("keep"), Some(&FieldValue::from("me")));
    }
}
