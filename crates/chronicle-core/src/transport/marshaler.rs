//! Byte encodings for transport values.

use std::fmt;

use serde_json::Value;

use crate::error::DomainError;
use crate::stream::StreamId;

/// Turns a transport value into bytes and back.
///
/// Implementations must be deterministic and round-trip every value they
/// produce.
pub trait Marshaler: Send + Sync + fmt::Debug {
    /// Encodes `value` for storage in `stream_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` if the value cannot be encoded.
    fn marshal(&self, stream_id: &StreamId, value: &Value) -> Result<Vec<u8>, DomainError>;

    /// Decodes bytes stored in `stream_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` if the bytes are malformed.
    fn unmarshal(&self, stream_id: &StreamId, bytes: &[u8]) -> Result<Value, DomainError>;
}

/// JSON encoding; the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarshaler;

impl Marshaler for JsonMarshaler {
    fn marshal(&self, _stream_id: &StreamId, value: &Value) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec(value)
            .map_err(|e| DomainError::Serialization(format!("json encoding failed: {e}")))
    }

    fn unmarshal(&self, _stream_id: &StreamId, bytes: &[u8]) -> Result<Value, DomainError> {
        serde_json::from_slice(bytes)
            .map_err(|e| DomainError::Serialization(format!("json decoding failed: {e}")))
    }
}

/// YAML encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlMarshaler;

impl Marshaler for YamlMarshaler {
    fn marshal(&self, _stream_id: &StreamId, value: &Value) -> Result<Vec<u8>, DomainError> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| DomainError::Serialization(format!("yaml encoding failed: {e}")))
    }

    fn unmarshal(&self, _stream_id: &StreamId, bytes: &[u8]) -> Result<Value, DomainError> {
        serde_yaml::from_slice(bytes)
            .map_err(|e| DomainError::Serialization(format!("yaml decoding failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn stream_id() -> StreamId {
        StreamId::new("s-1").unwrap()
    }

    #[test]
    fn test_json_marshaler_round_trips_nested_value() {
        let value = json!({"sender": {"name": "Alice", "line1": "Foo Street 123"}, "sent": true});

        let bytes = JsonMarshaler.marshal(&stream_id(), &value).unwrap();
        let decoded = JsonMarshaler.unmarshal(&stream_id(), &bytes).unwrap();

        assert_eq!(decoded, value);
    }

    #[test]
    fn test_yaml_marshaler_produces_yaml_text() {
        let value = json!({"value": 10});

        let bytes = YamlMarshaler.marshal(&stream_id(), &value).unwrap();

        assert_eq!(String::from_utf8(bytes.clone()).unwrap().trim(), "value: 10");
        assert_eq!(YamlMarshaler.unmarshal(&stream_id(), &bytes).unwrap(), value);
    }

    #[test]
    fn test_json_marshaler_rejects_garbage() {
        let result = JsonMarshaler.unmarshal(&stream_id(), b"{not json");

        assert!(matches!(result, Err(DomainError::Serialization(_))));
    }
}
