use super::errors::{DecodeError, EncodeError};
use super::{APPLICATION_JSON, FormatCodec, Value};

#[doc(alias = "Json")]
#[derive(Debug, Default, Clone, Copy)]
/// Encode and decode `application/json` documents, using `serde_json`.
///
/// Object keys are emitted in insertion order.
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new [`JsonCodec`].
    pub fn new() -> Self {
        Self
    }
}

impl FormatCodec for JsonCodec {
    fn mime_type(&self) -> &str {
        APPLICATION_JSON
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(value).map_err(|e| EncodeError::new(APPLICATION_JSON, e))
    }

    fn decode(&self, raw: &[u8]) -> Result<Value, DecodeError> {
        serde_json::from_slice(raw).map_err(|e| DecodeError::new(APPLICATION_JSON, e))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn round_trip() {
        let value = json!({
            "name": "John Doe",
            "age": 43,
            "ratio": 0.5,
            "active": true,
            "spouse": null,
            "phones": ["+44 1234567", "+44 2345678"],
            "address": { "street": "10 Downing Street", "city": "London" }
        });
        let codec = JsonCodec::new();

        let encoded = codec.encode(&value).unwrap();
        let decoded = codec.decode(&encoded).unwrap();

        assert_eq!(decoded, value);
    }

    #[test]
    fn key_order_is_preserved() {
        let codec = JsonCodec::new();
        let decoded = codec.decode(br#"{"zeta": 1, "alpha": 2, "mu": 3}"#).unwrap();

        let keys: Vec<_> = decoded.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["zeta", "alpha", "mu"]);
        assert_eq!(
            codec.encode(&decoded).unwrap(),
            br#"{"zeta":1,"alpha":2,"mu":3}"#
        );
    }

    #[test]
    fn malformed_document() {
        let err = JsonCodec::new().decode(br#"{"x": 1"#).unwrap_err();
        insta::assert_snapshot!(err, @r###"
        Failed to deserialize the body as a `application/json` document.
        EOF while parsing an object at line 1 column 7
        "###);
    }

    #[test]
    fn empty_body_is_malformed() {
        let err = JsonCodec::new().decode(b"").unwrap_err();
        assert_eq!(err.mime_type, "application/json");
    }
}
