use super::errors::{DecodeError, EncodeError};
use super::{APPLICATION_MSGPACK, FormatCodec, Value};

#[doc(alias = "MessagePack")]
#[derive(Debug, Default, Clone, Copy)]
/// Encode and decode `application/x-msgpack` payloads, using `rmp-serde`.
///
/// Mappings are always written as MessagePack maps, with their keys, rather than
/// as positional arrays: that's the representation other MessagePack implementations expect.
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Create a new [`MsgPackCodec`].
    pub fn new() -> Self {
        Self
    }
}

impl FormatCodec for MsgPackCodec {
    fn mime_type(&self) -> &str {
        APPLICATION_MSGPACK
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        rmp_serde::to_vec_named(value).map_err(|e| EncodeError::new(APPLICATION_MSGPACK, e))
    }

    fn decode(&self, raw: &[u8]) -> Result<Value, DecodeError> {
        rmp_serde::from_slice(raw).map_err(|e| DecodeError::new(APPLICATION_MSGPACK, e))
    }
}
