//! Encode and decode request and response bodies.
//!
//! # Overview
//!
//! Every wire format is handled by a [`FormatCodec`]: a stateless, shareable object
//! that converts between bytes and a [`Value`] for exactly one media type.
//! The built-in codecs are:
//!
//! - [`JsonCodec`], for `application/json`
//! - [`YamlCodec`], for `application/yaml`
//! - [`MsgPackCodec`], for `application/x-msgpack`
//!
//! All codecs decode into the same value model, so the code that consumes a decoded body
//! doesn't need to care about the format it was sent in.
//!
//! [`SerializerRegistry`] maps media types to codecs. It picks the codec for an incoming
//! request based on its declared `Content-Type` and refuses to decode bodies
//! whose format it doesn't know.
pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;
pub use registry::SerializerRegistry;
pub use yaml::{YamlCodec, YamlCodecConfig};

/// The structured representation shared by all codecs.
///
/// Mappings preserve the order of their keys.
pub use serde_json::Value;

/// A string-keyed mapping of [`Value`]s.
pub type Map = serde_json::Map<String, Value>;

pub mod errors;
mod json;
mod msgpack;
mod registry;
mod yaml;

/// The media type of JSON documents.
pub const APPLICATION_JSON: &str = "application/json";
/// The media type of YAML documents.
pub const APPLICATION_YAML: &str = "application/yaml";
/// The media type of MessagePack payloads.
pub const APPLICATION_MSGPACK: &str = "application/x-msgpack";
/// The media type of XML documents.
///
/// It's advertised for content negotiation, but there is no built-in codec for it.
pub const APPLICATION_XML: &str = "application/xml";

/// Serialize and deserialize [`Value`]s for a single media type.
///
/// Implementations must be immutable once constructed: a single instance is shared
/// across all concurrent requests.
pub trait FormatCodec: std::fmt::Debug + Send + Sync {
    /// The media type handled by this codec, e.g. `application/json`.
    ///
    /// It must not change over the lifetime of the codec.
    fn mime_type(&self) -> &str;

    /// Serialize `value` into a document of this format.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, errors::EncodeError>;

    /// Parse `raw` as a document of this format.
    fn decode(&self, raw: &[u8]) -> Result<Value, errors::DecodeError>;
}
