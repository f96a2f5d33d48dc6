use std::sync::Arc;

use indexmap::IndexMap;

use super::errors::{DecodeBodyError, UnsupportedFormatError};
use super::{FormatCodec, JsonCodec, MsgPackCodec, Value, YamlCodec, YamlCodecConfig};
use crate::config::RestConfig;

#[doc(alias = "AutoSerializer")]
#[derive(Debug, Clone)]
/// Pick the right [`FormatCodec`] for a media type.
///
/// The registry is an ordered table from media types to codecs.
/// Every codec is registered under the media type it reports via [`FormatCodec::mime_type`],
/// so the table can't get out of sync with the codecs it contains.
///
/// # Lookup rules
///
/// Lookups match the declared content type **exactly**: no case folding, no
/// parameter stripping. A request with `Content-Type: application/json; charset=utf-8`
/// won't match the `application/json` entry unless a codec is registered for that exact string.
///
/// Unknown or missing content types are rejected with an [`UnsupportedFormatError`].
/// The registry never falls back to a default format.
///
/// # Example
///
/// ```rust
/// use pavex_rest::serialization::SerializerRegistry;
///
/// let registry = SerializerRegistry::default();
/// let body = registry
///     .decode(Some("application/yaml"), b"name: pavex\n")
///     .unwrap();
/// assert_eq!(body["name"], "pavex");
///
/// assert!(registry.resolve(Some("text/plain")).is_err());
/// ```
pub struct SerializerRegistry {
    codecs: IndexMap<String, Arc<dyn FormatCodec>>,
}

impl Default for SerializerRegistry {
    /// A registry with the built-in codecs for JSON, YAML and MessagePack.
    fn default() -> Self {
        Self::with_yaml_config(YamlCodecConfig::default())
    }
}

impl SerializerRegistry {
    /// An empty registry, with no codecs.
    ///
    /// Use [`SerializerRegistry::default`] to get the built-in codecs.
    pub fn new() -> Self {
        Self {
            codecs: IndexMap::new(),
        }
    }

    /// A registry with the built-in codecs, configured according to `config`.
    pub fn from_config(config: &RestConfig) -> Self {
        Self::with_yaml_config(config.yaml)
    }

    fn with_yaml_config(yaml: YamlCodecConfig) -> Self {
        let mut registry = Self::new();
        registry
            .register(JsonCodec::new())
            .register(YamlCodec::new(yaml))
            .register(MsgPackCodec::new());
        registry
    }

    /// Register a codec for the media type it declares.
    ///
    /// If a codec was already registered for the same media type, it's replaced.
    pub fn register<C>(&mut self, codec: C) -> &mut Self
    where
        C: FormatCodec + 'static,
    {
        self.register_shared(Arc::new(codec))
    }

    /// Register a codec that's already behind an [`Arc`].
    ///
    /// If a codec was already registered for the same media type, it's replaced.
    pub fn register_shared(&mut self, codec: Arc<dyn FormatCodec>) -> &mut Self {
        let mime_type = codec.mime_type().to_owned();
        if self.codecs.insert(mime_type.clone(), codec).is_some() {
            tracing::debug!(mime_type = %mime_type, "Replaced the codec registered for this media type");
        }
        self
    }

    /// Remove the codec registered for `mime_type`, if any.
    pub fn remove(&mut self, mime_type: &str) -> Option<Arc<dyn FormatCodec>> {
        self.codecs.shift_remove(mime_type)
    }

    /// Returns `true` if a codec is registered for exactly this media type.
    pub fn supports(&self, mime_type: &str) -> bool {
        self.codecs.contains_key(mime_type)
    }

    /// The media types with a registered codec, in registration order.
    pub fn mime_types(&self) -> impl ExactSizeIterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }

    /// Find the codec for the declared content type of a request.
    ///
    /// It fails if `content_type` is `None` or if there is no codec registered for it.
    pub fn resolve(
        &self,
        content_type: Option<&str>,
    ) -> Result<Arc<dyn FormatCodec>, UnsupportedFormatError> {
        let Some(content_type) = content_type else {
            return Err(UnsupportedFormatError::MissingContentType);
        };
        let Some(codec) = self.codecs.get(content_type) else {
            return Err(UnsupportedFormatError::UnknownContentType {
                actual: content_type.to_owned(),
            });
        };
        tracing::debug!(mime_type = %content_type, codec = ?codec, "Resolved codec");
        Ok(Arc::clone(codec))
    }

    /// Resolve the codec for `content_type` and use it to decode `raw`.
    pub fn decode(&self, content_type: Option<&str>, raw: &[u8]) -> Result<Value, DecodeBodyError> {
        let codec = self.resolve(content_type)?;
        Ok(codec.decode(raw)?)
    }
}
