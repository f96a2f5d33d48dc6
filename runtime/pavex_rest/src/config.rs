//! Configuration for content negotiation and body binding.
//!
//! [`RestConfig`] gathers every knob exposed by this crate.
//! It can be embedded in your application configuration, or loaded on its own with
//! [`RestConfig::load`].
use std::path::Path;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use ubyte::{ByteUnit, ToByteUnit};

use crate::negotiation::SupportedMediaTypes;
use crate::request::BodySizeLimit;
use crate::serialization::YamlCodecConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Configuration for content negotiation and body binding.
///
/// # Example
///
/// ```yaml
/// yaml:
///   inline_depth: 3
///   indentation: 4
/// supported_media_types:
///   - application/json
///   - application/yaml
/// max_body_size: 512 KiB
/// ```
pub struct RestConfig {
    /// Layout options for YAML documents.
    pub yaml: YamlCodecConfig,
    /// The media types advertised during content negotiation, in order of preference.
    pub supported_media_types: SupportedMediaTypes,
    /// The largest request body that will be decoded.
    ///
    /// Set it to `null` to disable the limit.
    /// Defaults to 2 MB.
    pub max_body_size: Option<ByteUnit>,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            yaml: YamlCodecConfig::default(),
            supported_media_types: SupportedMediaTypes::default(),
            max_body_size: Some(2.megabytes()),
        }
    }
}

impl RestConfig {
    /// The prefix of the environment variables that override configuration values.
    ///
    /// Nested fields are separated by a double underscore, e.g. `PX_REST_YAML__INLINE_DEPTH`.
    pub const ENV_PREFIX: &'static str = "PX_REST_";

    /// Load the configuration by merging together, in order of increasing precedence:
    ///
    /// 1. The defaults (see [`RestConfig::default`])
    /// 2. The YAML file at `path`, if it exists
    /// 3. Environment variables prefixed with [`RestConfig::ENV_PREFIX`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, errors::ConfigLoadError> {
        let path = path.as_ref();
        let span = tracing::info_span!(
            "Loading REST configuration",
            configuration.path = %path.display(),
        );
        let _guard = span.enter();
        let figment = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    /// Extract the configuration from a custom [`Figment`].
    ///
    /// Missing values are filled in with their defaults.
    pub fn from_figment(figment: Figment) -> Result<Self, errors::ConfigLoadError> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(figment)
            .extract()
            .context("Failed to load the REST configuration")
            .map_err(errors::ConfigLoadError)
    }

    /// The body size limit described by [`RestConfig::max_body_size`].
    pub fn body_size_limit(&self) -> BodySizeLimit {
        match self.max_body_size {
            Some(max_size) => BodySizeLimit::Enabled { max_size },
            None => BodySizeLimit::Disabled,
        }
    }
}

/// Errors that can occur when loading configuration.
pub mod errors {
    #[derive(Debug, thiserror::Error)]
    #[error("Failed to load configuration")]
    /// The error returned by [`RestConfig::load`](super::RestConfig::load).
    pub struct ConfigLoadError(#[source] pub(super) anyhow::Error);
}
