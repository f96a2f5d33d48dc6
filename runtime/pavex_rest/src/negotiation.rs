//! Pick the representation of a response.
//!
//! [`SupportedMediaTypes`] lists the media types your API can produce, in order of preference,
//! and negotiates the best one for an incoming request based on its `Accept` header.
//! [`ViewFormat`] maps the short format names used in URLs (`json`, `yaml`, `msgpack`)
//! to the corresponding media types.
use std::str::FromStr;

use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::serialization::{
    APPLICATION_JSON, APPLICATION_MSGPACK, APPLICATION_XML, APPLICATION_YAML, SerializerRegistry,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
/// The media types advertised for content negotiation, in order of preference.
///
/// By default:
///
/// 1. `application/json`
/// 2. `application/xml`
/// 3. `application/yaml`
/// 4. `application/x-msgpack`
///
/// Advertising a media type doesn't guarantee that a codec is registered for it:
/// there is no built-in XML codec, for example.
pub struct SupportedMediaTypes(Vec<String>);

impl Default for SupportedMediaTypes {
    fn default() -> Self {
        Self(
            [
                APPLICATION_JSON,
                APPLICATION_XML,
                APPLICATION_YAML,
                APPLICATION_MSGPACK,
            ]
            .into_iter()
            .map(ToOwned::to_owned)
            .collect(),
        )
    }
}

impl<S> FromIterator<S> for SupportedMediaTypes
where
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl SupportedMediaTypes {
    /// Iterate over the supported media types, in order of preference.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns `true` if `media_type` is one of the supported media types.
    pub fn contains(&self, media_type: &str) -> bool {
        self.0.iter().any(|m| m == media_type)
    }

    /// Pick the supported media type that best satisfies the `Accept` header of a request.
    ///
    /// The rules:
    ///
    /// - If `accept` is missing or empty, the most preferred media type is returned.
    /// - Each supported media type is weighted using the most specific range that matches it
    ///   (`application/json` beats `application/*`, which beats `*/*`).
    ///   Ranges without a `q` parameter have a weight of 1.
    /// - Media types with a weight of 0 are never returned.
    /// - The media type with the highest weight wins. Ties go to the range that appears first
    ///   in the `Accept` header, then to the most preferred media type.
    /// - Ranges that can't be parsed are ignored.
    ///
    /// It returns `None` if none of the supported media types is acceptable.
    /// You'd usually answer with a `406 Not Acceptable` in that case.
    ///
    /// The outcome may be a media type that has no registered codec
    /// (e.g. `application/xml` with the default settings): rendering the response would fail,
    /// even if the client accepts other formats too.
    /// Use [`SupportedMediaTypes::negotiate_renderable`] to skip those media types.
    ///
    /// ```rust
    /// use pavex_rest::negotiation::SupportedMediaTypes;
    ///
    /// let supported = SupportedMediaTypes::default();
    /// assert_eq!(supported.negotiate(None), Some("application/json"));
    /// assert_eq!(
    ///     supported.negotiate(Some("application/yaml, application/json;q=0.5")),
    ///     Some("application/yaml")
    /// );
    /// assert_eq!(supported.negotiate(Some("text/html")), None);
    /// ```
    pub fn negotiate(&self, accept: Option<&str>) -> Option<&str> {
        self.negotiate_among(accept, |_| true)
    }

    /// Same as [`SupportedMediaTypes::negotiate`], but media types without a codec in `registry`
    /// are never returned.
    ///
    /// ```rust
    /// use pavex_rest::negotiation::SupportedMediaTypes;
    /// use pavex_rest::serialization::SerializerRegistry;
    ///
    /// let supported = SupportedMediaTypes::default();
    /// let registry = SerializerRegistry::default();
    /// let accept = Some("application/xml, application/yaml;q=0.5");
    ///
    /// assert_eq!(supported.negotiate(accept), Some("application/xml"));
    /// assert_eq!(
    ///     supported.negotiate_renderable(accept, &registry),
    ///     Some("application/yaml")
    /// );
    /// ```
    pub fn negotiate_renderable(
        &self,
        accept: Option<&str>,
        registry: &SerializerRegistry,
    ) -> Option<&str> {
        self.negotiate_among(accept, |media_type| registry.supports(media_type))
    }

    fn negotiate_among<F>(&self, accept: Option<&str>, is_eligible: F) -> Option<&str>
    where
        F: Fn(&str) -> bool,
    {
        let mut eligible = self
            .0
            .iter()
            .enumerate()
            .filter(|(_, media_type)| is_eligible(media_type.as_str()));
        let accept = accept.map(str::trim).unwrap_or_default();
        if accept.is_empty() {
            return eligible.next().map(|(_, media_type)| media_type.as_str());
        }
        let ranges: Vec<MediaRange> = accept.split(',').filter_map(MediaRange::parse).collect();

        let mut best: Option<Candidate<'_>> = None;
        for (preference, supported) in eligible {
            let Ok(mime) = supported.parse::<mime::Mime>() else {
                continue;
            };
            let Some((position, range)) = ranges
                .iter()
                .enumerate()
                .filter(|(_, range)| range.specificity(&mime).is_some())
                .max_by(|(i, a), (j, b)| {
                    // On equal specificity, the earliest range wins.
                    a.specificity(&mime).cmp(&b.specificity(&mime)).then(j.cmp(i))
                })
            else {
                continue;
            };
            if range.quality <= 0.0 {
                continue;
            }
            let candidate = Candidate {
                media_type: supported,
                quality: range.quality,
                position,
                preference,
            };
            if best.as_ref().is_none_or(|best| candidate.beats(best)) {
                best = Some(candidate);
            }
        }
        best.map(|c| c.media_type.as_str())
    }

    /// Negotiate using the `Accept` header in `headers`.
    ///
    /// A header that isn't valid UTF-8 is treated as missing.
    pub fn negotiate_headers(&self, headers: &HeaderMap) -> Option<&str> {
        let accept = headers
            .get(http::header::ACCEPT)
            .and_then(|value| value.to_str().ok());
        self.negotiate(accept)
    }
}

struct MediaRange {
    mime: mime::Mime,
    quality: f32,
}

impl MediaRange {
    fn parse(raw: &str) -> Option<Self> {
        let mime = raw.trim().parse::<mime::Mime>().ok()?;
        let quality = match mime.get_param("q") {
            Some(q) => q.as_str().parse::<f32>().ok()?.clamp(0.0, 1.0),
            None => 1.0,
        };
        Some(Self { mime, quality })
    }

    /// How closely this range matches `candidate`, if it matches at all.
    fn specificity(&self, candidate: &mime::Mime) -> Option<u8> {
        if self.mime.type_() == mime::STAR && self.mime.subtype() == mime::STAR {
            Some(0)
        } else if self.mime.type_() == candidate.type_() && self.mime.subtype() == mime::STAR {
            Some(1)
        } else if self.mime.essence_str() == candidate.essence_str() {
            Some(2)
        } else {
            None
        }
    }
}

struct Candidate<'a> {
    media_type: &'a String,
    quality: f32,
    position: usize,
    preference: usize,
}

impl Candidate<'_> {
    fn beats(&self, other: &Candidate<'_>) -> bool {
        if self.quality != other.quality {
            return self.quality > other.quality;
        }
        (self.position, self.preference) < (other.position, other.preference)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// The short names of the formats with a built-in codec.
///
/// They are typically used as a format suffix in URLs (e.g. `/users/1.yaml`),
/// as an alternative to the `Accept` header.
pub enum ViewFormat {
    /// `json`, i.e. `application/json`.
    Json,
    /// `yaml`, i.e. `application/yaml`.
    Yaml,
    /// `msgpack`, i.e. `application/x-msgpack`.
    MsgPack,
}

impl ViewFormat {
    /// The short name of this format.
    pub fn name(&self) -> &'static str {
        match self {
            ViewFormat::Json => "json",
            ViewFormat::Yaml => "yaml",
            ViewFormat::MsgPack => "msgpack",
        }
    }

    /// The media type of this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ViewFormat::Json => APPLICATION_JSON,
            ViewFormat::Yaml => APPLICATION_YAML,
            ViewFormat::MsgPack => APPLICATION_MSGPACK,
        }
    }

    /// The format for a media type, if it has a short name.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type {
            APPLICATION_JSON => Some(ViewFormat::Json),
            APPLICATION_YAML => Some(ViewFormat::Yaml),
            APPLICATION_MSGPACK => Some(ViewFormat::MsgPack),
            _ => None,
        }
    }
}

impl std::fmt::Display for ViewFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewFormat {
    type Err = errors::UnknownViewFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ViewFormat::Json),
            "yaml" => Ok(ViewFormat::Yaml),
            "msgpack" => Ok(ViewFormat::MsgPack),
            _ => Err(errors::UnknownViewFormat {
                actual: s.to_owned(),
            }),
        }
    }
}

/// Errors that can occur during content negotiation.
pub mod errors {
    #[derive(Debug, thiserror::Error)]
    #[error("`{actual}` is not a known format. Expected one of `json`, `yaml` or `msgpack`")]
    #[non_exhaustive]
    /// The error returned when parsing a [`ViewFormat`](super::ViewFormat) from an unknown name.
    pub struct UnknownViewFormat {
        /// The name that couldn't be parsed.
        pub actual: String,
    }
}
