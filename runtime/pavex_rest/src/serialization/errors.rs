//! Errors that can occur while selecting a codec or running it.
use http::StatusCode;

/// The boxed error type that codecs use to report what went wrong.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// No codec is registered for the content type of the incoming request.
///
/// The body is never parsed with a fallback grammar: if we don't know the format,
/// we refuse to guess.
pub enum UnsupportedFormatError {
    #[error(
        "The `Content-Type` header is missing. This endpoint expects requests with a `Content-Type` header set to one of the supported media types"
    )]
    /// The request didn't declare a content type.
    MissingContentType,
    #[error(
        "The `Content-Type` header was set to `{actual}`. There is no serializer registered for this media type"
    )]
    /// The request declared a content type that has no registered codec.
    UnknownContentType {
        /// The value of the `Content-Type` header for this request.
        actual: String,
    },
}

impl UnsupportedFormatError {
    /// The status code that best describes this error: `415 Unsupported Media Type`.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to deserialize the body as a `{mime_type}` document.\n{source}")]
#[non_exhaustive]
/// The request body is not a valid document for the format we resolved.
pub struct DecodeError {
    /// The media type of the codec that rejected the body.
    pub mime_type: String,
    #[source]
    source: BoxError,
}

impl DecodeError {
    /// Wrap the error returned by the underlying parser.
    pub fn new<E>(mime_type: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self {
            mime_type: mime_type.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to serialize the value as a `{mime_type}` document.\n{source}")]
#[non_exhaustive]
/// The value can't be represented in the target format.
pub struct EncodeError {
    /// The media type of the codec that rejected the value.
    pub mime_type: String,
    #[source]
    source: BoxError,
}

impl EncodeError {
    /// Wrap the error returned by the underlying emitter.
    pub fn new<E>(mime_type: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self {
            mime_type: mime_type.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned by [`SerializerRegistry::decode`].
///
/// [`SerializerRegistry::decode`]: crate::serialization::SerializerRegistry::decode
pub enum DecodeBodyError {
    #[error(transparent)]
    /// See [`UnsupportedFormatError`] for details.
    UnsupportedFormat(#[from] UnsupportedFormatError),
    #[error(transparent)]
    /// See [`DecodeError`] for details.
    Decode(#[from] DecodeError),
}

impl DecodeBodyError {
    /// `415 Unsupported Media Type` if we couldn't pick a codec,
    /// `400 Bad Request` if the body itself is malformed.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DecodeBodyError::UnsupportedFormat(e) => e.status_code(),
            DecodeBodyError::Decode(_) => StatusCode::BAD_REQUEST,
        }
    }
}
