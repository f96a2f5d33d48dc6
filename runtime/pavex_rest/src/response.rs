//! Render values as HTTP responses.
//!
//! [`render`] is the outgoing counterpart of body binding: it encodes a [`Value`] with the codec
//! registered for the negotiated media type and wraps the result in an [`http::Response`].
use bytes::Bytes;
use http::{HeaderValue, StatusCode};

use crate::serialization::errors::EncodeError;
use crate::serialization::{SerializerRegistry, Value};

/// Encode `value` as a `media_type` document and use it as the body of a `200 OK` response.
///
/// The `Content-Type` header is set to `media_type`.
///
/// # Example
///
/// ```rust
/// use pavex_rest::negotiation::SupportedMediaTypes;
/// use pavex_rest::response::render;
/// use pavex_rest::serialization::SerializerRegistry;
/// use serde_json::json;
///
/// let registry = SerializerRegistry::default();
/// let supported = SupportedMediaTypes::default();
/// let media_type = supported
///     .negotiate_renderable(Some("application/yaml"), &registry)
///     .unwrap();
///
/// let response = render(&registry, media_type, &json!({ "name": "pavex" })).unwrap();
/// assert_eq!(response.headers()["content-type"], "application/yaml");
/// assert_eq!(response.body().as_ref(), b"name: pavex\n");
/// ```
pub fn render(
    registry: &SerializerRegistry,
    media_type: &str,
    value: &Value,
) -> Result<http::Response<Bytes>, RenderError> {
    let codec = registry
        .resolve(Some(media_type))
        .map_err(|_| UnrenderableMediaType {
            media_type: media_type.to_owned(),
        })?;
    let body = codec.encode(value)?;
    let content_type = HeaderValue::from_str(media_type).map_err(|e| RenderError::Http(e.into()))?;
    let response = http::Response::builder()
        .status(StatusCode::OK)
        .header(http::header::CONTENT_TYPE, content_type)
        .body(Bytes::from(body))?;
    Ok(response)
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned by [`render`].
pub enum RenderError {
    #[error(transparent)]
    /// See [`UnrenderableMediaType`] for details.
    UnrenderableMediaType(#[from] UnrenderableMediaType),
    #[error(transparent)]
    /// See [`EncodeError`] for details.
    Encode(#[from] EncodeError),
    #[error("Failed to assemble the response")]
    /// The response couldn't be assembled, e.g. because the media type isn't a valid header value.
    Http(#[from] http::Error),
}

impl RenderError {
    /// The status code that best describes this error.
    ///
    /// A missing codec is a `406 Not Acceptable`: the client asked for a format we can't produce.
    /// Everything else is a `500 Internal Server Error`.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RenderError::UnrenderableMediaType(_) => StatusCode::NOT_ACCEPTABLE,
            RenderError::Encode(_) | RenderError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error(
    "There is no serializer registered for `{media_type}`, the format negotiated for the response"
)]
#[non_exhaustive]
/// The negotiated media type has no registered codec.
///
/// Use [`SupportedMediaTypes::negotiate_renderable`] to only negotiate media types
/// that can be rendered.
///
/// [`SupportedMediaTypes::negotiate_renderable`]: crate::negotiation::SupportedMediaTypes::negotiate_renderable
pub struct UnrenderableMediaType {
    /// The media type that couldn't be rendered.
    pub media_type: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_response() {
        let registry = SerializerRegistry::default();
        let response = render(&registry, "application/json", &json!({ "id": 1 })).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            "application/json"
        );
        insta::assert_snapshot!(String::from_utf8_lossy(response.body()), @r#"{"id":1}"#);
    }

    #[test]
    fn msgpack_response() {
        let registry = SerializerRegistry::default();
        let response = render(&registry, "application/x-msgpack", &json!(null)).unwrap();
        assert_eq!(response.body().as_ref(), [0xc0]);
    }

    #[test]
    fn media_types_without_a_codec_are_not_acceptable() {
        let registry = SerializerRegistry::default();
        let err = render(&registry, "application/xml", &json!({})).unwrap_err();

        assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
        insta::assert_snapshot!(err, @"There is no serializer registered for `application/xml`, the format negotiated for the response");
    }
}
