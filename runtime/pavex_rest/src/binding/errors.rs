//! Errors that can occur while binding a request to the arguments of an action.
use bytes::Bytes;
use http::{HeaderValue, StatusCode};

use crate::request::errors::SizeLimitExceeded;
use crate::serialization::errors::{DecodeBodyError, DecodeError, UnsupportedFormatError};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned when the arguments of an action can't be bound.
///
/// When binding fails, the pass stops at the first failure.
/// Arguments that were bound before the failure keep their values, but the argument list
/// as a whole must be considered unusable.
pub enum BindError {
    #[error(transparent)]
    /// See [`UnsupportedFormatError`] for details.
    UnsupportedFormat(#[from] UnsupportedFormatError),
    #[error(transparent)]
    /// See [`DecodeError`] for details.
    Decode(#[from] DecodeError),
    #[error(transparent)]
    /// See [`SizeLimitExceeded`] for details.
    SizeLimitExceeded(#[from] SizeLimitExceeded),
    #[error(transparent)]
    /// See [`RequiredArgumentMissing`] for details.
    RequiredArgumentMissing(#[from] RequiredArgumentMissing),
    #[error(transparent)]
    /// See [`PropertyNotAllowed`] for details.
    PropertyNotAllowed(#[from] PropertyNotAllowed),
}

impl From<DecodeBodyError> for BindError {
    fn from(e: DecodeBodyError) -> Self {
        match e {
            DecodeBodyError::UnsupportedFormat(e) => Self::UnsupportedFormat(e),
            DecodeBodyError::Decode(e) => Self::Decode(e),
        }
    }
}

impl BindError {
    /// The status code that best describes this error.
    ///
    /// - `415 Unsupported Media Type` if there is no codec for the body;
    /// - `413 Payload Too Large` if the body is too large;
    /// - `400 Bad Request` otherwise.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BindError::UnsupportedFormat(e) => e.status_code(),
            BindError::SizeLimitExceeded(_) => StatusCode::PAYLOAD_TOO_LARGE,
            BindError::Decode(_)
            | BindError::RequiredArgumentMissing(_)
            | BindError::PropertyNotAllowed(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Convert a [`BindError`] into an HTTP response.
    ///
    /// The body is the error message, as plain text.
    pub fn into_response(&self) -> http::Response<Bytes> {
        let mut body = String::new();
        self.response_body(&mut body)
            .expect("Failed to write into a string buffer");
        let mut response = http::Response::new(Bytes::from(body));
        *response.status_mut() = self.status_code();
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }

    pub(crate) fn response_body<W: std::fmt::Write>(&self, writer: &mut W) -> std::fmt::Result {
        write!(writer, "{self}")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Required argument \"{argument}\" is not set.")]
#[non_exhaustive]
/// A required argument couldn't be populated, neither from the request parameters
/// nor from the request body.
pub struct RequiredArgumentMissing {
    /// The name of the missing argument.
    pub argument: String,
}

#[derive(Debug, thiserror::Error)]
#[error("The property \"{property}\" is not allowed to be set on argument \"{argument}\".")]
#[non_exhaustive]
/// A decoded object carries a property that the target argument doesn't allow to be set.
pub struct PropertyNotAllowed {
    /// The name of the argument that rejected the value.
    pub argument: String,
    /// The first property that isn't allowed.
    pub property: String,
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to convert the value of argument \"{argument}\".\n{source}")]
#[non_exhaustive]
/// The value bound to an argument doesn't have the expected shape.
pub struct ArgumentConversionError {
    /// The name of the argument.
    pub argument: String,
    #[source]
    pub(crate) source: serde_path_to_error::Error<serde_json::Error>,
}

impl ArgumentConversionError {
    /// The path of the field that failed to convert, e.g. `address.zip_code`.
    pub fn path(&self) -> String {
        self.source.path().to_string()
    }
}
