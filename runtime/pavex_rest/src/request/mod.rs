//! The request data consumed by the argument binder.
//!
//! [`ActionRequest`] carries the three inputs that body binding needs from the host framework:
//! the declared content type, the raw body and the parameters that were already extracted
//! from the route or the query string.
use bytes::Bytes;
use http::HeaderMap;
use indexmap::IndexMap;

pub use limit::BodySizeLimit;

use crate::serialization::Value;

pub mod errors;
mod limit;

#[derive(Debug, Clone, Default)]
/// The parts of an incoming request that are relevant to argument binding.
///
/// # Example
///
/// ```rust
/// use pavex_rest::request::ActionRequest;
/// use serde_json::json;
///
/// let request = ActionRequest::new("update")
///     .content_type("application/json")
///     .body(r#"{"name": "pavex"}"#)
///     .param("id", json!(42));
///
/// assert_eq!(request.action(), "update");
/// assert_eq!(request.declared_content_type(), Some("application/json"));
/// ```
pub struct ActionRequest {
    action: String,
    content_type: Option<String>,
    body: Bytes,
    params: IndexMap<String, Value>,
}

impl ActionRequest {
    /// A request targeting `action`, with no body, no content type and no parameters.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    /// Build an [`ActionRequest`] from the head of an `http` request and its buffered body.
    ///
    /// The `Content-Type` header is used verbatim: it's not parsed nor normalized.
    /// A header value that isn't valid UTF-8 is treated as missing.
    pub fn from_parts(
        parts: &http::request::Parts,
        body: impl Into<Bytes>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            content_type: content_type(&parts.headers).map(ToOwned::to_owned),
            body: body.into(),
            params: IndexMap::new(),
        }
    }

    /// Set the declared content type of the body.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a parameter that was already extracted from the request,
    /// e.g. from the route or the query string.
    pub fn param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Replace all the parameters that were already extracted from the request.
    pub fn params(mut self, params: IndexMap<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// The name of the targeted action.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The declared content type of the body, if any.
    pub fn declared_content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The raw body.
    pub fn raw_body(&self) -> &Bytes {
        &self.body
    }

    /// The parameters that were already extracted from the request.
    pub fn request_params(&self) -> &IndexMap<String, Value> {
        &self.params
    }
}

/// The value of the `Content-Type` header, if it's present and valid UTF-8.
pub fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}
