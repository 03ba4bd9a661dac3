//! Request ID filter
//!
//! Assigns every request an identifier, stores it in the request extensions
//! and echoes it back in the `x-request-id` response header.

use super::stack::{ActionFilter, BoxFuture, Next};
use crate::request::Request;
use crate::response::Response;
use http::HeaderValue;

/// Header carrying the request identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier assigned to a request by [`RequestIdFilter`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new random identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filter that tags each request with a [`RequestId`]
///
/// An incoming `x-request-id` header is reused when present and non-empty.
#[derive(Clone, Default)]
pub struct RequestIdFilter;

impl RequestIdFilter {
    /// Create the filter
    pub fn new() -> Self {
        Self
    }
}

impl ActionFilter for RequestIdFilter {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture<Response> {
        let id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .map(|v| RequestId(v.to_string()))
            .unwrap_or_default();

        req.extensions_mut().insert(id.clone());

        Box::pin(async move {
            let mut response = next(req).await;
            if let Ok(value) = HeaderValue::from_str(id.as_str()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        })
    }

    fn clone_box(&self) -> Box<dyn ActionFilter> {
        Box::new(self.clone())
    }
}
