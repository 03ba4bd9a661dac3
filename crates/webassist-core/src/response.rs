//! Response types for webassist
//!
//! The core trait is [`IntoResponse`], which allows handlers and filters to
//! return anything that can be turned into an HTTP response.
//!
//! | Type | Status | Content-Type |
//! |------|--------|--------------|
//! | `String` / `&str` | 200 | text/plain |
//! | `()` | 200 | - |
//! | [`Json<T>`](crate::Json) | 200 | application/json |
//! | [`Redirect`] | 3xx | - |
//! | [`RedirectToRoute`] | 302 | - |
//! | [`ApiError`] | varies | application/json |

use crate::error::{get_environment, ApiError, ErrorResponse};
use crate::extract::Json;
use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::Full;
use serde::Serialize;

/// HTTP Response type
pub type Response = http::Response<Full<Bytes>>;

/// Trait for types that can be converted into an HTTP response
pub trait IntoResponse {
    /// Convert self into a Response
    fn into_response(self) -> Response;
}

fn with_body(status: StatusCode, content_type: Option<&'static str>, body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Response {
        with_body(StatusCode::OK, None, Bytes::new())
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        with_body(StatusCode::OK, Some("text/plain; charset=utf-8"), Bytes::from(self))
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        with_body(StatusCode::OK, Some("text/plain; charset=utf-8"), Bytes::from(self))
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        with_body(self, None, Bytes::new())
    }
}

impl<R: IntoResponse> IntoResponse for (StatusCode, R) {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        *response.status_mut() = self.0;
        response
    }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let error_response = ErrorResponse::from_error(self, get_environment());
        let body = serde_json::to_vec(&error_response).unwrap_or_else(|_| {
            br#"{"error":{"type":"internal_error","message":"Failed to serialize error"}}"#.to_vec()
        });

        with_body(status, Some("application/json"), Bytes::from(body))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => with_body(StatusCode::OK, Some("application/json"), Bytes::from(body)),
            Err(err) => ApiError::internal(format!("Failed to serialize response: {}", err))
                .into_response(),
        }
    }
}

/// Redirect response
#[derive(Debug, Clone)]
pub struct Redirect {
    status: StatusCode,
    location: String,
}

impl Redirect {
    /// Create a 302 Found redirect
    pub fn to(uri: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FOUND,
            location: uri.into(),
        }
    }

    /// Create a 301 Permanent redirect
    pub fn permanent(uri: impl Into<String>) -> Self {
        Self {
            status: StatusCode::MOVED_PERMANENTLY,
            location: uri.into(),
        }
    }

    /// Create a 307 Temporary redirect
    pub fn temporary(uri: impl Into<String>) -> Self {
        Self {
            status: StatusCode::TEMPORARY_REDIRECT,
            location: uri.into(),
        }
    }

    /// The redirect target
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        match HeaderValue::from_str(&self.location) {
            Ok(location) => {
                let mut response = with_body(self.status, None, Bytes::new());
                response.headers_mut().insert(header::LOCATION, location);
                response
            }
            Err(_) => ApiError::internal("Invalid redirect URI")
                .with_internal(self.location)
                .into_response(),
        }
    }
}

/// Ordered route values describing a redirect target
///
/// Conventional routing is used to turn values into a path:
///
/// - `page` → `/{page}`
/// - `area`, `controller`, `action` → `/{area}/{controller}/{action}`
///
/// Any other values are appended as a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteValues {
    values: Vec<(String, String)>,
}

const ROUTE_KEYS: [&str; 4] = ["page", "area", "controller", "action"];

impl RouteValues {
    /// Create empty route values
    pub fn new() -> Self {
        Self::default()
    }

    /// Route values for a controller action
    pub fn action(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new()
            .with("controller", controller)
            .with("action", action)
    }

    /// Route values for a page
    pub fn page(page: impl Into<String>) -> Self {
        Self::new().with("page", page)
    }

    /// Add or replace a value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace a value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.values.push((key, value)),
        }
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether no values are set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over values in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolve the values to a conventional URL path
    pub fn to_path(&self) -> String {
        let mut path = String::new();

        if let Some(page) = self.get("page") {
            path.push('/');
            path.push_str(page.trim_start_matches('/'));
        } else {
            for key in ["area", "controller", "action"] {
                if let Some(segment) = self.get(key) {
                    path.push('/');
                    path.push_str(segment);
                }
            }
        }

        if path.is_empty() {
            path.push('/');
        }

        let extra: Vec<(&str, &str)> = self
            .iter()
            .filter(|(k, _)| !ROUTE_KEYS.contains(k))
            .collect();
        if !extra.is_empty() {
            if let Ok(query) = serde_urlencoded::to_string(&extra) {
                path.push('?');
                path.push_str(&query);
            }
        }

        path
    }
}

/// 302 redirect to a route described by [`RouteValues`]
#[derive(Debug, Clone)]
pub struct RedirectToRoute {
    values: RouteValues,
}

impl RedirectToRoute {
    /// Create a redirect to the given route values
    pub fn new(values: RouteValues) -> Self {
        Self { values }
    }

    /// The route values
    pub fn values(&self) -> &RouteValues {
        &self.values
    }
}

impl IntoResponse for RedirectToRoute {
    fn into_response(self) -> Response {
        Redirect::to(self.values.to_path()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_action_route_resolves_to_path() {
        let values = RouteValues::action("Account", "Login");
        assert_eq!(values.to_path(), "/Account/Login");
    }

    #[test]
    fn page_takes_precedence_and_keeps_single_slash() {
        let values = RouteValues::action("Home", "Index").with("page", "/Errors/Invalid");
        assert_eq!(values.to_path(), "/Errors/Invalid");
    }

    #[test]
    fn extra_values_become_query_string() {
        let values = RouteValues::action("Orders", "Show").with("id", "42").with("tab", "a b");
        assert_eq!(values.to_path(), "/Orders/Show?id=42&tab=a+b");
    }

    #[test]
    fn insert_replaces_existing_value() {
        let mut values = RouteValues::action("Home", "Index");
        values.insert("action", "About");
        assert_eq!(values.get("action"), Some("About"));
        assert_eq!(values.iter().count(), 2);
    }

    #[test]
    fn redirect_to_route_sets_location() {
        let response = RedirectToRoute::new(RouteValues::action("Account", "Login")).into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/Account/Login");
    }

    #[test]
    fn invalid_redirect_location_is_an_error_response() {
        let response = Redirect::to("/bad\nlocation").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
