//! Ajax-only access

use webassist_core::{ActionFilter, ApiError, BoxFuture, IntoResponse, Next, Request, RequestExt, Response};

/// Message of the 400 response returned to non-ajax requests
pub const AJAX_ONLY_MESSAGE: &str = "This operation can only be accessed via Ajax requests";

/// Reject requests that were not issued by `XMLHttpRequest`
///
/// A request qualifies when its `X-Requested-With` header is exactly
/// `XMLHttpRequest`. Anything else is answered with `400 Bad Request`
/// without running the handler.
///
/// The rejection is reported as a client error rather than an unhandled
/// invalid-operation failure, so callers see `400` and never `500`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AjaxOnly;

impl ActionFilter for AjaxOnly {
    fn call(&self, req: Request, next: Next) -> BoxFuture<Response> {
        if req.is_ajax_request() {
            return next(req);
        }

        tracing::debug!(path = %req.path(), "Rejected non-ajax request");
        Box::pin(async move { ApiError::bad_request(AJAX_ONLY_MESSAGE).into_response() })
    }

    fn clone_box(&self) -> Box<dyn ActionFilter> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use webassist_core::ResponseExt;

    fn handler(called: Arc<AtomicBool>) -> Next {
        Arc::new(move |_req: Request| {
            let called = called.clone();
            Box::pin(async move {
                called.store(true, Ordering::SeqCst);
                "ok".into_response()
            }) as BoxFuture<Response>
        })
    }

    fn request(header: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/search");
        if let Some(value) = header {
            builder = builder.header("X-Requested-With", value);
        }
        Request::from_http_request(builder.body(()).unwrap(), Bytes::new())
    }

    #[tokio::test]
    async fn ajax_request_reaches_handler() {
        let called = Arc::new(AtomicBool::new(false));
        let response = AjaxOnly.call(request(Some("XMLHttpRequest")), handler(called.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn other_requests_are_rejected() {
        for header in [None, Some("fetch"), Some("XMLHTTPREQUEST")] {
            let called = Arc::new(AtomicBool::new(false));
            let response = AjaxOnly.call(request(header), handler(called.clone())).await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert!(!called.load(Ordering::SeqCst));
            assert!(response.read_body_as_string().await.contains(AJAX_ONLY_MESSAGE));
        }
    }
}
