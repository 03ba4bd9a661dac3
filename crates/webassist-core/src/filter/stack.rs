//! Filter chaining
//!
//! Filters form an immutable ordered list; [`FilterStack::execute`] folds
//! them around the final handler from the inside out so that the first
//! filter pushed is the outermost one.

use crate::request::Request;
use crate::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// The remainder of the pipeline after the current filter
pub type Next = Arc<dyn Fn(Request) -> BoxFuture<Response> + Send + Sync>;

/// An action filter
///
/// Implementations either forward to `next` or return their own response
/// without calling it.
pub trait ActionFilter: Send + Sync + 'static {
    /// Run this filter around the rest of the pipeline
    fn call(&self, req: Request, next: Next) -> BoxFuture<Response>;

    /// Clone this filter into a boxed trait object
    fn clone_box(&self) -> Box<dyn ActionFilter>;
}

impl Clone for Box<dyn ActionFilter> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// An ordered stack of filters
#[derive(Clone, Default)]
pub struct FilterStack {
    filters: Vec<Arc<dyn ActionFilter>>,
}

impl FilterStack {
    /// Create a new empty filter stack
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the stack
    ///
    /// Filters run in the order they are added (outermost first).
    pub fn push(&mut self, filter: Box<dyn ActionFilter>) {
        self.filters.push(Arc::from(filter));
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Get the number of filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Compose the stack around `handler` into a single entry point
    pub fn wrap(&self, handler: Next) -> Next {
        self.filters.iter().rev().fold(handler, |next, filter| {
            let filter = Arc::clone(filter);
            let wrapped: Next = Arc::new(move |req: Request| filter.call(req, Arc::clone(&next)));
            wrapped
        })
    }

    /// Execute the filter stack with a final handler
    pub fn execute(&self, req: Request, handler: Next) -> BoxFuture<Response> {
        if self.filters.is_empty() {
            return handler(req);
        }
        self.wrap(handler)(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    fn test_request() -> Request {
        Request::from_http_request(
            http::Request::builder().uri("/test").body(()).unwrap(),
            Bytes::new(),
        )
    }

    fn status_handler(status: StatusCode, called: Arc<AtomicBool>) -> Next {
        Arc::new(move |_req: Request| {
            let called = called.clone();
            Box::pin(async move {
                called.store(true, Ordering::SeqCst);
                let mut response = http::Response::new(http_body_util::Full::new(Bytes::from("ok")));
                *response.status_mut() = status;
                response
            }) as BoxFuture<Response>
        })
    }

    #[derive(Clone)]
    struct OrderTracking {
        id: usize,
        order: Arc<Mutex<Vec<(usize, &'static str)>>>,
    }

    impl ActionFilter for OrderTracking {
        fn call(&self, req: Request, next: Next) -> BoxFuture<Response> {
            let id = self.id;
            let order = self.order.clone();
            Box::pin(async move {
                order.lock().unwrap().push((id, "pre"));
                let response = next(req).await;
                order.lock().unwrap().push((id, "post"));
                response
            })
        }

        fn clone_box(&self) -> Box<dyn ActionFilter> {
            Box::new(self.clone())
        }
    }

    #[derive(Clone)]
    struct ShortCircuit(StatusCode);

    impl ActionFilter for ShortCircuit {
        fn call(&self, _req: Request, _next: Next) -> BoxFuture<Response> {
            let status = self.0;
            Box::pin(async move {
                let mut response = http::Response::new(http_body_util::Full::new(Bytes::new()));
                *response.status_mut() = status;
                response
            })
        }

        fn clone_box(&self) -> Box<dyn ActionFilter> {
            Box::new(self.clone())
        }
    }

    #[tokio::test]
    async fn empty_stack_calls_handler_directly() {
        let called = Arc::new(AtomicBool::new(false));
        let stack = FilterStack::new();
        let response = stack
            .execute(test_request(), status_handler(StatusCode::OK, called.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(called.load(Ordering::SeqCst));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_filters_run_outermost_first(num_filters in 1usize..10usize) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let order = Arc::new(Mutex::new(Vec::new()));
                let mut stack = FilterStack::new();
                for id in 0..num_filters {
                    stack.push(Box::new(OrderTracking { id, order: order.clone() }));
                }

                let called = Arc::new(AtomicBool::new(false));
                stack.execute(test_request(), status_handler(StatusCode::OK, called)).await;

                let order = order.lock().unwrap();
                prop_assert_eq!(order.len(), num_filters * 2);
                for i in 0..num_filters {
                    prop_assert_eq!(order[i], (i, "pre"));
                    prop_assert_eq!(order[num_filters + i], (num_filters - 1 - i, "post"));
                }
                Ok(())
            });
            result?;
        }

        #[test]
        fn prop_short_circuit_skips_inner_filters_and_handler(
            status in 400u16..600u16,
            before in 0usize..5usize,
            after in 0usize..5usize,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let order = Arc::new(Mutex::new(Vec::new()));
                let status = StatusCode::from_u16(status).unwrap();
                let mut stack = FilterStack::new();
                for id in 0..before {
                    stack.push(Box::new(OrderTracking { id, order: order.clone() }));
                }
                stack.push(Box::new(ShortCircuit(status)));
                for id in 0..after {
                    stack.push(Box::new(OrderTracking { id: 100 + id, order: order.clone() }));
                }

                let called = Arc::new(AtomicBool::new(false));
                let response = stack
                    .execute(test_request(), status_handler(StatusCode::OK, called.clone()))
                    .await;

                prop_assert_eq!(response.status(), status);
                prop_assert!(!called.load(Ordering::SeqCst));
                let order = order.lock().unwrap();
                prop_assert_eq!(order.len(), before * 2);
                prop_assert!(order.iter().all(|(id, _)| *id < 100));
                Ok(())
            });
            result?;
        }
    }
}
