//! Action filter infrastructure
//!
//! An action filter runs around a route handler: it sees the request before
//! the handler, may short-circuit with its own response, and sees the
//! response on the way back. Filters are attached globally with
//! [`Router::layer`](crate::Router::layer) or to a single route with
//! [`MethodRouter::filter`](crate::MethodRouter::filter).
//!
//! # Example
//!
//! ```rust,ignore
//! use webassist_core::{get, Router, RequestIdFilter};
//!
//! let router = Router::new()
//!     .layer(RequestIdFilter::new())
//!     .route("/", get(handler));
//! ```

mod request_id;
mod stack;

pub use request_id::{RequestId, RequestIdFilter, REQUEST_ID_HEADER};
pub use stack::{ActionFilter, BoxFuture, FilterStack, Next};
