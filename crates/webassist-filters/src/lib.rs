//! # webassist-filters
//!
//! Action filters that attach to a webassist router, either globally with
//! `Router::layer` or per route with `MethodRouter::filter`.
//!
//! - [`AjaxOnly`] - reject requests not issued by `XMLHttpRequest`
//! - [`SessionTimeout`] - redirect when a required session key is missing
//! - [`BindModel`] / [`IfModelIsInvalid`] - bind and validate a request model,
//!   redirect when it is invalid
//! - [`AsyncLock`] / [`SingleFlight`] - run guarded work one call at a time
//! - [`LoggingFilter`] - structured request/response logging
//!
//! ## Example
//!
//! ```rust,ignore
//! use webassist_core::{get, post, Router};
//! use webassist_filters::{AjaxOnly, AsyncLock, SingleFlight};
//!
//! let flight = SingleFlight::new();
//! let router = Router::new()
//!     .route("/search", get(search).filter(AjaxOnly))
//!     .route("/import", post(import).filter(AsyncLock::new(flight.clone())));
//! ```

#![warn(missing_docs)]

mod ajax_only;
mod async_lock;
mod error;
mod logging;
mod model;
mod session_timeout;

pub use ajax_only::{AjaxOnly, AJAX_ONLY_MESSAGE};
pub use async_lock::{AsyncLock, SingleFlight};
pub use error::FilterConfigError;
pub use logging::{LogFormat, LoggingConfig, LoggingFilter};
pub use model::{BindModel, IfModelIsInvalid, RedirectTarget};
pub use session_timeout::SessionTimeout;
