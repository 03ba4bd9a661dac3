//! # webassist
//!
//! Helper utilities for web applications built around a small action-filter
//! pipeline.
//!
//! - Request/response extensions: ajax detection, absolute URL, request id,
//!   connection info, body reading
//! - Action filters: [`AjaxOnly`], [`SessionTimeout`], [`BindModel`] with
//!   [`IfModelIsInvalid`], [`AsyncLock`] over a shared [`SingleFlight`]
//! - Minimal API endpoint discovery with [`register_endpoint!`]
//! - Controller/action introspection with [`register_action!`]
//! - A JSON [`ObjectSerializer`] that logs instead of failing on bad input
//! - Session, TempData and multipart form-file helpers
//! - A decorator-chaining HTTP client factory (`client` feature)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use webassist::prelude::*;
//!
//! async fn search() -> Json<Vec<String>> {
//!     Json(vec![])
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     webassist::init_tracing();
//!
//!     let app = Router::new()
//!         .layer(RequestIdFilter::new())
//!         .layer(SessionFilter::new(MemorySessionStore::new()))
//!         .route("/search", get(search).filter(AjaxOnly))
//!         .use_minimal_api_endpoints(&EndpointCollection::new().add_minimal_api_endpoints())
//!         .into_service();
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `client` (default) - [`client::PipelineClientFactory`] and friends

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export core functionality
pub use webassist_core::*;

// Re-export macros
pub use webassist_core::{register_action, register_endpoint};

// Re-export filters
pub use webassist_filters::{
    AjaxOnly, AsyncLock, BindModel, FilterConfigError, IfModelIsInvalid, LogFormat, LoggingConfig, LoggingFilter,
    RedirectTarget, SessionTimeout, SingleFlight, AJAX_ONLY_MESSAGE,
};

/// HTTP client built from delegating handlers
#[cfg(feature = "client")]
pub mod client {
    pub use webassist_client::*;
}

/// Filter directives used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info,webassist=debug";

/// Install a `tracing` subscriber reading `RUST_LOG`
///
/// Falls back to [`DEFAULT_LOG_FILTER`]. Calling it again, or after another
/// subscriber was installed, does nothing.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Prelude module - import everything you need with `use webassist::prelude::*`
pub mod prelude {
    pub use webassist_core::{
        delete,
        get,
        patch,
        post,
        put,
        // Filters
        ActionFilter,
        // Error handling
        ApiError,
        // Endpoints
        EndpointCollection,
        EndpointRouterExt,
        Extension,
        Form,
        FormFile,
        // Response types
        IntoResponse,
        // Extractors
        Json,
        JsonObjectSerializer,
        MemorySessionStore,
        MinimalApiEndpoint,
        ObjectSerializer,
        Query,
        Redirect,
        RedirectToRoute,
        // Request context
        Request,
        RequestExt,
        RequestId,
        RequestIdFilter,
        Response,
        ResponseExt,
        Result,
        RouteValues,
        // Router
        Router,
        Session,
        SessionFilter,
        State,
        TempData,
    };

    pub use webassist_filters::{
        AjaxOnly, AsyncLock, BindModel, IfModelIsInvalid, LoggingFilter, SessionTimeout, SingleFlight,
    };

    #[cfg(feature = "client")]
    pub use webassist_client::{
        ClientResponseExt, DelegatingHandler, HttpClientFactory, LoggingHandler, PipelineClient,
        PipelineClientFactory, RetryHandler,
    };

    // Re-export commonly used external types
    pub use serde::{Deserialize, Serialize};
    pub use validator::Validate;
}
