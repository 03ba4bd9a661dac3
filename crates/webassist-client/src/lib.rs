//! # webassist-client
//!
//! An HTTP client built from an ordered list of delegating handlers.
//!
//! Each [`DelegatingHandler`] receives the outgoing request together with the
//! [`Next`] link of the chain. It may forward to `next`, rewrite the request,
//! retry, or answer on its own. The last link is a [`Transport`], by default
//! [`HttpTransport`] over `reqwest`.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use webassist_client::{DelegatingHandler, HttpClientFactory, LoggingHandler, PipelineClientFactory, RetryHandler};
//!
//! let handlers: Vec<Arc<dyn DelegatingHandler>> = vec![
//!     Arc::new(LoggingHandler::new()),
//!     Arc::new(RetryHandler::new().max_attempts(2)),
//! ];
//! let client = PipelineClientFactory::new().create_client_with(handlers, |client| {
//!     client.set_timeout(std::time::Duration::from_secs(5));
//! });
//! let response = client.get("https://example.com/health").await?;
//! ```

mod client;
mod config;
mod error;
mod factory;
mod handler;
pub mod handlers;
mod pipeline;
mod transport;

pub use client::{ClientRequest, ClientResponse, ClientResponseExt, PipelineClient};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use factory::{HttpClientFactory, PipelineClientFactory};
pub use handler::{BoxFuture, DelegatingHandler, Next};
pub use handlers::{LoggingHandler, RetryConfig, RetryHandler, RetryStrategy};
pub use pipeline::{HandlerPipeline, CLIENT_LINK};
pub use transport::{HttpTransport, Transport};
