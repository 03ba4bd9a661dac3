//! Immutable handler pipelines

use crate::client::ClientRequest;
use crate::error::ClientResult;
use crate::handler::{BoxFuture, DelegatingHandler, Next};
use crate::transport::Transport;
use std::sync::Arc;

/// Name of the first link's source in [`HandlerPipeline::links`]
pub const CLIENT_LINK: &str = "client";

/// Ordered handlers in front of a terminal transport
///
/// Built once and never mutated; `N` handlers make `N` links plus the
/// terminal. Requests visit the handlers in order and responses travel back
/// in reverse.
#[derive(Clone)]
pub struct HandlerPipeline {
    handlers: Arc<[Arc<dyn DelegatingHandler>]>,
    transport: Arc<dyn Transport>,
}

impl HandlerPipeline {
    /// Build a pipeline from handlers in request order
    pub fn new(handlers: Vec<Arc<dyn DelegatingHandler>>, transport: Arc<dyn Transport>) -> Self {
        Self {
            handlers: handlers.into(),
            transport,
        }
    }

    /// Number of handlers, not counting the terminal
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether requests go straight to the terminal
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handler names in request order
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Name of the terminal transport
    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Name of the first link a request reaches
    pub fn entry_name(&self) -> &'static str {
        self.entry().target_name()
    }

    /// Every delegation as `(from, to)`
    ///
    /// Starts with [`CLIENT_LINK`] delegating to the entry, so the result
    /// always has `len() + 1` pairs and ends at the transport.
    pub fn links(&self) -> Vec<(&'static str, &'static str)> {
        let mut from = CLIENT_LINK;
        (0..=self.handlers.len())
            .map(|index| {
                let to = Next::new(self.handlers.clone(), index, self.transport.clone()).target_name();
                let link = (from, to);
                from = to;
                link
            })
            .collect()
    }

    /// Send a request through every handler and the transport
    pub fn send(&self, req: ClientRequest) -> BoxFuture<ClientResult> {
        self.entry().run(req)
    }

    fn entry(&self) -> Next {
        Next::new(self.handlers.clone(), 0, self.transport.clone())
    }
}

impl std::fmt::Debug for HandlerPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerPipeline")
            .field("handlers", &self.handler_names())
            .field("transport", &self.transport_name())
            .finish()
    }
}
