//! Delegating handlers and the chain link they forward to

use crate::client::ClientRequest;
use crate::error::ClientResult;
use crate::transport::Transport;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by handlers and transports
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// One link of a client pipeline
///
/// A handler receives the request and the rest of the chain. Calling
/// `next.run(req)` forwards to the following handler, or to the transport
/// when this is the last one. Returning without calling `next` answers the
/// request locally.
pub trait DelegatingHandler: Send + Sync + 'static {
    /// Handle an outgoing request
    fn send(&self, req: ClientRequest, next: Next) -> BoxFuture<ClientResult>;

    /// Name used in logs and by [`HandlerPipeline::links`](crate::HandlerPipeline::links)
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// The remainder of a pipeline, seen from one handler
///
/// `Next` is a cursor into an immutable handler slice; cloning it is cheap
/// and lets a handler run the rest of the chain more than once.
#[derive(Clone)]
pub struct Next {
    handlers: Arc<[Arc<dyn DelegatingHandler>]>,
    index: usize,
    transport: Arc<dyn Transport>,
}

impl Next {
    pub(crate) fn new(
        handlers: Arc<[Arc<dyn DelegatingHandler>]>,
        index: usize,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            handlers,
            index,
            transport,
        }
    }

    /// Send `req` through the rest of the chain
    pub fn run(self, req: ClientRequest) -> BoxFuture<ClientResult> {
        match self.handlers.get(self.index).cloned() {
            Some(handler) => {
                let next = Next::new(self.handlers, self.index + 1, self.transport);
                handler.send(req, next)
            }
            None => self.transport.send(req),
        }
    }

    /// Name of the link `run` delegates to
    pub fn target_name(&self) -> &'static str {
        match self.handlers.get(self.index) {
            Some(handler) => handler.name(),
            None => self.transport.name(),
        }
    }

    /// Whether `run` goes straight to the transport
    pub fn is_terminal(&self) -> bool {
        self.index >= self.handlers.len()
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("target", &self.target_name())
            .finish()
    }
}
