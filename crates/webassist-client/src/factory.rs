//! Client factories

use crate::client::PipelineClient;
use crate::handler::DelegatingHandler;
use crate::pipeline::HandlerPipeline;
use crate::transport::{HttpTransport, Transport};
use std::sync::Arc;

/// Builds [`PipelineClient`]s from ordered handler lists
pub trait HttpClientFactory {
    /// Build a client whose requests visit `handlers` in order, then the
    /// terminal transport
    ///
    /// An empty list binds the client directly to the transport.
    fn create_client(&self, handlers: Vec<Arc<dyn DelegatingHandler>>) -> PipelineClient;

    /// Build a client, then run `configure` on it once before returning it
    fn create_client_with<F>(&self, handlers: Vec<Arc<dyn DelegatingHandler>>, configure: F) -> PipelineClient
    where
        F: FnOnce(&mut PipelineClient),
        Self: Sized,
    {
        let mut client = self.create_client(handlers);
        configure(&mut client);
        client
    }
}

type MakeTransport = dyn Fn() -> Arc<dyn Transport> + Send + Sync;

/// The default factory
///
/// Every build gets a fresh transport and a fresh chain; nothing is shared
/// between clients.
#[derive(Clone)]
pub struct PipelineClientFactory {
    make_transport: Arc<MakeTransport>,
}

impl PipelineClientFactory {
    /// Factory terminating every chain in a new [`HttpTransport`]
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::new)
    }

    /// Factory terminating every chain in a transport made by `make`
    pub fn with_transport<F, T>(make: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Transport,
    {
        Self {
            make_transport: Arc::new(move || Arc::new(make()) as Arc<dyn Transport>),
        }
    }
}

impl Default for PipelineClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClientFactory for PipelineClientFactory {
    fn create_client(&self, handlers: Vec<Arc<dyn DelegatingHandler>>) -> PipelineClient {
        let transport = (self.make_transport)();
        let pipeline = HandlerPipeline::new(handlers, transport);
        tracing::debug!(
            handlers = ?pipeline.handler_names(),
            transport = pipeline.transport_name(),
            "built client pipeline"
        );
        PipelineClient::from_pipeline(pipeline)
    }
}

impl std::fmt::Debug for PipelineClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineClientFactory").finish_non_exhaustive()
    }
}
