//! Terminal transports

use crate::client::{ClientRequest, ClientResponse};
use crate::error::ClientResult;
use crate::handler::BoxFuture;

/// The end of a pipeline: actually performs the exchange
pub trait Transport: Send + Sync + 'static {
    /// Send a request and buffer the response
    fn send(&self, req: ClientRequest) -> BoxFuture<ClientResult>;

    /// Name used in logs and pipeline links
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Transport over a `reqwest` client
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Transport with a default `reqwest` client
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport over an existing `reqwest` client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn send(&self, req: ClientRequest) -> BoxFuture<ClientResult> {
        let client = self.client.clone();
        Box::pin(async move {
            let request = reqwest::Request::try_from(req.map(reqwest::Body::from))?;
            tracing::trace!(method = %request.method(), url = %request.url(), "sending over http");

            let response = client.execute(request).await?;
            let status = response.status();
            let version = response.version();
            let headers = response.headers().clone();
            let body = response.bytes().await?;

            let mut out = ClientResponse::new(body);
            *out.status_mut() = status;
            *out.version_mut() = version;
            *out.headers_mut() = headers;
            Ok(out)
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
