use crate::client::ClientRequest;
use crate::error::ClientResult;
use crate::handler::{BoxFuture, DelegatingHandler, Next};
use std::time::Instant;

/// Logs every outgoing request and the outcome that comes back
#[derive(Debug, Clone, Default)]
pub struct LoggingHandler {
    log_headers: bool,
}

impl LoggingHandler {
    /// Log request lines and outcomes only
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log request and response headers at debug level
    pub fn log_headers(mut self, enabled: bool) -> Self {
        self.log_headers = enabled;
        self
    }
}

impl DelegatingHandler for LoggingHandler {
    fn send(&self, req: ClientRequest, next: Next) -> BoxFuture<ClientResult> {
        let log_headers = self.log_headers;
        Box::pin(async move {
            let method = req.method().clone();
            let uri = req.uri().clone();
            tracing::info!(method = %method, uri = %uri, delegate = next.target_name(), "outgoing request");
            if log_headers {
                for (name, value) in req.headers() {
                    tracing::debug!(header = %name, value = ?value, "request header");
                }
            }

            let start = Instant::now();
            let result = next.run(req).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(response) => {
                    tracing::info!(
                        method = %method,
                        uri = %uri,
                        status = response.status().as_u16(),
                        duration_ms,
                        "response received"
                    );
                    if log_headers {
                        for (name, value) in response.headers() {
                            tracing::debug!(header = %name, value = ?value, "response header");
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(method = %method, uri = %uri, error = %error, duration_ms, "request failed");
                }
            }
            result
        })
    }

    fn name(&self) -> &'static str {
        "logging"
    }
}
