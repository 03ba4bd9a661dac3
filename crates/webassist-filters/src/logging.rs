//! Structured request/response logging
//!
//! [`LoggingFilter`] writes one event when a request enters the pipeline and
//! one when its response leaves, correlated by request id.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .layer(RequestIdFilter::new())
//!     .layer(LoggingFilter::new().format(LogFormat::Json).skip_path("/health"));
//! ```

use http::HeaderMap;
use std::time::Instant;
use webassist_core::{ActionFilter, BoxFuture, Next, Request, RequestExt, Response};

/// Shape of the emitted events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Key/value fields, one event each way
    #[default]
    Compact,
    /// Banner events plus optional per-header events
    Detailed,
    /// A single JSON document as the event message
    Json,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Event shape
    pub format: LogFormat,
    /// Log request headers (detailed format only)
    pub log_request_headers: bool,
    /// Log response headers (detailed format only)
    pub log_response_headers: bool,
    /// Path prefixes that are not logged
    pub skip_paths: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            log_request_headers: false,
            log_response_headers: false,
            skip_paths: vec!["/health".to_string()],
        }
    }
}

impl LoggingConfig {
    fn skips(&self, path: &str) -> bool {
        self.skip_paths.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// Filter logging every request and response passing through it
#[derive(Debug, Clone, Default)]
pub struct LoggingFilter {
    config: LoggingConfig,
}

impl LoggingFilter {
    /// Default configuration: compact, `/health` skipped
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit configuration
    pub fn with_config(config: LoggingConfig) -> Self {
        Self { config }
    }

    /// Set the event shape
    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Toggle request header logging
    pub fn log_request_headers(mut self, enabled: bool) -> Self {
        self.config.log_request_headers = enabled;
        self
    }

    /// Toggle response header logging
    pub fn log_response_headers(mut self, enabled: bool) -> Self {
        self.config.log_response_headers = enabled;
        self
    }

    /// Skip paths starting with `prefix`
    pub fn skip_path(mut self, prefix: impl Into<String>) -> Self {
        self.config.skip_paths.push(prefix.into());
        self
    }

    /// Current configuration
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }
}

fn log_headers(request_id: &str, direction: &'static str, headers: &HeaderMap) {
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            tracing::debug!(request_id = %request_id, header = %name, value = %value, "{} header", direction);
        }
    }
}

impl ActionFilter for LoggingFilter {
    fn call(&self, req: Request, next: Next) -> BoxFuture<Response> {
        if self.config.skips(req.path()) {
            return next(req);
        }

        let config = self.config.clone();
        Box::pin(async move {
            let method = req.method().to_string();
            let uri = req.uri().to_string();
            let request_id = req.request_id().unwrap_or_else(|| "N/A".to_string());
            let start = Instant::now();

            match config.format {
                LogFormat::Compact => {
                    tracing::info!(request_id = %request_id, method = %method, uri = %uri, "incoming request");
                }
                LogFormat::Detailed => {
                    tracing::info!(
                        request_id = %request_id,
                        method = %method,
                        uri = %uri,
                        version = ?req.version(),
                        "=== Incoming Request ==="
                    );
                    if config.log_request_headers {
                        log_headers(&request_id, "request", req.headers());
                    }
                }
                LogFormat::Json => {
                    let event = serde_json::json!({
                        "type": "request",
                        "request_id": request_id,
                        "method": method,
                        "uri": uri,
                    });
                    tracing::info!("{}", event);
                }
            }

            let response = next(req).await;
            let status = response.status().as_u16();
            let duration_ms = start.elapsed().as_millis() as u64;

            match config.format {
                LogFormat::Compact => {
                    tracing::info!(
                        request_id = %request_id,
                        method = %method,
                        uri = %uri,
                        status,
                        duration_ms,
                        "request completed"
                    );
                }
                LogFormat::Detailed => {
                    tracing::info!(request_id = %request_id, status, duration_ms, "=== Response Sent ===");
                    if config.log_response_headers {
                        log_headers(&request_id, "response", response.headers());
                    }
                }
                LogFormat::Json => {
                    let event = serde_json::json!({
                        "type": "response",
                        "request_id": request_id,
                        "method": method,
                        "uri": uri,
                        "status": status,
                        "duration_ms": duration_ms,
                    });
                    tracing::info!("{}", event);
                }
            }

            response
        })
    }

    fn clone_box(&self) -> Box<dyn ActionFilter> {
        Box::new(self.clone())
    }
}
