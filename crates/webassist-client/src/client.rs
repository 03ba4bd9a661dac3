//! The configurable client wrapping a pipeline

use crate::error::{ClientError, ClientResult};
use crate::pipeline::HandlerPipeline;
use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderValue};
use http::{Method, Uri};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Outgoing request with a buffered body
pub type ClientRequest = http::Request<Bytes>;

/// Response with a buffered body
pub type ClientResponse = http::Response<Bytes>;

/// HTTP client sending every request through a [`HandlerPipeline`]
///
/// The pipeline is owned by the client and lives as long as it does. Base
/// address, default headers and timeout are plain settings meant to be
/// adjusted by a factory's `configure` callback.
#[derive(Debug, Clone)]
pub struct PipelineClient {
    pipeline: HandlerPipeline,
    base_address: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl PipelineClient {
    /// Wrap a pipeline with empty settings
    pub fn from_pipeline(pipeline: HandlerPipeline) -> Self {
        Self {
            pipeline,
            base_address: None,
            default_headers: HeaderMap::new(),
            timeout: None,
        }
    }

    /// The pipeline requests travel through
    pub fn pipeline(&self) -> &HandlerPipeline {
        &self.pipeline
    }

    /// Base address relative URLs are resolved against
    pub fn base_address(&self) -> Option<&Url> {
        self.base_address.as_ref()
    }

    /// Set the base address
    pub fn set_base_address(&mut self, base: Url) {
        self.base_address = Some(base);
    }

    /// Headers added to every request that does not already carry them
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Mutable access to the default headers
    pub fn default_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.default_headers
    }

    /// Timeout applied to the whole pipeline, retries included
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Set the timeout
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Resolve `url` against the base address
    pub fn resolve(&self, url: &str) -> Result<Uri, ClientError> {
        let resolved = match &self.base_address {
            Some(base) => base.join(url),
            None => Url::parse(url),
        }
        .map_err(|e| ClientError::InvalidUri(format!("{}: {}", url, e)))?;

        resolved
            .as_str()
            .parse::<Uri>()
            .map_err(|e| ClientError::InvalidUri(e.to_string()))
    }

    /// Build a request for `url` resolved against the base address
    pub fn request(&self, method: Method, url: &str, body: Bytes) -> Result<ClientRequest, ClientError> {
        let uri = self.resolve(url)?;
        let req = http::Request::builder().method(method).uri(uri).body(body)?;
        Ok(req)
    }

    /// Send a request through the pipeline
    pub async fn send(&self, mut req: ClientRequest) -> ClientResult {
        for name in self.default_headers.keys() {
            if req.headers().contains_key(name) {
                continue;
            }
            for value in self.default_headers.get_all(name) {
                req.headers_mut().append(name.clone(), value.clone());
            }
        }

        let exchange = self.pipeline.send(req);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| ClientError::Timeout)?,
            None => exchange.await,
        }
    }

    /// `GET url`
    pub async fn get(&self, url: &str) -> ClientResult {
        let req = self.request(Method::GET, url, Bytes::new())?;
        self.send(req).await
    }

    /// `POST url` with `value` as a JSON body
    pub async fn post_as_json<T: Serialize + ?Sized>(&self, url: &str, value: &T) -> ClientResult {
        let body = serde_json::to_vec(value)?;
        let mut req = self.request(Method::POST, url, Bytes::from(body))?;
        req.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.send(req).await
    }
}

/// Helpers for reading a [`ClientResponse`]
pub trait ClientResponseExt: Sized {
    /// Deserialize the body as JSON
    fn read_as_json<T: DeserializeOwned>(&self) -> Result<T, ClientError>;

    /// Body decoded as UTF-8, lossily
    fn read_as_string(&self) -> String;

    /// Turn a non-success status into [`ClientError::Http`]
    fn error_for_status(self) -> Result<Self, ClientError>;
}

impl ClientResponseExt for ClientResponse {
    fn read_as_json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(self.body())?)
    }

    fn read_as_string(&self) -> String {
        String::from_utf8_lossy(self.body()).into_owned()
    }

    fn error_for_status(self) -> Result<Self, ClientError> {
        if self.status().is_success() {
            return Ok(self);
        }
        Err(ClientError::Http {
            status: self.status(),
            body: self.read_as_string(),
        })
    }
}
