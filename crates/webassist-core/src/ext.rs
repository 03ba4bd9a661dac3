//! Extension methods on requests and responses

use crate::filter::{RequestId, REQUEST_ID_HEADER};
use crate::model_state::ModelState;
use crate::request::Request;
use crate::response::Response;
use crate::session::Session;
use http::header;
use http_body_util::BodyExt;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;

const TRACEPARENT_HEADER: &str = "traceparent";

/// Connection details a host attaches to each request's extensions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Connection identifier assigned by the host
    pub id: Option<String>,
    /// Address of the caller
    pub remote_addr: Option<SocketAddr>,
    /// Address the request arrived on
    pub local_addr: Option<SocketAddr>,
}

/// Flattened view of the caller's connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    /// Connection identifier assigned by the host
    pub connection_id: Option<String>,
    /// Caller IP address
    pub remote_ip: Option<String>,
    /// Local IP address
    pub local_ip: Option<String>,
    /// Caller port
    pub remote_port: Option<u16>,
    /// Local port
    pub local_port: Option<u16>,
}

impl From<&ConnectionInfo> for HostInfo {
    fn from(info: &ConnectionInfo) -> Self {
        Self {
            connection_id: info.id.clone(),
            remote_ip: info.remote_addr.map(|a| a.ip().to_string()),
            local_ip: info.local_addr.map(|a| a.ip().to_string()),
            remote_port: info.remote_addr.map(|a| a.port()),
            local_port: info.local_addr.map(|a| a.port()),
        }
    }
}

/// Convenience accessors on [`Request`]
pub trait RequestExt {
    /// Whether the request was issued by `XMLHttpRequest`
    fn is_ajax_request(&self) -> bool;

    /// The absolute URL of the request
    fn url(&self) -> String;

    /// Identifier of the current request
    ///
    /// Prefers the W3C `traceparent` of the current trace, then the id set
    /// by `RequestIdFilter`, then an incoming `x-request-id` header.
    fn request_id(&self) -> Option<String>;

    /// Connection info attached by the host, if any
    fn connection_info(&self) -> Option<&ConnectionInfo>;

    /// Caller connection details; every field is `None` when unknown
    fn caller_host(&self) -> HostInfo;

    /// The session attached by `SessionFilter`
    fn session(&self) -> Option<Session>;

    /// The model state recorded by model binding
    fn model_state(&self) -> Option<&ModelState>;
}

fn header_str<'a>(req: &'a Request, name: impl header::AsHeaderName) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

impl RequestExt for Request {
    fn is_ajax_request(&self) -> bool {
        header_str(self, "x-requested-with") == Some("XMLHttpRequest")
    }

    fn url(&self) -> String {
        let scheme = self
            .uri()
            .scheme_str()
            .or_else(|| header_str(self, "x-forwarded-proto"))
            .unwrap_or("http");
        let host = self
            .uri()
            .authority()
            .map(|a| a.as_str())
            .or_else(|| header_str(self, header::HOST))
            .unwrap_or_default();

        match self.query_string() {
            Some(query) => format!("{}://{}{}?{}", scheme, host, self.path(), query),
            None => format!("{}://{}{}", scheme, host, self.path()),
        }
    }

    fn request_id(&self) -> Option<String> {
        header_str(self, TRACEPARENT_HEADER)
            .map(str::to_string)
            .or_else(|| {
                self.extensions()
                    .get::<RequestId>()
                    .map(|id| id.as_str().to_string())
            })
            .or_else(|| header_str(self, REQUEST_ID_HEADER).map(str::to_string))
    }

    fn connection_info(&self) -> Option<&ConnectionInfo> {
        self.extensions().get::<ConnectionInfo>()
    }

    fn caller_host(&self) -> HostInfo {
        self.connection_info().map(HostInfo::from).unwrap_or_default()
    }

    fn session(&self) -> Option<Session> {
        self.extensions().get::<Session>().cloned()
    }

    fn model_state(&self) -> Option<&ModelState> {
        self.extensions().get::<ModelState>()
    }
}

/// Convenience accessors on [`Response`]
pub trait ResponseExt {
    /// Read the body as UTF-8 text without consuming it
    ///
    /// Invalid sequences are replaced with U+FFFD.
    fn read_body_as_string(&self) -> impl Future<Output = String> + Send;
}

impl ResponseExt for Response {
    async fn read_body_as_string(&self) -> String {
        let body = self.body().clone();
        match body.collect().await {
            Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;

    fn request(builder: http::request::Builder) -> Request {
        Request::from_http_request(builder.body(()).unwrap(), Bytes::new())
    }

    #[test]
    fn ajax_detection_is_exact() {
        let ajax = request(http::Request::builder().header("X-Requested-With", "XMLHttpRequest"));
        let lower = request(http::Request::builder().header("X-Requested-With", "xmlhttprequest"));
        let plain = request(http::Request::builder());
        assert!(ajax.is_ajax_request());
        assert!(!lower.is_ajax_request());
        assert!(!plain.is_ajax_request());
    }

    #[test]
    fn url_uses_host_header_and_forwarded_proto() {
        let req = request(
            http::Request::builder()
                .uri("/orders/7?tab=items")
                .header("host", "shop.example")
                .header("x-forwarded-proto", "https"),
        );
        assert_eq!(req.url(), "https://shop.example/orders/7?tab=items");
    }

    #[test]
    fn url_prefers_absolute_uri() {
        let req = request(http::Request::builder().uri("http://api.example:8080/ping"));
        assert_eq!(req.url(), "http://api.example:8080/ping");
    }

    #[test]
    fn request_id_precedence() {
        let traced = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";
        let mut req = request(
            http::Request::builder()
                .header("traceparent", traced)
                .header("x-request-id", "from-header"),
        );
        req.extensions_mut().insert(RequestId("from-filter".into()));
        assert_eq!(req.request_id().as_deref(), Some(traced));

        let mut req = request(http::Request::builder().header("x-request-id", "from-header"));
        assert_eq!(req.request_id().as_deref(), Some("from-header"));
        req.extensions_mut().insert(RequestId("from-filter".into()));
        assert_eq!(req.request_id().as_deref(), Some("from-filter"));

        assert_eq!(request(http::Request::builder()).request_id(), None);
    }

    #[test]
    fn caller_host_flattens_connection_info() {
        let mut req = request(http::Request::builder());
        assert_eq!(req.caller_host(), HostInfo::default());

        req.extensions_mut().insert(ConnectionInfo {
            id: Some("conn-1".into()),
            remote_addr: Some("10.0.0.5:51234".parse().unwrap()),
            local_addr: Some("127.0.0.1:8080".parse().unwrap()),
        });
        let host = req.caller_host();
        assert_eq!(host.connection_id.as_deref(), Some("conn-1"));
        assert_eq!(host.remote_ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(host.remote_port, Some(51234));
        assert_eq!(host.local_ip.as_deref(), Some("127.0.0.1"));
        assert_eq!(host.local_port, Some(8080));
    }

    #[tokio::test]
    async fn body_can_be_read_twice() {
        let response: Response = http::Response::new(Full::new(Bytes::from_static(b"caf\xc3\xa9 \xff")));
        let first = response.read_body_as_string().await;
        let second = response.read_body_as_string().await;
        assert_eq!(first, "café \u{FFFD}");
        assert_eq!(first, second);
    }
}
