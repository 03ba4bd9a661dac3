//! Integration tests across the webassist crates

use webassist::prelude::*;

// ============================================================================
// Endpoint discovery
// ============================================================================

mod endpoint_tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;

    #[derive(Default)]
    pub struct PingEndpoint;

    impl MinimalApiEndpoint for PingEndpoint {
        fn handle_endpoint(&self, router: Router) -> Router {
            router.route("/ping", get(|| async { "pong" }))
        }
    }

    #[derive(Default)]
    pub struct VersionEndpoint;

    impl MinimalApiEndpoint for VersionEndpoint {
        fn handle_endpoint(&self, router: Router) -> Router {
            router.route("/version", get(|| async { env!("CARGO_PKG_VERSION") }))
        }
    }

    webassist::register_endpoint!(PingEndpoint);
    webassist::register_endpoint!(VersionEndpoint);

    #[test]
    fn registered_endpoints_are_discovered_in_name_order() {
        let endpoints = EndpointCollection::new().add_minimal_api_endpoints();
        let names: Vec<_> = endpoints
            .names()
            .into_iter()
            .filter(|n| n.starts_with(module_path!()))
            .collect();

        assert_eq!(
            names,
            vec![
                concat!(module_path!(), "::PingEndpoint"),
                concat!(module_path!(), "::VersionEndpoint")
            ]
        );
    }

    #[tokio::test]
    async fn discovered_endpoints_serve_requests() {
        let endpoints = EndpointCollection::new().add_minimal_api_endpoints();
        let app = Router::new().use_minimal_api_endpoints(&endpoints).into_service();

        let response = app
            .oneshot(http::Request::get("/ping").body(Bytes::new()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.read_body_as_string().await, "pong");
    }
}

// ============================================================================
// Controller introspection
// ============================================================================

mod introspection_tests {
    #[allow(dead_code)]
    struct CatalogController;

    webassist::register_action! {
        controller: CatalogController,
        action: list,
        returns: Vec<String>,
        attributes: ["HttpGet"],
    }

    webassist::register_action! {
        controller: CatalogController,
        action: details,
        returns: Option<String>,
        area: "Shop",
        controller_attributes: ["Authorize"],
    }

    #[test]
    fn actions_are_grouped_per_controller_and_area() {
        let controllers = webassist::controllers_info_in(module_path!());
        assert_eq!(controllers.len(), 2);

        let plain = controllers.iter().find(|c| c.area_name.is_none()).unwrap();
        assert_eq!(plain.name, "CatalogController");
        assert_eq!(plain.actions[0].name, "list");
        assert_eq!(plain.actions[0].attributes, vec!["HttpGet"]);

        let shop = controllers
            .iter()
            .find(|c| c.area_name.as_deref() == Some("Shop"))
            .unwrap();
        assert_eq!(shop.actions[0].name, "details");
        assert_eq!(shop.attributes, vec!["Authorize"]);
    }
}

// ============================================================================
// Serializer
// ============================================================================

mod serializer_tests {
    use super::*;
    use webassist::JsonOptions;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Invoice {
        number: u32,
        paid: bool,
    }

    #[test]
    fn serializer_round_trips_and_swallows_bad_input() {
        let serializer = JsonObjectSerializer::new();
        let invoice = Invoice { number: 7, paid: false };

        let text = serializer.serialize(&invoice, None).unwrap();
        assert_eq!(serializer.deserialize::<Invoice>(&text, None), Some(invoice));
        assert!(serializer.serialize(&[1, 2], Some(JsonOptions::pretty())).unwrap().contains('\n'));
        assert_eq!(serializer.deserialize::<Invoice>("{broken", None), None);
    }
}

// ============================================================================
// Client pipeline against an in-process router
// ============================================================================

#[cfg(feature = "client")]
mod client_tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use webassist::client::{BoxFuture, ClientRequest, ClientResponse, ClientResult, Next, Transport};
    use webassist::RouterService;

    /// Serves client requests from a router without a network
    struct InProcess(RouterService);

    impl Transport for InProcess {
        fn send(&self, req: ClientRequest) -> BoxFuture<ClientResult> {
            let response = self.0.oneshot(req);
            Box::pin(async move {
                let (parts, body) = response.await.into_parts();
                let body = body.collect().await.unwrap().to_bytes();
                Ok(ClientResponse::from_parts(parts, body))
            })
        }

        fn name(&self) -> &'static str {
            "in-process"
        }
    }

    /// Counts requests passing through
    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl DelegatingHandler for Counting {
        fn send(&self, req: ClientRequest, next: Next) -> BoxFuture<ClientResult> {
            self.0.fetch_add(1, Ordering::SeqCst);
            next.run(req)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    async fn echo(Json(note): Json<Note>) -> Json<Note> {
        Json(Note {
            text: note.text.to_uppercase(),
        })
    }

    fn app() -> RouterService {
        Router::new()
            .layer(RequestIdFilter::new())
            .route("/notes", post(echo))
            .into_service()
    }

    #[tokio::test]
    async fn json_round_trip_through_handlers_and_router() {
        let counting = Arc::new(Counting::default());
        let factory = PipelineClientFactory::with_transport(|| InProcess(app()));
        let handlers: Vec<Arc<dyn DelegatingHandler>> =
            vec![Arc::new(LoggingHandler::new()) as Arc<dyn DelegatingHandler>, counting.clone() as Arc<dyn DelegatingHandler>];

        let client = factory.create_client_with(handlers, |client| {
            client.set_base_address("http://app.local/".parse().unwrap());
        });

        let response = client
            .post_as_json("notes", &Note { text: "hi".into() })
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.read_as_json::<Note>().unwrap().text, "HI");
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }
}
