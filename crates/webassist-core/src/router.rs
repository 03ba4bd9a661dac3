//! In-process routing table
//!
//! Minimal API endpoints and action filters need somewhere to attach to.
//! [`Router`] maps `{param}` style path patterns onto a radix tree (matchit)
//! and dispatches a [`Request`] to the handler registered for its method.
//! A router becomes callable once turned into a [`RouterService`], which
//! also implements [`tower::Service`] so a host can mount it.
//!
//! # Example
//!
//! ```rust,ignore
//! use webassist_core::{get, post, Router};
//!
//! async fn list_orders() -> &'static str { "orders" }
//! async fn create_order() -> &'static str { "created" }
//!
//! let service = Router::new()
//!     .route("/orders", get(list_orders).post(create_order))
//!     .into_service();
//! ```

use crate::error::ApiError;
use crate::filter::{ActionFilter, BoxFuture, FilterStack, Next};
use crate::handler::{into_boxed_handler, Handler};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use bytes::Bytes;
use http::{header, Extensions, HeaderValue, Method};
use matchit::Router as MatchitRouter;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Information about a registered route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// The original path pattern (e.g., "/users/{id}")
    pub path: String,
    /// The HTTP methods registered for this path
    pub methods: Vec<Method>,
}

/// Error returned when a route cannot be registered
#[derive(Debug, Clone, thiserror::Error)]
#[error(
    "route conflict: `{new_path}` clashes with existing route `{existing_path}`{} ({details})",
    method_suffix(.method)
)]
pub struct RouteConflictError {
    /// The path that was being registered
    pub new_path: String,
    /// The HTTP method that conflicts, if the clash is on a method
    pub method: Option<Method>,
    /// The existing path that conflicts
    pub existing_path: String,
    /// Detailed error message from the underlying router
    pub details: String,
}

fn method_suffix(method: &Option<Method>) -> String {
    method
        .as_ref()
        .map(|m| format!(" for method {}", m))
        .unwrap_or_default()
}

/// Handlers for a single path, keyed by HTTP method
#[derive(Clone, Default)]
pub struct MethodRouter {
    handlers: HashMap<Method, Next>,
}

impl MethodRouter {
    /// Create a new empty method router
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    fn on(mut self, method: Method, handler: Next) -> Self {
        self.handlers.insert(method, handler);
        self
    }

    /// Add a GET handler
    pub fn get<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::GET, into_boxed_handler(handler))
    }

    /// Add a POST handler
    pub fn post<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::POST, into_boxed_handler(handler))
    }

    /// Add a PUT handler
    pub fn put<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::PUT, into_boxed_handler(handler))
    }

    /// Add a PATCH handler
    pub fn patch<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::PATCH, into_boxed_handler(handler))
    }

    /// Add a DELETE handler
    pub fn delete<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::DELETE, into_boxed_handler(handler))
    }

    /// Attach an action filter to every handler registered so far
    ///
    /// Filters attached later run outside those attached earlier.
    pub fn filter<F: ActionFilter>(mut self, filter: F) -> Self {
        let filter: Arc<dyn ActionFilter> = Arc::new(filter);
        for handler in self.handlers.values_mut() {
            let inner = Arc::clone(handler);
            let filter = Arc::clone(&filter);
            let wrapped: Next =
                Arc::new(move |req: Request| filter.call(req, Arc::clone(&inner)));
            *handler = wrapped;
        }
        self
    }

    /// Methods with a registered handler, in a stable order
    pub fn allowed_methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.handlers.keys().cloned().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }
}

/// Create a GET route handler
pub fn get<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().get(handler)
}

/// Create a POST route handler
pub fn post<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().post(handler)
}

/// Create a PUT route handler
pub fn put<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().put(handler)
}

/// Create a PATCH route handler
pub fn patch<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().patch(handler)
}

/// Create a DELETE route handler
pub fn delete<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().delete(handler)
}

/// Routing table plus global filters and shared state
pub struct Router {
    inner: MatchitRouter<usize>,
    routes: Vec<MethodRouter>,
    route_index: HashMap<String, usize>,
    /// Keyed by matchit path
    registered_routes: HashMap<String, RouteInfo>,
    state: Arc<Extensions>,
    filters: FilterStack,
}

impl Router {
    /// Create a new router
    pub fn new() -> Self {
        Self {
            inner: MatchitRouter::new(),
            routes: Vec::new(),
            route_index: HashMap::new(),
            registered_routes: HashMap::new(),
            state: Arc::new(Extensions::new()),
            filters: FilterStack::new(),
        }
    }

    /// Add a route
    ///
    /// Registering the same pattern twice merges the method handlers.
    ///
    /// # Panics
    ///
    /// Panics when the route conflicts with one already registered. Use
    /// [`Router::try_route`] to handle the conflict instead.
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        if let Err(err) = self.try_route(path, method_router) {
            panic!("{}", err);
        }
        self
    }

    /// Add a route, reporting conflicts as an error
    pub fn try_route(
        &mut self,
        path: &str,
        method_router: MethodRouter,
    ) -> Result<(), RouteConflictError> {
        let matchit_path = convert_path_params(path);

        if let Some(&existing) = self.route_index.get(&matchit_path) {
            let target = &mut self.routes[existing];
            let existing_path = self
                .registered_routes
                .get(&matchit_path)
                .map(|info| info.path.clone())
                .unwrap_or_else(|| path.to_string());

            if let Some(method) = method_router
                .handlers
                .keys()
                .find(|m| target.handlers.contains_key(*m))
            {
                return Err(RouteConflictError {
                    new_path: path.to_string(),
                    method: Some(method.clone()),
                    existing_path,
                    details: "a handler is already registered for this method".to_string(),
                });
            }

            target.handlers.extend(method_router.handlers);
            let methods = target.allowed_methods();
            if let Some(info) = self.registered_routes.get_mut(&matchit_path) {
                info.methods = methods;
            }
            return Ok(());
        }

        let methods = method_router.allowed_methods();
        let index = self.routes.len();
        match self.inner.insert(matchit_path.clone(), index) {
            Ok(()) => {
                self.routes.push(method_router);
                self.route_index.insert(matchit_path.clone(), index);
                self.registered_routes.insert(
                    matchit_path,
                    RouteInfo {
                        path: path.to_string(),
                        methods,
                    },
                );
                Ok(())
            }
            Err(e) => {
                let existing_path = self
                    .find_conflicting_route(&matchit_path)
                    .map(|info| info.path.clone())
                    .unwrap_or_else(|| "<unknown>".to_string());

                Err(RouteConflictError {
                    new_path: path.to_string(),
                    method: methods.first().cloned(),
                    existing_path,
                    details: e.to_string(),
                })
            }
        }
    }

    fn find_conflicting_route(&self, matchit_path: &str) -> Option<&RouteInfo> {
        let normalized_new = normalize_path_for_comparison(matchit_path);
        self.registered_routes
            .iter()
            .find(|(registered, _)| normalize_path_for_comparison(registered) == normalized_new)
            .map(|(_, info)| info)
    }

    /// Add shared state, readable through the `State` extractor
    pub fn state<S: Clone + Send + Sync + 'static>(mut self, state: S) -> Self {
        Arc::make_mut(&mut self.state).insert(state);
        self
    }

    /// Add a global action filter
    ///
    /// Global filters run around route dispatch, in the order added, so they
    /// also see 404 and 405 responses.
    pub fn layer<F: ActionFilter>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Registered routes keyed by their internal pattern
    pub fn registered_routes(&self) -> &HashMap<String, RouteInfo> {
        &self.registered_routes
    }

    /// Whether a route is registered for the given `{param}` style pattern
    pub fn has_route(&self, path: &str) -> bool {
        self.registered_routes
            .contains_key(&convert_path_params(path))
    }

    fn dispatch(&self, mut req: Request) -> BoxFuture<Response> {
        let (handler, params) = match self.inner.at(req.path()) {
            Ok(matched) => {
                let method_router = &self.routes[*matched.value];
                match method_router.handlers.get(req.method()) {
                    Some(handler) => {
                        let params: HashMap<String, String> = matched
                            .params
                            .iter()
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                            .collect();
                        (Arc::clone(handler), params)
                    }
                    None => {
                        let allowed = method_router.allowed_methods();
                        let method = req.method().clone();
                        return Box::pin(async move { method_not_allowed(&method, &allowed) });
                    }
                }
            }
            Err(_) => {
                let path = req.path().to_string();
                return Box::pin(async move {
                    ApiError::not_found(format!("No route found for {}", path)).into_response()
                });
            }
        };

        req.set_path_params(params);
        handler(req)
    }

    /// Freeze the router into a callable service
    pub fn into_service(self) -> RouterService {
        let state = Arc::clone(&self.state);
        let filters = self.filters.clone();
        let router = Arc::new(self);
        let dispatch: Next = Arc::new(move |req: Request| router.dispatch(req));

        RouterService {
            entry: filters.wrap(dispatch),
            state,
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn method_not_allowed(method: &Method, allowed: &[Method]) -> Response {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let mut response =
        ApiError::method_not_allowed(format!("Method {} not allowed", method)).into_response();
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

/// A frozen router that can be called with requests
#[derive(Clone)]
pub struct RouterService {
    entry: Next,
    state: Arc<Extensions>,
}

impl RouterService {
    /// Run a request through the global filters and the matched handler
    pub fn handle(&self, mut req: Request) -> BoxFuture<Response> {
        req.set_state(Arc::clone(&self.state));
        (self.entry)(req)
    }

    /// Convenience for driving the service with a plain `http::Request`
    pub fn oneshot(&self, req: http::Request<Bytes>) -> BoxFuture<Response> {
        let (parts, body) = req.into_parts();
        self.handle(Request::new(
            parts,
            body,
            Arc::clone(&self.state),
            HashMap::new(),
        ))
    }
}

impl tower::Service<http::Request<Bytes>> for RouterService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<Bytes>) -> Self::Future {
        let fut = self.oneshot(req);
        Box::pin(async move { Ok(fut.await) })
    }
}

/// Convert {param} style to :param for matchit
fn convert_path_params(path: &str) -> String {
    path.chars()
        .filter(|ch| *ch != '}')
        .map(|ch| if ch == '{' { ':' } else { ch })
        .collect()
}

/// Replace parameter names with a placeholder so `:id` and `:user_id` compare equal
fn normalize_path_for_comparison(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut in_param = false;

    for ch in path.chars() {
        match ch {
            ':' => {
                in_param = true;
                result.push_str(":_");
            }
            '/' => {
                in_param = false;
                result.push('/');
            }
            _ if in_param => {}
            _ => result.push(ch),
        }
    }

    result
}
