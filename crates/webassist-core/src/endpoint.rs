//! Minimal API endpoint discovery
//!
//! Endpoints are types that map one or more routes onto a [`Router`].
//! They register themselves at link time with [`register_endpoint!`], are
//! collected into an [`EndpointCollection`], and are instantiated fresh each
//! time the collection is applied to a router.
//!
//! ```rust,ignore
//! use webassist_core::{get, register_endpoint, MinimalApiEndpoint, Router};
//!
//! #[derive(Default)]
//! struct HealthEndpoint;
//!
//! impl MinimalApiEndpoint for HealthEndpoint {
//!     fn handle_endpoint(&self, router: Router) -> Router {
//!         router.route("/health", get(|| async { "ok" }))
//!     }
//! }
//!
//! register_endpoint!(HealthEndpoint);
//!
//! let endpoints = EndpointCollection::new().add_minimal_api_endpoints();
//! let router = Router::new().use_minimal_api_endpoints(&endpoints);
//! ```

use crate::router::Router;

/// A type that maps its routes onto a router
pub trait MinimalApiEndpoint: Send + Sync + 'static {
    /// Map this endpoint's routes onto `router`
    fn handle_endpoint(&self, router: Router) -> Router;
}

/// Link-time registration record created by [`register_endpoint!`]
///
/// The name is resolved from the type itself, so a type registered through
/// the macro and added with [`EndpointCollection::add_endpoint`] is the same
/// entry regardless of where the macro was invoked.
#[derive(Clone, Copy)]
pub struct EndpointRegistration {
    name: fn() -> &'static str,
    create: fn() -> Box<dyn MinimalApiEndpoint>,
}

impl EndpointRegistration {
    /// Registration record for the endpoint type `E`
    pub const fn of<E: MinimalApiEndpoint + Default>() -> Self {
        Self {
            name: std::any::type_name::<E>,
            create: __create_endpoint::<E>,
        }
    }

    /// Fully qualified type name of the endpoint
    pub fn name(&self) -> &'static str {
        (self.name)()
    }

    /// Create a new endpoint instance
    pub fn create(&self) -> Box<dyn MinimalApiEndpoint> {
        (self.create)()
    }
}

impl std::fmt::Debug for EndpointRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointRegistration")
            .field("name", &self.name())
            .finish()
    }
}

inventory::collect!(EndpointRegistration);

#[doc(hidden)]
pub fn __create_endpoint<E: MinimalApiEndpoint + Default>() -> Box<dyn MinimalApiEndpoint> {
    Box::new(E::default())
}

/// Register an endpoint type for discovery
///
/// The type must implement [`MinimalApiEndpoint`] and `Default`.
#[macro_export]
macro_rules! register_endpoint {
    ($endpoint:ty) => {
        $crate::inventory::submit! {
            $crate::EndpointRegistration::of::<$endpoint>()
        }
    };
}

/// The set of endpoint types to instantiate
#[derive(Debug, Clone, Default)]
pub struct EndpointCollection {
    registrations: Vec<EndpointRegistration>,
}

impl EndpointCollection {
    /// An empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every endpoint registered with [`register_endpoint!`]
    ///
    /// Endpoints are ordered by type name. Adding twice is harmless.
    pub fn add_minimal_api_endpoints(mut self) -> Self {
        for registration in inventory::iter::<EndpointRegistration> {
            self.insert(*registration);
        }
        self.registrations.sort_by_key(EndpointRegistration::name);
        tracing::debug!(count = self.registrations.len(), "Discovered minimal API endpoints");
        self
    }

    /// Add a single endpoint type without link-time registration
    pub fn add_endpoint<E: MinimalApiEndpoint + Default>(mut self) -> Self {
        self.insert(EndpointRegistration::of::<E>());
        self
    }

    fn insert(&mut self, registration: EndpointRegistration) {
        if !self.registrations.iter().any(|r| r.name() == registration.name()) {
            self.registrations.push(registration);
        }
    }

    /// Names of the collected endpoints, in application order
    pub fn names(&self) -> Vec<&'static str> {
        self.registrations.iter().map(EndpointRegistration::name).collect()
    }

    /// Number of collected endpoints
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether no endpoint has been collected
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Create a fresh instance of every endpoint
    pub fn create_all(&self) -> Vec<Box<dyn MinimalApiEndpoint>> {
        self.registrations.iter().map(EndpointRegistration::create).collect()
    }
}

/// Applies collected endpoints to a router
pub trait EndpointRouterExt {
    /// Create and map every endpoint in `endpoints`, in collection order
    fn use_minimal_api_endpoints(self, endpoints: &EndpointCollection) -> Self;
}

impl EndpointRouterExt for Router {
    fn use_minimal_api_endpoints(self, endpoints: &EndpointCollection) -> Self {
        endpoints
            .registrations
            .iter()
            .fold(self, |router, registration| {
                tracing::debug!(endpoint = registration.name(), "Mapping endpoint");
                registration.create().handle_endpoint(router)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::get;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CREATED: AtomicUsize = AtomicUsize::new(0);

    struct CountingEndpoint;

    impl Default for CountingEndpoint {
        fn default() -> Self {
            CREATED.fetch_add(1, Ordering::SeqCst);
            Self
        }
    }

    impl MinimalApiEndpoint for CountingEndpoint {
        fn handle_endpoint(&self, router: Router) -> Router {
            router.route("/counting", get(|| async { "counted" }))
        }
    }

    #[derive(Default)]
    struct AlphaEndpoint;

    impl MinimalApiEndpoint for AlphaEndpoint {
        fn handle_endpoint(&self, router: Router) -> Router {
            router.route("/alpha", get(|| async { "alpha" }))
        }
    }

    mod health {
        use super::*;

        #[derive(Default)]
        pub struct HealthEndpoint;

        impl MinimalApiEndpoint for HealthEndpoint {
            fn handle_endpoint(&self, router: Router) -> Router {
                router.route("/health", get(|| async { "ok" }))
            }
        }
    }

    use health::HealthEndpoint;

    crate::register_endpoint!(CountingEndpoint);
    crate::register_endpoint!(AlphaEndpoint);
    crate::register_endpoint!(HealthEndpoint);

    #[test]
    fn discovers_registered_endpoints_in_name_order() {
        let endpoints = EndpointCollection::new()
            .add_minimal_api_endpoints()
            .add_minimal_api_endpoints();
        let names = endpoints.names();

        let alpha = names.iter().position(|n| n.ends_with("::AlphaEndpoint")).unwrap();
        let counting = names.iter().position(|n| n.ends_with("::CountingEndpoint")).unwrap();
        assert!(alpha < counting);
        assert_eq!(names.iter().filter(|n| n.ends_with("::AlphaEndpoint")).count(), 1);

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn each_use_creates_fresh_instances() {
        let endpoints = EndpointCollection::new().add_endpoint::<CountingEndpoint>();
        let before = CREATED.load(Ordering::SeqCst);

        let first = Router::new().use_minimal_api_endpoints(&endpoints);
        let second = Router::new().use_minimal_api_endpoints(&endpoints);

        assert!(CREATED.load(Ordering::SeqCst) >= before + 2);
        assert!(first.has_route("/counting"));
        assert!(second.has_route("/counting"));
    }

    #[test]
    fn imported_endpoint_is_named_after_its_defining_module() {
        let endpoints = EndpointCollection::new()
            .add_minimal_api_endpoints()
            .add_endpoint::<HealthEndpoint>();
        let health: Vec<_> = endpoints
            .names()
            .into_iter()
            .filter(|n| n.ends_with("::HealthEndpoint"))
            .collect();

        assert_eq!(health, vec![std::any::type_name::<HealthEndpoint>()]);
        assert!(health[0].contains("::health::"));

        let router = Router::new().use_minimal_api_endpoints(&endpoints);
        assert!(router.has_route("/health"));
    }
}
