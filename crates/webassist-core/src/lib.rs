//! # webassist-core
//!
//! Foundational types for the webassist helper collection.
//!
//! This crate is not meant to be used directly. Use `webassist` instead.
//!
//! It provides the request wrapper that action filters operate on, the
//! filter pipeline itself, a small in-process router that minimal API
//! endpoints map their routes onto, and the request/response extension
//! traits.

mod error;
mod extract;
pub mod endpoint;
pub mod ext;
pub mod filter;
pub mod form_file;
mod handler;
pub mod introspection;
mod model_state;
mod request;
mod response;
mod router;
pub mod serializer;
pub mod session;
pub mod temp_data;

// Used by `register_endpoint!` and `register_action!`
#[doc(hidden)]
pub use inventory;

// Public API
pub use endpoint::{EndpointCollection, EndpointRegistration, EndpointRouterExt, MinimalApiEndpoint};
pub use error::{get_environment, ApiError, Environment, FieldError, Result};
pub use ext::{ConnectionInfo, HostInfo, RequestExt, ResponseExt};
pub use extract::{Body, Extension, FromRequest, FromRequestParts, Json, PathParams, Query, State};
pub use filter::{ActionFilter, BoxFuture, FilterStack, Next, RequestId, RequestIdFilter, REQUEST_ID_HEADER};
pub use form_file::{Form, FormFile};
pub use handler::Handler;
pub use introspection::{controllers_info, controllers_info_in, group_controllers, ActionDescriptor, ActionInfo, ControllerInfo};
pub use model_state::ModelState;
pub use request::Request;
pub use response::{IntoResponse, Redirect, RedirectToRoute, Response, RouteValues};
pub use router::{delete, get, patch, post, put, MethodRouter, RouteConflictError, RouteInfo, Router, RouterService};
pub use serializer::{JsonObjectSerializer, JsonOptions, ObjectSerializer};
pub use session::{MemorySessionStore, Session, SessionFilter, DEFAULT_SESSION_COOKIE};
pub use temp_data::TempData;
