//! Model binding and validation redirects
//!
//! [`BindModel`] deserializes the request into a model, validates it and
//! records the outcome as a [`ModelState`]. [`IfModelIsInvalid`] then
//! redirects away when that state is invalid. Attach them so binding runs
//! first:
//!
//! ```rust,ignore
//! let route = post(create_order)
//!     .filter(IfModelIsInvalid::to_page("/orders/new"))
//!     .filter(BindModel::<NewOrder>::new());
//! ```

use crate::error::FilterConfigError;
use http::{header, Method};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use validator::Validate;
use webassist_core::{
    ActionFilter, BoxFuture, IntoResponse, ModelState, Next, RedirectToRoute, Request, RequestExt,
    Response, RouteValues,
};

/// Field name used for errors that are not tied to a model field
const BODY_FIELD: &str = "$body";

/// Bind and validate a request model of type `T`
///
/// JSON bodies and `application/x-www-form-urlencoded` bodies are supported;
/// `GET` and `HEAD` requests without a body bind from the query string. On
/// success the model is inserted into the request extensions, readable with
/// `Extension<T>`. The [`ModelState`] is always inserted.
pub struct BindModel<T> {
    _model: PhantomData<fn() -> T>,
}

impl<T> BindModel<T> {
    /// Create the filter
    pub fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<T> Default for BindModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BindModel<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

enum Source<'a> {
    Json(&'a [u8]),
    Form(&'a [u8]),
    Query(&'a str),
}

fn source(req: &Request) -> Source<'_> {
    let body = req.body().map(|b| &b[..]).unwrap_or_default();
    let is_form = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if body.is_empty() && matches!(*req.method(), Method::GET | Method::HEAD) {
        Source::Query(req.query_string().unwrap_or_default())
    } else if is_form {
        Source::Form(body)
    } else {
        Source::Json(body)
    }
}

fn bind<T: DeserializeOwned>(req: &Request) -> Result<T, String> {
    match source(req) {
        Source::Json(body) => serde_json::from_slice(body).map_err(|e| e.to_string()),
        Source::Form(body) => serde_urlencoded::from_bytes(body).map_err(|e| e.to_string()),
        Source::Query(query) => serde_urlencoded::from_str(query).map_err(|e| e.to_string()),
    }
}

impl<T> ActionFilter for BindModel<T>
where
    T: DeserializeOwned + Validate + Clone + Send + Sync + 'static,
{
    fn call(&self, mut req: Request, next: Next) -> BoxFuture<Response> {
        let mut state = req.model_state().cloned().unwrap_or_default();

        match bind::<T>(&req) {
            Ok(model) => {
                if let Err(errors) = model.validate() {
                    for error in ModelState::from_validation_errors(&errors).errors() {
                        state.add_error(error.field.clone(), error.code.clone(), error.message.clone());
                    }
                }
                req.extensions_mut().insert(model);
            }
            Err(message) => {
                tracing::debug!(
                    model = std::any::type_name::<T>(),
                    error = %message,
                    "Model binding failed"
                );
                state.add_error(BODY_FIELD, "parse", message);
            }
        }

        req.extensions_mut().insert(state);
        next(req)
    }

    fn clone_box(&self) -> Box<dyn ActionFilter> {
        Box::new(self.clone())
    }
}

/// Where [`IfModelIsInvalid`] sends the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// A page path
    Page(String),
    /// A conventional controller action
    Action {
        /// Controller name
        controller: String,
        /// Action name
        action: String,
    },
}

impl RedirectTarget {
    /// Route values describing the target
    pub fn route_values(&self) -> RouteValues {
        match self {
            RedirectTarget::Page(page) => RouteValues::page(page.clone()),
            RedirectTarget::Action { controller, action } => {
                RouteValues::action(controller.clone(), action.clone())
            }
        }
    }
}

/// Redirect when the request's [`ModelState`] is invalid
///
/// A request without model state counts as valid.
#[derive(Debug, Clone)]
pub struct IfModelIsInvalid {
    target: RedirectTarget,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl IfModelIsInvalid {
    /// Redirect to a page
    pub fn to_page(page: impl Into<String>) -> Self {
        Self {
            target: RedirectTarget::Page(page.into()),
        }
    }

    /// Redirect to a controller action
    pub fn to_action(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            target: RedirectTarget::Action {
                controller: controller.into(),
                action: action.into(),
            },
        }
    }

    /// Build from optional parts
    ///
    /// A non-blank page wins over the controller/action pair. Fails when
    /// neither the page nor both of controller and action are set; blank
    /// strings count as unset.
    pub fn new(
        redirect_to_page: Option<&str>,
        redirect_to_controller: Option<&str>,
        redirect_to_action: Option<&str>,
    ) -> Result<Self, FilterConfigError> {
        if let Some(page) = non_blank(redirect_to_page) {
            return Ok(Self::to_page(page));
        }
        match (non_blank(redirect_to_controller), non_blank(redirect_to_action)) {
            (Some(controller), Some(action)) => Ok(Self::to_action(controller, action)),
            _ => Err(FilterConfigError::MissingRedirectTarget),
        }
    }

    /// The redirect target
    pub fn target(&self) -> &RedirectTarget {
        &self.target
    }
}

impl ActionFilter for IfModelIsInvalid {
    fn call(&self, req: Request, next: Next) -> BoxFuture<Response> {
        let invalid = req.model_state().is_some_and(|state| !state.is_valid());
        if !invalid {
            return next(req);
        }

        tracing::debug!(path = %req.path(), redirect = ?self.target, "Model invalid, redirecting");
        let redirect = RedirectToRoute::new(self.target.route_values());
        Box::pin(async move { redirect.into_response() })
    }

    fn clone_box(&self) -> Box<dyn ActionFilter> {
        Box::new(self.clone())
    }
}
