//! Redirect when the session no longer holds a required key

use webassist_core::{
    ActionFilter, BoxFuture, IntoResponse, Next, RedirectToRoute, Request, RequestExt, Response,
    RouteValues,
};

/// Redirect to a controller action when `session_key` is absent from the session
///
/// A request without a session (no `SessionFilter` upstream) is treated as
/// timed out.
///
/// ```rust,ignore
/// Router::new()
///     .layer(SessionFilter::new(MemorySessionStore::new()))
///     .route("/orders", get(list_orders).filter(SessionTimeout::new("user_id", "Login", "Account")));
/// ```
#[derive(Debug, Clone)]
pub struct SessionTimeout {
    session_key: String,
    action: String,
    controller: String,
}

impl SessionTimeout {
    /// Create the filter; the argument order is key, action, controller
    pub fn new(
        session_key: impl Into<String>,
        action: impl Into<String>,
        controller: impl Into<String>,
    ) -> Self {
        Self {
            session_key: session_key.into(),
            action: action.into(),
            controller: controller.into(),
        }
    }

    /// Route values of the redirect target
    pub fn route_values(&self) -> RouteValues {
        RouteValues::action(self.controller.clone(), self.action.clone())
    }
}

impl ActionFilter for SessionTimeout {
    fn call(&self, req: Request, next: Next) -> BoxFuture<Response> {
        let alive = req
            .session()
            .is_some_and(|session| session.contains_key(&self.session_key));

        if alive {
            return next(req);
        }

        tracing::debug!(
            session_key = %self.session_key,
            controller = %self.controller,
            action = %self.action,
            "Session timed out, redirecting"
        );
        let redirect = RedirectToRoute::new(self.route_values());
        Box::pin(async move { redirect.into_response() })
    }

    fn clone_box(&self) -> Box<dyn ActionFilter> {
        Box::new(self.clone())
    }
}
