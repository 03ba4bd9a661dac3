//! Filters attached to routes of a real router

use bytes::Bytes;
use http::{header, Method, StatusCode};
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use validator::Validate;
use webassist_core::{
    get, post, Extension, MemorySessionStore, ResponseExt, Router, RouterService, Session, SessionFilter, State,
};
use webassist_filters::{AjaxOnly, AsyncLock, BindModel, IfModelIsInvalid, LoggingFilter, SessionTimeout, SingleFlight};

#[derive(Debug, Clone, Deserialize, Validate)]
struct Signup {
    #[validate(email)]
    email: String,
}

#[derive(Clone, Default)]
struct Counters {
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

async fn signup(Extension(model): Extension<Signup>) -> String {
    format!("welcome {}", model.email)
}

async fn login(session: Session) -> &'static str {
    session.set_string("user_id", "7");
    "logged in"
}

async fn dashboard() -> &'static str {
    "dashboard"
}

async fn search() -> &'static str {
    "[]"
}

async fn import(State(counters): State<Counters>) -> &'static str {
    let now = counters.running.fetch_add(1, Ordering::SeqCst) + 1;
    counters.peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    counters.running.fetch_sub(1, Ordering::SeqCst);
    "imported"
}

fn app(counters: Counters) -> RouterService {
    Router::new()
        .state(counters)
        .layer(SessionFilter::new(MemorySessionStore::new()))
        .layer(LoggingFilter::new())
        .route(
            "/signup",
            post(signup)
                .filter(IfModelIsInvalid::to_page("/signup/retry"))
                .filter(BindModel::<Signup>::new()),
        )
        .route("/login", post(login))
        .route(
            "/dashboard",
            get(dashboard).filter(SessionTimeout::new("user_id", "Login", "Account")),
        )
        .route("/search", get(search).filter(AjaxOnly))
        .route("/import", post(import).filter(AsyncLock::new(SingleFlight::new())))
        .into_service()
}

fn request(method: Method, uri: &str) -> http::request::Builder {
    http::Request::builder().method(method).uri(uri)
}

#[tokio::test]
async fn invalid_model_redirects_and_valid_model_reaches_handler() {
    let app = app(Counters::default());

    let bad = request(Method::POST, "/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Bytes::from_static(br#"{"email":"nope"}"#))
        .unwrap();
    let response = app.oneshot(bad).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/signup/retry");

    let good = request(Method::POST, "/signup")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Bytes::from_static(b"email=a%40b.io"))
        .unwrap();
    let response = app.oneshot(good).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.read_body_as_string().await, "welcome a@b.io");
}

#[tokio::test]
async fn session_timeout_redirects_until_logged_in() {
    let app = app(Counters::default());

    let response = app.oneshot(request(Method::GET, "/dashboard").body(Bytes::new()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/Account/Login");
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let login = request(Method::POST, "/login")
        .header(header::COOKIE, &cookie)
        .body(Bytes::new())
        .unwrap();
    assert_eq!(app.oneshot(login).await.status(), StatusCode::OK);

    let again = request(Method::GET, "/dashboard")
        .header(header::COOKIE, &cookie)
        .body(Bytes::new())
        .unwrap();
    let response = app.oneshot(again).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.read_body_as_string().await, "dashboard");
}

#[tokio::test]
async fn ajax_only_route() {
    let app = app(Counters::default());

    let plain = request(Method::GET, "/search").body(Bytes::new()).unwrap();
    assert_eq!(app.oneshot(plain).await.status(), StatusCode::BAD_REQUEST);

    let ajax = request(Method::GET, "/search")
        .header("X-Requested-With", "XMLHttpRequest")
        .body(Bytes::new())
        .unwrap();
    assert_eq!(app.oneshot(ajax).await.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn locked_route_runs_one_request_at_a_time() {
    let counters = Counters::default();
    let app = app(counters.clone());

    let calls: Vec<_> = (0..20)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                app.oneshot(request(Method::POST, "/import").body(Bytes::new()).unwrap())
                    .await
                    .status()
            })
        })
        .collect();
    for call in calls {
        assert_eq!(call.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(counters.peak.load(Ordering::SeqCst), 1);
}
