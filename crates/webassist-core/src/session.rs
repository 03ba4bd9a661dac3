//! Cookie-keyed in-memory sessions
//!
//! [`SessionFilter`] looks up the session named by the session cookie in a
//! [`MemorySessionStore`], attaches it to the request, and issues a new
//! cookie when it had to create a fresh session.

use crate::error::{ApiError, Result};
use crate::extract::FromRequestParts;
use crate::filter::{ActionFilter, BoxFuture, Next};
use crate::request::Request;
use crate::response::Response;
use bytes::Bytes;
use cookie::Cookie;
use dashmap::DashMap;
use http::header;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default session cookie name
pub const DEFAULT_SESSION_COOKIE: &str = "webassist.session";

/// Default idle timeout
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// A concurrent key/value bag scoped to one client
///
/// Clones share the same storage.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    values: Arc<DashMap<String, Bytes>>,
}

impl Session {
    /// Create an empty detached session
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            values: Arc::new(DashMap::new()),
        }
    }

    /// The session identifier carried in the cookie
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw bytes stored under `key`
    pub fn try_get_value(&self, key: &str) -> Option<Bytes> {
        self.values.get(key).map(|v| v.value().clone())
    }

    /// Store raw bytes under `key`
    pub fn set(&self, key: impl Into<String>, value: impl Into<Bytes>) {
        self.values.insert(key.into(), value.into());
    }

    /// Remove `key`, returning its previous value
    pub fn remove(&self, key: &str) -> Option<Bytes> {
        self.values.remove(key).map(|(_, v)| v)
    }

    /// Whether `key` is set
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove every value
    pub fn clear(&self) {
        self.values.clear();
    }

    /// Keys currently set
    pub fn keys(&self) -> Vec<String> {
        self.values.iter().map(|e| e.key().clone()).collect()
    }

    /// Read a value as UTF-8 text
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.try_get_value(key)
            .and_then(|v| String::from_utf8(v.to_vec()).ok())
    }

    /// Store `value` as UTF-8 text
    pub fn set_string(&self, key: impl Into<String>, value: &str) {
        self.set(key, Bytes::copy_from_slice(value.as_bytes()));
    }

    /// Deserialize a JSON value; `None` when missing or malformed
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.try_get_value(key)
            .and_then(|v| serde_json::from_slice(&v).ok())
    }

    /// Serialize a value as JSON
    pub fn set_json<T: Serialize + ?Sized>(
        &self,
        key: impl Into<String>,
        value: &T,
    ) -> std::result::Result<(), serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes);
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl FromRequestParts for Session {
    fn from_request_parts(req: &Request) -> Result<Self> {
        req.extensions().get::<Session>().cloned().ok_or_else(|| {
            ApiError::internal("Session not available. Did you forget to add SessionFilter?")
        })
    }
}

#[derive(Debug)]
struct StoredSession {
    session: Session,
    last_access: Instant,
}

/// In-memory session store with an idle timeout
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<DashMap<String, StoredSession>>,
    idle_timeout: Duration,
}

impl MemorySessionStore {
    /// Store with the default idle timeout
    pub fn new() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    /// Store expiring sessions idle for longer than `idle_timeout`
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            idle_timeout,
        }
    }

    /// Load the live session with `id`, or start a new one
    ///
    /// The returned flag is `true` when a new session was created.
    pub fn load_or_create(&self, id: Option<&str>) -> (Session, bool) {
        let now = Instant::now();

        if let Some(id) = id {
            if let Some(mut entry) = self.sessions.get_mut(id) {
                if now.duration_since(entry.last_access) <= self.idle_timeout {
                    entry.last_access = now;
                    return (entry.session.clone(), false);
                }
            }
            if self.sessions.remove(id).is_some() {
                tracing::debug!(session_id = %id, "Session expired");
            }
        }

        let session = Session::new();
        self.sessions.insert(
            session.id().to_string(),
            StoredSession {
                session: session.clone(),
                last_access: now,
            },
        );
        (session, true)
    }

    /// Drop every session idle for longer than the timeout
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, stored| now.duration_since(stored.last_access) <= self.idle_timeout);
        before - self.sessions.len()
    }

    /// Number of live or not yet purged sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no session
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter that attaches a [`Session`] to each request
#[derive(Debug, Clone)]
pub struct SessionFilter {
    store: MemorySessionStore,
    cookie_name: String,
}

impl SessionFilter {
    /// Attach sessions from `store` using the default cookie name
    pub fn new(store: MemorySessionStore) -> Self {
        Self {
            store,
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
        }
    }

    /// Use a different cookie name
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }
}

impl ActionFilter for SessionFilter {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture<Response> {
        let cookie_name = self.cookie_name.clone();
        let existing = req
            .headers()
            .get(header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|cookies| {
                Cookie::split_parse(cookies)
                    .filter_map(|c| c.ok())
                    .find(|c| c.name() == cookie_name)
                    .map(|c| c.value().to_string())
            });

        let (session, created) = self.store.load_or_create(existing.as_deref());
        let session_id = session.id().to_string();
        req.extensions_mut().insert(session);

        Box::pin(async move {
            let mut response = next(req).await;

            if created {
                let cookie = Cookie::build((cookie_name, session_id))
                    .path("/")
                    .http_only(true)
                    .build();
                match cookie.to_string().parse() {
                    Ok(value) => {
                        response.headers_mut().append(header::SET_COOKIE, value);
                    }
                    Err(err) => tracing::warn!(error = %err, "Failed to encode session cookie"),
                }
            }

            response
        })
    }

    fn clone_box(&self) -> Box<dyn ActionFilter> {
        Box::new(self.clone())
    }
}
