//! Client settings from the environment

use crate::client::PipelineClient;
use crate::error::ClientError;
use http::header::{HeaderValue, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
struct RawClientConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

/// Settings applied to a [`PipelineClient`]
///
/// Read from `WEBASSIST_CLIENT_BASE_URL`, `WEBASSIST_CLIENT_TIMEOUT_SECS`
/// and `WEBASSIST_CLIENT_USER_AGENT`. Values are validated on load, so
/// [`apply`](Self::apply) cannot fail and fits a factory's `configure`
/// callback:
///
/// ```rust,ignore
/// let config = ClientConfig::from_env()?;
/// let client = factory.create_client_with(handlers, |c| config.apply(c));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientConfig {
    /// Base address for relative URLs
    pub base_url: Option<Url>,
    /// Whole-pipeline timeout
    pub timeout: Option<Duration>,
    /// Default `User-Agent`
    pub user_agent: Option<HeaderValue>,
}

impl ClientConfig {
    /// Prefix of every variable read
    pub const ENV_PREFIX: &'static str = "WEBASSIST_CLIENT_";

    /// Load `.env` if present, then read the environment
    pub fn from_env() -> Result<Self, ClientError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_env_vars()
    }

    /// Read the environment without touching `.env`
    pub fn from_env_vars() -> Result<Self, ClientError> {
        let raw: RawClientConfig = envy::prefixed(Self::ENV_PREFIX)
            .from_env()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Self::validate(raw)
    }

    fn validate(raw: RawClientConfig) -> Result<Self, ClientError> {
        let base_url = raw
            .base_url
            .map(|url| Url::parse(&url).map_err(|e| ClientError::InvalidUri(format!("{}: {}", url, e))))
            .transpose()?;
        let user_agent = raw.user_agent.map(HeaderValue::try_from).transpose()?;

        Ok(Self {
            base_url,
            timeout: raw.timeout_secs.map(Duration::from_secs),
            user_agent,
        })
    }

    /// Copy every set value onto `client`
    pub fn apply(&self, client: &mut PipelineClient) {
        if let Some(base) = &self.base_url {
            client.set_base_address(base.clone());
        }
        if let Some(timeout) = self.timeout {
            client.set_timeout(timeout);
        }
        if let Some(agent) = &self.user_agent {
            client.default_headers_mut().insert(USER_AGENT, agent.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{HttpClientFactory, PipelineClientFactory};
    use serial_test::serial;

    const VARS: [&str; 3] = [
        "WEBASSIST_CLIENT_BASE_URL",
        "WEBASSIST_CLIENT_TIMEOUT_SECS",
        "WEBASSIST_CLIENT_USER_AGENT",
    ];

    fn clear() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn empty_environment_gives_empty_config() {
        clear();
        assert_eq!(ClientConfig::from_env_vars().unwrap(), ClientConfig::default());
    }

    #[test]
    #[serial]
    fn reads_and_applies_prefixed_variables() {
        clear();
        std::env::set_var("WEBASSIST_CLIENT_BASE_URL", "https://api.example.com/");
        std::env::set_var("WEBASSIST_CLIENT_TIMEOUT_SECS", "12");
        std::env::set_var("WEBASSIST_CLIENT_USER_AGENT", "webassist/0.1");

        let config = ClientConfig::from_env_vars().unwrap();
        clear();
        assert_eq!(config.timeout, Some(Duration::from_secs(12)));

        let client = PipelineClientFactory::new().create_client_with(Vec::new(), |c| config.apply(c));
        assert_eq!(client.base_address().map(Url::as_str), Some("https://api.example.com/"));
        assert_eq!(client.timeout(), Some(Duration::from_secs(12)));
        assert_eq!(client.default_headers()[USER_AGENT], "webassist/0.1");
    }

    #[test]
    #[serial]
    fn invalid_values_are_rejected() {
        clear();
        std::env::set_var("WEBASSIST_CLIENT_BASE_URL", "not a url");
        assert!(matches!(ClientConfig::from_env_vars(), Err(ClientError::InvalidUri(_))));

        clear();
        std::env::set_var("WEBASSIST_CLIENT_TIMEOUT_SECS", "soon");
        assert!(matches!(ClientConfig::from_env_vars(), Err(ClientError::Config(_))));
        clear();
    }
}
