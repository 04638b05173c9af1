use gcp_service_account::{DEFAULT_TOKEN_URI, Scopes};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Everything about a [`Client`] that isn't a credential.
///
/// Endpoints are configurable so the whole stack can be pointed at a local
/// stand-in for the service.
///
/// [`Client`]: crate::Client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub token_uri: String,
    pub scopes: Scopes,
    /// Ignored when `http_client` is set.
    pub user_agent: String,
    pub use_legacy_sql: bool,
    /// Use this client instead of building one.
    pub http_client: Option<reqwest::Client>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            token_uri: DEFAULT_TOKEN_URI.to_owned(),
            scopes: Scopes::default(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            use_legacy_sql: false,
            http_client: None,
        }
    }
}

impl ClientOptions {
    pub fn with_endpoints(base_url: impl Into<String>, token_uri: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token_uri: token_uri.into(),
            ..Self::default()
        }
    }

    pub(crate) fn parse_base_url(&self) -> Result<Url, ConfigError> {
        let url = parse_url("base url", &self.base_url)?;

        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                name: "base url",
                value: Box::from(self.base_url.as_str()),
                reason: Box::from("not a base url"),
            });
        }

        Ok(url)
    }

    pub(crate) fn parse_token_uri(&self) -> Result<Url, ConfigError> {
        parse_url("token uri", &self.token_uri)
    }

    pub(crate) fn build_http_client(&self) -> Result<reqwest::Client, ConfigError> {
        match self.http_client {
            Some(ref client) => Ok(client.clone()),
            None => reqwest::Client::builder()
                .user_agent(self.user_agent.as_str())
                .build()
                .map_err(ConfigError::HttpClient),
        }
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|err| ConfigError::InvalidUrl {
        name,
        value: Box::from(value),
        reason: err.to_string().into_boxed_str(),
    })
}
