use std::sync::Arc;

use gcp_service_account::{Credentials, ServiceAccount, Token};
use url::Url;

use crate::config::ClientOptions;
use crate::connection::Connection;

/// Runs the assertion flow and builds connections bound to the result.
///
/// Stateless between calls: each [`authenticate`](Self::authenticate) signs a
/// new assertion and exchanges it from scratch.
#[derive(Debug, Clone)]
pub struct AuthSession {
    service_account: ServiceAccount,
    http: reqwest::Client,
    base_url: Url,
}

impl AuthSession {
    pub fn new(options: &ClientOptions) -> crate::Result<Self> {
        let http = options.build_http_client()?;
        let base_url = options.parse_base_url()?;
        let token_uri = options.parse_token_uri()?;

        let service_account =
            ServiceAccount::new(http.clone(), token_uri).with_scopes(options.scopes);

        Ok(Self {
            service_account,
            http,
            base_url,
        })
    }

    /// All or nothing: either a fresh, unexpired token with a connection
    /// bound to it, or an error.
    pub async fn authenticate(&self, credentials: &Credentials) -> crate::Result<Session> {
        let token = self
            .service_account
            .fetch_token(credentials)
            .await?
            .ensure_live()?;

        let connection = Connection::new(
            self.http.clone(),
            self.base_url.clone(),
            credentials.project_id(),
            &token,
        );

        Ok(Session {
            token,
            connection: Arc::new(connection),
        })
    }
}

/// A token and the connection bound to it. Replaced wholesale on expiry.
#[derive(Debug)]
pub struct Session {
    token: Token,
    connection: Arc<Connection>,
}

impl Session {
    #[inline]
    pub fn token(&self) -> &Token {
        &self.token
    }

    #[inline]
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.token.is_expired()
    }
}
