use std::fmt;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use time::OffsetDateTime;
use url::Url;

use crate::token::TokenResponse;
use crate::{Credentials, Error, ResponseError, Scopes, Token};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME: i64 = 3600;

/// Exchanges signed service-account assertions for access tokens.
///
/// Holds no token state: every call to [`fetch_token`] runs the full flow.
///
/// [`fetch_token`]: ServiceAccount::fetch_token
#[derive(Clone)]
pub struct ServiceAccount {
    client: reqwest::Client,
    token_uri: Url,
    scopes: Scopes,
    subject: Option<Box<str>>,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("token_uri", &self.token_uri.as_str())
            .field("scopes", &self.scopes)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    pub fn new(client: reqwest::Client, token_uri: Url) -> Self {
        Self {
            client,
            token_uri,
            scopes: Scopes::default(),
            subject: None,
        }
    }

    pub fn with_scopes(mut self, scopes: Scopes) -> Self {
        self.scopes = scopes;
        self
    }

    /// Impersonate `subject` (domain-wide delegation).
    pub fn with_subject(mut self, subject: impl Into<Box<str>>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn token_uri(&self) -> &Url {
        &self.token_uri
    }

    pub fn scopes(&self) -> Scopes {
        self.scopes
    }

    /// Signs a fresh assertion and exchanges it for an access token.
    pub async fn fetch_token(&self, credentials: &Credentials) -> crate::Result<Token> {
        let assertion = self.encode_assertion(credentials, OffsetDateTime::now_utc())?;

        debug!(
            token_uri = %self.token_uri,
            account = credentials.service_account(),
            "requesting access token"
        );

        let response = self
            .client
            .post(self.token_uri.clone())
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let error = ResponseError::from_response(response).await?;
            warn!(%error, "token exchange rejected");
            return Err(error.into());
        }

        let bytes = response.bytes().await?;
        let received_at = OffsetDateTime::now_utc();
        let body: TokenResponse = serde_json::from_slice(&bytes)?;

        let token = Token::from_response(body, received_at)?;
        debug!(expires_at = %token.expires_at(), "access token issued");
        Ok(token)
    }

    fn encode_assertion(
        &self,
        credentials: &Credentials,
        now: OffsetDateTime,
    ) -> crate::Result<String> {
        let key = credentials.private_key();
        let encoding_key = EncodingKey::from_rsa_pem(key.pem()).map_err(Error::InvalidKey)?;

        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.key_id().map(str::to_owned);

        let claims = Claims::new(self, credentials, now);
        jsonwebtoken::encode(&header, &claims, &encoding_key).map_err(Error::Sign)
    }
}

#[derive(serde::Serialize)]
struct Claims<'a> {
    iss: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<&'a str>,
    #[serde(serialize_with = "crate::scope::serialize_scope_uris")]
    scope: Scopes,
}

impl<'a> Claims<'a> {
    fn new(svc: &'a ServiceAccount, credentials: &'a Credentials, now: OffsetDateTime) -> Self {
        let iat = now.unix_timestamp();

        Self {
            iss: credentials.service_account(),
            aud: svc.token_uri.as_str(),
            exp: iat + ASSERTION_LIFETIME,
            iat,
            sub: svc.subject.as_deref(),
            scope: svc.scopes,
        }
    }
}
