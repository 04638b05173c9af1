use std::fmt;

use time::{Duration, OffsetDateTime};

use crate::Error;

// tokens that live long enough get 10 seconds shaved off, as a buffer
const REFRESH_BUFFER: Duration = Duration::seconds(10);
const MIN_BUFFERED_LIFETIME: i64 = 20;

/// Wire form of a successful token exchange.
#[derive(serde::Deserialize)]
pub(crate) struct TokenResponse {
    access_token: Box<str>,
    expires_in: i64,
    #[serde(default)]
    token_type: Option<Box<str>>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"...") // dont log tokens
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// A bearer access token. Never mutated; an expired token is replaced.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    access_token: Box<str>,
    expires_at: OffsetDateTime,
}

impl Token {
    pub fn new(access_token: impl Into<Box<str>>, expires_at: OffsetDateTime) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// `received_at` is when the response arrived, not when it was requested.
    pub(crate) fn from_response(
        response: TokenResponse,
        received_at: OffsetDateTime,
    ) -> Result<Self, Error> {
        if response.expires_in <= 0 {
            return Err(Error::ExpiredOnArrival(response.expires_in));
        }

        if let Some(token_type) = response.token_type.as_deref() {
            if !token_type.eq_ignore_ascii_case("bearer") {
                warn!(token_type, "unexpected token type, treating it as a bearer token");
            }
        }

        let mut lifetime = Duration::seconds(response.expires_in);
        if response.expires_in > MIN_BUFFERED_LIFETIME {
            lifetime -= REFRESH_BUFFER;
        }

        Ok(Self {
            access_token: response.access_token,
            expires_at: received_at + lifetime,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    #[inline]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    /// Hands the token back if it is still live at `now`.
    pub fn ensure_live_at(self, now: OffsetDateTime) -> Result<Self, Error> {
        if self.is_expired_at(now) {
            return Err(Error::ExpiredBeforeUse {
                expires_at: self.expires_at,
                checked_at: now,
            });
        }

        Ok(self)
    }

    #[inline]
    pub fn ensure_live(self) -> Result<Self, Error> {
        self.ensure_live_at(OffsetDateTime::now_utc())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"...") // dont log tokens
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
