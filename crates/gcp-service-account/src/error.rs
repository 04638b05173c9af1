use reqwest::StatusCode;
use time::OffsetDateTime;
use url::Url;

use crate::CredentialsError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error("invalid RSA private key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign assertion: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("assertion rejected: {0}")]
    Rejected(#[from] ResponseError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("token expired on arrival (expires_in = {0}s)")]
    ExpiredOnArrival(i64),
    #[error("token expired at {expires_at}, before its first use at {checked_at}")]
    ExpiredBeforeUse {
        expires_at: OffsetDateTime,
        checked_at: OffsetDateTime,
    },
}

/// A non-success response from the token endpoint.
#[derive(Debug)]
pub struct ResponseError {
    url: Url,
    status: StatusCode,
    content: ResponseErrorKind,
}

#[derive(Debug)]
enum ResponseErrorKind {
    Json(serde_json::Value),
    Text(String),
    Empty,
}

impl ResponseError {
    pub fn from_parts(url: Url, status: StatusCode, content: &[u8]) -> Self {
        let content = if content.is_empty() {
            ResponseErrorKind::Empty
        } else if content.starts_with(b"{") || content.starts_with(b"[") {
            match serde_json::from_slice(content) {
                Ok(json) => ResponseErrorKind::Json(json),
                // keep the raw text so the message isn't lost
                Err(_) => ResponseErrorKind::Text(String::from_utf8_lossy(content).into_owned()),
            }
        } else {
            ResponseErrorKind::Text(String::from_utf8_lossy(content).into_owned())
        };

        Self {
            url,
            status,
            content,
        }
    }

    pub(crate) async fn from_response(response: reqwest::Response) -> Result<Self, Error> {
        debug_assert!(
            !response.status().is_success(),
            "shouldn't be called on responses with a successful code"
        );

        let url = response.url().clone();
        let status = response.status();
        let bytes = response.bytes().await?;

        Ok(Self::from_parts(url, status, &bytes))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The human readable part of the response, if one could be found.
    pub fn message(&self) -> Option<&str> {
        match self.content {
            ResponseErrorKind::Json(ref json) => extract_json_message(json),
            ResponseErrorKind::Text(ref text) => Some(text.trim()),
            ResponseErrorKind::Empty => None,
        }
    }
}

fn extract_json_message(json: &serde_json::Value) -> Option<&str> {
    fn get_map_string<'a>(
        map: &'a serde_json::Map<String, serde_json::Value>,
        key: &str,
    ) -> Option<&'a str> {
        match map.get(key)? {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        }
    }

    match json {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Array(values) => values.iter().find_map(extract_json_message),
        serde_json::Value::Object(map) => {
            // OAuth endpoints put the detail in `error_description`
            if let Some(message) = get_map_string(map, "error_description") {
                return Some(message);
            }

            if let Some(message) = get_map_string(map, "message") {
                return Some(message);
            }

            if let Some(message) = get_map_string(map, "error") {
                return Some(message);
            }

            // fall back to the longest string, assuming it's the friendliest
            map.values()
                .filter_map(|value| match value {
                    serde_json::Value::String(s) => Some(s.as_str()),
                    _ => None,
                })
                .max_by_key(|string| string.len())
        }
        _ => None,
    }
}

impl std::fmt::Display for ResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.url, self.status)?;

        match self.message() {
            Some(message) => write!(f, ": {message}"),
            None => Ok(()),
        }
    }
}

impl std::error::Error for ResponseError {}
