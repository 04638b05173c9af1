use std::fmt;

use bigquery_resources::{ErrorProto, ErrorResponse};
use gcp_service_account::Token;
use reqwest::Response;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::RemoteError;

/// A callable handle on the REST surface, bound to one access token.
///
/// Never refreshed in place: once the token expires the owning
/// [`Session`](crate::Session) is replaced along with its connection.
pub struct Connection {
    client: reqwest::Client,
    base_url: Url,
    project_id: Box<str>,
    access_token: Box<str>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.base_url.as_str())
            .field("project_id", &self.project_id)
            .field("access_token", &"...") // dont log tokens
            .finish()
    }
}

impl Connection {
    pub(crate) fn new(
        client: reqwest::Client,
        base_url: Url,
        project_id: &str,
        token: &Token,
    ) -> Self {
        Self {
            client,
            base_url,
            project_id: Box::from(project_id),
            access_token: Box::from(token.access_token()),
        }
    }

    #[inline]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/projects/{project}/{segments...}`, with every segment
    /// percent-encoded.
    pub(crate) fn make_url<'a, I>(&self, segments: I) -> Url
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.base_url.clone();

        // base urls are checked to be hierarchical when the options are parsed
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["projects", &*self.project_id])
                .extend(segments);
        }

        url
    }

    pub(crate) async fn get<T>(&self, url: Url, query: &[(&str, &str)]) -> Result<T, RemoteError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        handle_response(response).await
    }

    pub(crate) async fn post<B, T>(&self, url: Url, payload: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(payload)
            .send()
            .await?;

        handle_response(response).await
    }
}

async fn handle_response<T>(response: Response) -> Result<T, RemoteError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        return serde_json::from_slice(&bytes).map_err(RemoteError::from);
    }

    let (error, others) = match serde_json::from_slice::<ErrorResponse>(&bytes) {
        Ok(envelope) => envelope.error.into_protos(),
        // not the usual envelope, keep whatever text came back
        Err(_) => {
            let text = String::from_utf8_lossy(&bytes);
            let message = match text.trim() {
                "" => status.canonical_reason().unwrap_or("unknown error"),
                trimmed => trimmed,
            };
            (ErrorProto::new(Box::from(message)), Vec::new())
        }
    };

    Err(RemoteError::Response {
        status,
        error,
        others,
    })
}
