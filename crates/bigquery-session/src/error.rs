use std::fmt;

use bigquery_resources::{DecodeError, ErrorProto, InsertErrors};
use gcp_service_account::CredentialsError;
use reqwest::StatusCode;

/// The remote operation an error came out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListDatasets,
    CreateDataset,
    GetTable,
    CreateTable,
    InsertRow,
    Query,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListDatasets => "list datasets",
            Self::CreateDataset => "create dataset",
            Self::GetTable => "get table",
            Self::CreateTable => "create table",
            Self::InsertRow => "insert row",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("authentication failed: {0}")]
    Auth(#[source] gcp_service_account::Error),
    #[error("{op} failed: {source}")]
    Remote {
        op: Operation,
        #[source]
        source: RemoteError,
    },
    #[error("{op} failed, {} row(s) rejected: {}", .errors.len(), join_insert_errors(.errors))]
    PartialFailure {
        op: Operation,
        errors: Vec<InsertErrors>,
    },
    #[error("query returned no data")]
    EmptyResult,
    #[error("service not initialized")]
    NotInitialized,
}

fn join_insert_errors(errors: &[InsertErrors]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<gcp_service_account::Error> for Error {
    fn from(error: gcp_service_account::Error) -> Self {
        match error {
            gcp_service_account::Error::Credentials(creds) => {
                Self::Config(ConfigError::Credentials(creds))
            }
            other => Self::Auth(other),
        }
    }
}

impl From<CredentialsError> for Error {
    #[inline]
    fn from(error: CredentialsError) -> Self {
        Self::Config(ConfigError::Credentials(error))
    }
}

impl Error {
    #[inline]
    pub(crate) fn remote(op: Operation) -> impl FnOnce(RemoteError) -> Self {
        move |source| Self::Remote { op, source }
    }

    /// The operation a remote or row-level failure came from.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Remote { op, .. } | Self::PartialFailure { op, .. } => Some(*op),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Remote { source, .. } if source.is_conflict())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote { source, .. } if source.is_not_found())
    }
}

/// Local configuration problems. Not retryable without the caller changing
/// something.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error("invalid {name} '{value}': {reason}")]
    InvalidUrl {
        name: &'static str,
        value: Box<str>,
        reason: Box<str>,
    },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("no dataset created")]
    NoDataset,
    #[error("table not set up")]
    TableNotSetUp,
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("{status}: {error}")]
    Response {
        status: StatusCode,
        error: ErrorProto,
        /// Any additional entries the service reported.
        others: Vec<ErrorProto>,
    },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to decode result rows: {0}")]
    Rows(#[from] DecodeError),
    #[error("query did not complete within the synchronous call")]
    Incomplete,
}

impl RemoteError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Response { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// The resource already exists: HTTP 409, or a `duplicate` reason.
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Response { status, error, .. } => {
                *status == StatusCode::CONFLICT || error.is_duplicate()
            }
            _ => false,
        }
    }

    /// HTTP 404, or a `notFound` reason.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Response { status, error, .. } => {
                *status == StatusCode::NOT_FOUND || error.is_not_found()
            }
            _ => false,
        }
    }
}
