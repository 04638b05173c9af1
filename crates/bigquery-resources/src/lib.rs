//! Wire types for the BigQuery v2 REST surface used by `bigquery-session`,
//! plus the tagged [`Value`] type rows are written and read as.
use std::fmt;

pub mod builders;
pub mod dataset;
pub mod job;
pub mod query;
pub mod table;
pub mod table_data;
mod util;
pub mod value;

pub use query::{QueryRequest, QueryResponse, QueryResult};
pub use table::{FieldMode, FieldType, Table, TableFieldSchema, TableSchema};
pub use table_data::{InsertAllRequest, InsertAllResponse, InsertErrors, Row};
pub use value::{DecodeError, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReference<S = Box<str>> {
    pub project_id: S,
    pub dataset_id: S,
}

impl<S> DatasetReference<S> {
    #[inline]
    pub const fn new(project_id: S, dataset_id: S) -> Self {
        Self {
            project_id,
            dataset_id,
        }
    }

    #[inline]
    pub fn as_deref(&self) -> DatasetReference<&S::Target>
    where
        S: std::ops::Deref,
    {
        DatasetReference {
            project_id: self.project_id.deref(),
            dataset_id: self.dataset_id.deref(),
        }
    }

    #[inline]
    pub fn into_table(self, table_id: S) -> TableReference<S> {
        TableReference {
            project_id: self.project_id,
            dataset_id: self.dataset_id,
            table_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference<S = Box<str>> {
    pub project_id: S,
    pub dataset_id: S,
    pub table_id: S,
}

impl<S> TableReference<S> {
    #[inline]
    pub fn as_deref(&self) -> TableReference<&S::Target>
    where
        S: std::ops::Deref,
    {
        TableReference {
            project_id: self.project_id.deref(),
            dataset_id: self.dataset_id.deref(),
            table_id: self.table_id.deref(),
        }
    }

    #[inline]
    pub const fn dataset_reference(&self) -> DatasetReference<&S> {
        DatasetReference {
            project_id: &self.project_id,
            dataset_id: &self.dataset_id,
        }
    }
}

/// A single error entry, as found in `{"error": {"errors": [...]}}` bodies, job
/// statuses and `insertAll` responses.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "S: serde::Deserialize<'de>"))]
pub struct ErrorProto<S = Box<str>> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<S>,
    pub message: S,
}

impl<S> ErrorProto<S> {
    pub const fn new(message: S) -> Self {
        Self {
            reason: None,
            location: None,
            debug_info: None,
            message,
        }
    }
}

impl<S: fmt::Display> fmt::Display for ErrorProto<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            Some(ref reason) => write!(f, "{} ({reason})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl<S: fmt::Debug + fmt::Display> std::error::Error for ErrorProto<S> {}

impl<S: AsRef<str>> ErrorProto<S> {
    fn has_reason(&self, expected: &str) -> bool {
        self.reason
            .as_ref()
            .is_some_and(|reason| reason.as_ref() == expected)
    }

    pub fn is_not_found(&self) -> bool {
        self.has_reason("notFound")
    }

    pub fn is_duplicate(&self) -> bool {
        self.has_reason("duplicate")
    }
}

/// The envelope the service wraps failed responses in.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    pub message: Box<str>,
    #[serde(default)]
    pub status: Option<Box<str>>,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

impl ErrorBody {
    /// Collapses the envelope into the most specific [`ErrorProto`] available,
    /// keeping any extra entries around in the returned vec.
    pub fn into_protos(mut self) -> (ErrorProto, Vec<ErrorProto>) {
        if self.errors.is_empty() {
            return (ErrorProto::new(self.message), Vec::new());
        }

        let main = self.errors.remove(0);
        (main, self.errors)
    }
}
