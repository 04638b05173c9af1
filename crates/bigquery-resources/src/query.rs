use std::num::NonZeroU64;

use crate::job::JobReference;
use crate::table::TableSchema;
use crate::{DatasetReference, ErrorProto};

mod results;

pub use results::QueryResult;

/// Body of a synchronous `jobs.query` call.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
    pub kind: &'static str,
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<NonZeroU64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_dataset: Option<DatasetReference<&'a str>>,
    #[serde(skip_serializing_if = "crate::util::is_false")]
    pub dry_run: bool,
    pub use_legacy_sql: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<uuid::Uuid>,
}

impl<'a> QueryRequest<'a> {
    pub fn new(query: &'a str) -> Self {
        Self {
            kind: "bigquery#queryRequest",
            query,
            max_results: None,
            default_dataset: None,
            dry_run: false,
            use_legacy_sql: false,
            request_id: Some(uuid::Uuid::new_v4()),
        }
    }

    pub fn max_results(mut self, max_results: NonZeroU64) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn default_dataset(mut self, dataset: DatasetReference<&'a str>) -> Self {
        self.default_dataset = Some(dataset);
        self
    }

    pub fn use_legacy_sql(mut self, use_legacy_sql: bool) -> Self {
        self.use_legacy_sql = use_legacy_sql;
        self
    }
}

/// Response of `jobs.query`, with rows still in their raw `{"f": [{"v": ...}]}`
/// encoding. [`QueryResult::decode`] turns it into typed values.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub job_reference: Option<JobReference>,
    #[serde(default)]
    pub schema: Option<TableSchema>,
    #[serde(default, with = "crate::util::uint64::optional")]
    pub total_rows: Option<u64>,
    #[serde(default)]
    pub page_token: Option<Box<str>>,
    #[serde(default)]
    pub job_complete: bool,
    #[serde(default = "Vec::new")]
    pub rows: Vec<RawRow>,
    #[serde(default = "Vec::new")]
    pub errors: Vec<ErrorProto>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct RawRow {
    #[serde(default = "Vec::new")]
    pub f: Vec<serde_json::Value>,
}
