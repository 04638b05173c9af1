use std::num::NonZeroU64;

use bigquery_resources::{DatasetReference, QueryRequest, QueryResponse, QueryResult};

use crate::connection::Connection;
use crate::error::{Error, Operation, RemoteError};

/// Hard ceiling on the number of rows a synchronous query returns.
pub const QUERY_ROW_LIMIT: usize = 200;

const MAX_RESULTS: NonZeroU64 = match NonZeroU64::new(QUERY_ROW_LIMIT as u64) {
    Some(limit) => limit,
    None => panic!("row limit must be non-zero"),
};

/// Runs synchronous queries with a default dataset.
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor<'a> {
    conn: &'a Connection,
    dataset_id: &'a str,
    use_legacy_sql: bool,
}

impl<'a> QueryExecutor<'a> {
    #[inline]
    pub const fn new(conn: &'a Connection, dataset_id: &'a str) -> Self {
        Self {
            conn,
            dataset_id,
            use_legacy_sql: false,
        }
    }

    #[inline]
    pub const fn use_legacy_sql(mut self, use_legacy_sql: bool) -> Self {
        self.use_legacy_sql = use_legacy_sql;
        self
    }

    /// Runs `query`, returning at most [`QUERY_ROW_LIMIT`] rows. A result
    /// with no rows at all is an [`Error::EmptyResult`].
    pub async fn query(&self, query: &str) -> crate::Result<QueryResult> {
        let url = self.conn.make_url(["queries"]);
        let request = QueryRequest::new(query)
            .max_results(MAX_RESULTS)
            .default_dataset(DatasetReference::new(self.conn.project_id(), self.dataset_id))
            .use_legacy_sql(self.use_legacy_sql);

        let response: QueryResponse = self
            .conn
            .post(url, &request)
            .await
            .map_err(Error::remote(Operation::Query))?;

        if !response.job_complete {
            return Err(Error::remote(Operation::Query)(RemoteError::Incomplete));
        }

        for error in &response.errors {
            warn!(%error, "query reported a non-fatal error");
        }

        let total_rows = response
            .total_rows
            .unwrap_or(response.rows.len() as u64);

        if total_rows < 1 {
            return Err(Error::EmptyResult);
        }

        let schema = response.schema.unwrap_or_default();
        let result = QueryResult::decode(&schema, &response.rows, total_rows, Some(QUERY_ROW_LIMIT))
            .map_err(|err| Error::remote(Operation::Query)(RemoteError::from(err)))?;

        info!(
            returned = result.len(),
            total_rows,
            columns = result.width(),
            "query complete"
        );

        Ok(result)
    }
}
