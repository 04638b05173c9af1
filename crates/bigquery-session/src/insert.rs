use bigquery_resources::{InsertAllRequest, InsertAllResponse, Row};

use crate::connection::Connection;
use crate::error::{Error, Operation};

/// Streams rows into a single table, one request per call.
#[derive(Debug, Clone, Copy)]
pub struct RowInserter<'a> {
    conn: &'a Connection,
    dataset_id: &'a str,
    table_id: &'a str,
}

impl<'a> RowInserter<'a> {
    #[inline]
    pub const fn new(conn: &'a Connection, dataset_id: &'a str, table_id: &'a str) -> Self {
        Self {
            conn,
            dataset_id,
            table_id,
        }
    }

    /// Any row-level rejection fails the whole call, even though the request
    /// itself went through.
    pub async fn insert(&self, row: &Row) -> crate::Result<()> {
        let url = self.conn.make_url([
            "datasets",
            self.dataset_id,
            "tables",
            self.table_id,
            "insertAll",
        ]);

        let response: InsertAllResponse = self
            .conn
            .post(url, &InsertAllRequest::single(row))
            .await
            .map_err(Error::remote(Operation::InsertRow))?;

        if !response.is_success() {
            warn!(
                dataset_id = self.dataset_id,
                table_id = self.table_id,
                rejected = response.insert_errors.len(),
                "row rejected"
            );

            return Err(Error::PartialFailure {
                op: Operation::InsertRow,
                errors: response.insert_errors,
            });
        }

        Ok(())
    }
}
