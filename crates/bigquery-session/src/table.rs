use bigquery_resources::{Table, TableReference, TableSchema};
use serde::de::IgnoredAny;

use crate::connection::Connection;
use crate::error::{Error, Operation};

/// Table operations within one dataset.
#[derive(Debug, Clone, Copy)]
pub struct TableManager<'a> {
    conn: &'a Connection,
    dataset_id: &'a str,
}

impl<'a> TableManager<'a> {
    #[inline]
    pub const fn new(conn: &'a Connection, dataset_id: &'a str) -> Self {
        Self { conn, dataset_id }
    }

    pub async fn get(&self, table_id: &str) -> crate::Result<Table> {
        self.fetch(table_id).await
    }

    /// Whether the table exists. The response body is not decoded.
    pub async fn exists(&self, table_id: &str) -> crate::Result<bool> {
        match self.fetch::<IgnoredAny>(table_id).await {
            Ok(_) => Ok(true),
            Err(error) if error.is_not_found() => Ok(false),
            Err(error) => Err(error),
        }
    }

    async fn fetch<T>(&self, table_id: &str) -> crate::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self
            .conn
            .make_url(["datasets", self.dataset_id, "tables", table_id]);

        self.conn
            .get(url, &[])
            .await
            .map_err(Error::remote(Operation::GetTable))
    }

    /// Creates the table if it doesn't exist yet. An existing table is left
    /// exactly as it is, even if its schema differs from `schema`.
    pub async fn create(&self, table_id: &str, schema: &TableSchema) -> crate::Result<()> {
        if self.exists(table_id).await? {
            debug!(
                dataset_id = self.dataset_id,
                table_id, "table exists, leaving its schema untouched"
            );
            return Ok(());
        }

        let url = self.conn.make_url(["datasets", self.dataset_id, "tables"]);
        let table = Table::new(
            TableReference {
                project_id: Box::from(self.conn.project_id()),
                dataset_id: Box::from(self.dataset_id),
                table_id: Box::from(table_id),
            },
            schema.clone(),
        );

        self.conn
            .post::<_, IgnoredAny>(url, &table)
            .await
            .map_err(Error::remote(Operation::CreateTable))?;

        info!(dataset_id = self.dataset_id, table_id, "created table");
        Ok(())
    }
}
