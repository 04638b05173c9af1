use bigquery_resources::DatasetReference;
use bigquery_resources::dataset::{Dataset, DatasetList, DatasetListEntry};

use crate::connection::Connection;
use crate::error::{Error, Operation};

/// Dataset operations under the connection's project.
#[derive(Debug, Clone, Copy)]
pub struct DatasetManager<'a> {
    conn: &'a Connection,
}

impl<'a> DatasetManager<'a> {
    #[inline]
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Inserts the dataset, treating "already exists" as success.
    pub async fn create(&self, dataset_id: &str) -> crate::Result<()> {
        let url = self.conn.make_url(["datasets"]);
        let dataset = Dataset::new(DatasetReference::new(self.conn.project_id(), dataset_id));

        match self.conn.post::<_, Dataset>(url, &dataset).await {
            Ok(_) => {
                info!(dataset_id, "created dataset");
                Ok(())
            }
            Err(error) if error.is_conflict() => {
                debug!(dataset_id, "dataset already exists");
                Ok(())
            }
            Err(error) => Err(Error::remote(Operation::CreateDataset)(error)),
        }
    }

    /// Every dataset in the project, following page tokens until exhausted.
    pub async fn list(&self) -> crate::Result<Vec<DatasetListEntry>> {
        let mut datasets = Vec::new();
        let mut page_token: Option<Box<str>> = None;

        loop {
            let url = self.conn.make_url(["datasets"]);
            let page: DatasetList = match page_token.as_deref() {
                Some(token) => self.conn.get(url, &[("pageToken", token)]).await,
                None => self.conn.get(url, &[]).await,
            }
            .map_err(Error::remote(Operation::ListDatasets))?;

            datasets.extend(page.datasets);

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        debug!(count = datasets.len(), "listed datasets");
        Ok(datasets)
    }
}
