use std::fmt;
use std::sync::Arc;

use bigquery_resources::dataset::DatasetListEntry;
use bigquery_resources::{QueryResult, Row, TableSchema};
use gcp_service_account::{Credentials, CredentialsConfig};

use crate::config::ClientOptions;
use crate::connection::Connection;
use crate::dataset::DatasetManager;
use crate::error::{ConfigError, Error};
use crate::insert::RowInserter;
use crate::query::QueryExecutor;
use crate::session::{AuthSession, Session};
use crate::table::TableManager;

/// Owns one authenticated session, plus the dataset and table that data
/// operations currently target.
///
/// Every remote operation goes through [`active_connection`], which
/// re-authenticates once the held token has expired. Operations take
/// `&mut self`, so a single client can't be driven from two places at once.
///
/// [`active_connection`]: Client::active_connection
pub struct Client {
    credentials: Credentials,
    auth: AuthSession,
    session: Option<Session>,
    dataset: Option<Box<str>>,
    table: Option<Box<str>>,
    use_legacy_sql: bool,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("project_id", &self.credentials.project_id())
            .field("session", &self.session)
            .field("dataset", &self.dataset)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Loads and validates credentials from `config`, then authenticates.
    pub async fn connect(config: &CredentialsConfig, options: ClientOptions) -> crate::Result<Self> {
        let credentials = Credentials::load(config).await?;
        Self::from_credentials(credentials, options).await
    }

    /// Same as [`connect`](Self::connect), with the configuration read from
    /// the `BQ_*` environment variables.
    pub async fn from_env(options: ClientOptions) -> crate::Result<Self> {
        Self::connect(&CredentialsConfig::from_env(), options).await
    }

    pub async fn from_credentials(
        credentials: Credentials,
        options: ClientOptions,
    ) -> crate::Result<Self> {
        let auth = AuthSession::new(&options)?;
        let session = auth.authenticate(&credentials).await?;

        info!(
            project_id = credentials.project_id(),
            account = credentials.service_account(),
            "connected"
        );

        Ok(Self {
            credentials,
            auth,
            session: Some(session),
            dataset: None,
            table: None,
            use_legacy_sql: options.use_legacy_sql,
        })
    }

    /// Drops the session. Idempotent; every remote operation afterwards fails
    /// with [`Error::NotInitialized`].
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            debug!("session closed");
        }
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    #[inline]
    pub fn project_id(&self) -> &str {
        self.credentials.project_id()
    }

    #[inline]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[inline]
    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    #[inline]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// `"{dataset}.{table}"` for the bound table.
    pub fn table_name(&self) -> crate::Result<String> {
        self.ensure_open()?;

        match (self.dataset.as_deref(), self.table.as_deref()) {
            (Some(dataset), Some(table)) => Ok(format!("{dataset}.{table}")),
            _ => Err(ConfigError::TableNotSetUp.into()),
        }
    }

    /// The connection bound to a live token, re-authenticating first if the
    /// held token has expired.
    pub async fn active_connection(&mut self) -> crate::Result<Arc<Connection>> {
        let session = self.session.as_ref().ok_or(Error::NotInitialized)?;

        if !session.is_expired() {
            return Ok(Arc::clone(session.connection()));
        }

        info!("access token expired, re-authenticating");
        let session = self.auth.authenticate(&self.credentials).await?;
        let conn = Arc::clone(session.connection());
        self.session = Some(session);

        Ok(conn)
    }

    pub async fn list_datasets(&mut self) -> crate::Result<Vec<DatasetListEntry>> {
        let conn = self.active_connection().await?;
        DatasetManager::new(&conn).list().await
    }

    /// Logs every dataset in the project, returning how many there were.
    pub async fn print_datasets(&mut self) -> crate::Result<usize> {
        let datasets = self.list_datasets().await?;
        info!(count = datasets.len(), "retrieved datasets");

        for dataset in &datasets {
            info!(
                id = &*dataset.id,
                friendly_name = dataset.friendly_name.as_deref().unwrap_or(""),
                "dataset"
            );
        }

        Ok(datasets.len())
    }

    /// Ensures `dataset_id` exists and binds it as the current dataset.
    pub async fn create_dataset(&mut self, dataset_id: &str) -> crate::Result<()> {
        let conn = self.active_connection().await?;
        DatasetManager::new(&conn).create(dataset_id).await?;

        self.dataset = Some(Box::from(dataset_id));
        Ok(())
    }

    /// Ensures `table_id` exists in the bound dataset and binds it as the
    /// current table. The schema of an existing table is never changed.
    pub async fn create_table(&mut self, table_id: &str, schema: &TableSchema) -> crate::Result<()> {
        self.ensure_open()?;
        let dataset = self.dataset.clone().ok_or(ConfigError::NoDataset)?;

        let conn = self.active_connection().await?;
        TableManager::new(&conn, &dataset)
            .create(table_id, schema)
            .await?;

        self.table = Some(Box::from(table_id));
        Ok(())
    }

    /// Streams a single row into the bound table.
    pub async fn insert_row(&mut self, row: &Row) -> crate::Result<()> {
        self.ensure_open()?;
        let (dataset, table) = match (self.dataset.clone(), self.table.clone()) {
            (Some(dataset), Some(table)) => (dataset, table),
            _ => return Err(ConfigError::TableNotSetUp.into()),
        };

        let conn = self.active_connection().await?;
        RowInserter::new(&conn, &dataset, &table).insert(row).await
    }

    /// Runs `query` against the bound dataset, returning at most
    /// [`QUERY_ROW_LIMIT`](crate::QUERY_ROW_LIMIT) rows.
    pub async fn query(&mut self, query: &str) -> crate::Result<QueryResult> {
        self.ensure_open()?;
        let dataset = self.dataset.clone().ok_or(ConfigError::NoDataset)?;

        let conn = self.active_connection().await?;
        QueryExecutor::new(&conn, &dataset)
            .use_legacy_sql(self.use_legacy_sql)
            .query(query)
            .await
    }

    fn ensure_open(&self) -> crate::Result<()> {
        match self.session {
            Some(_) => Ok(()),
            None => Err(Error::NotInitialized),
        }
    }
}
