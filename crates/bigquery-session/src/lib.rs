//! An authenticated client for the BigQuery REST API: idempotent dataset and
//! table provisioning, single-row streaming inserts and bounded synchronous
//! queries.
#![deny(missing_debug_implementations)]

#[macro_use]
extern crate tracing;

mod client;
mod config;
mod connection;
mod dataset;
mod error;
mod insert;
mod query;
mod session;
mod table;

pub use bigquery_resources as resources;
pub use bigquery_resources::{FieldMode, FieldType, QueryResult, Row, TableFieldSchema, TableSchema, Value};
pub use client::Client;
pub use config::{ClientOptions, DEFAULT_BASE_URL};
pub use connection::Connection;
pub use dataset::DatasetManager;
pub use error::{ConfigError, Error, Operation, RemoteError};
pub use gcp_service_account::{Credentials, CredentialsConfig, CredentialsError, Scope, Scopes, Token};
pub use insert::RowInserter;
pub use query::{QUERY_ROW_LIMIT, QueryExecutor};
pub use session::{AuthSession, Session};
pub use table::TableManager;

pub type Result<T, E = Error> = std::result::Result<T, E>;
