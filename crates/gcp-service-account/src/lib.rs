//! Service-account credentials and the JWT bearer assertion flow used to
//! obtain access tokens for the warehouse API.
#![deny(missing_debug_implementations)]

#[macro_use]
extern crate tracing;

mod credentials;
mod error;
pub mod scope;
mod service_account;
mod token;

pub use credentials::{Credentials, CredentialsConfig, CredentialsError, PrivateKey};
pub use error::{Error, ResponseError};
pub use scope::{Scope, Scopes};
pub use service_account::{DEFAULT_TOKEN_URI, ServiceAccount};
pub use token::Token;

pub type Result<T, E = Error> = std::result::Result<T, E>;
