use std::fmt;
use std::path::{Path, PathBuf};

pub const ENV_CLIENT_ID: &str = "BQ_ID";
pub const ENV_CLIENT_SECRET: &str = "BQ_SECRET";
pub const ENV_PROJECT_ID: &str = "BQ_PROJECT_ID";
pub const ENV_SERVICE_ACCOUNT: &str = "BQ_ACCOUNT";
pub const ENV_CREDENTIALS_FILE: &str = "BQ_CREDENTIALS_FILE";

const DEFAULT_CLIENT_SECRET: &str = "notasecret";

/// Raw, unvalidated credential settings.
#[derive(Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub client_id: String,
    pub client_secret: String,
    pub project_id: String,
    pub service_account: String,
    pub credentials_file: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: DEFAULT_CLIENT_SECRET.to_owned(),
            project_id: String::new(),
            service_account: String::new(),
            credentials_file: PathBuf::new(),
        }
    }
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"...")
            .field("project_id", &self.project_id)
            .field("service_account", &self.service_account)
            .field("credentials_file", &self.credentials_file)
            .finish()
    }
}

impl CredentialsConfig {
    /// Reads `BQ_ID`, `BQ_SECRET`, `BQ_PROJECT_ID`, `BQ_ACCOUNT` and
    /// `BQ_CREDENTIALS_FILE`. Unset variables are left empty (or at their
    /// default), and are reported by [`Credentials::load`].
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(client_id) = lookup(ENV_CLIENT_ID) {
            config.client_id = client_id;
        }
        if let Some(client_secret) = lookup(ENV_CLIENT_SECRET) {
            config.client_secret = client_secret;
        }
        if let Some(project_id) = lookup(ENV_PROJECT_ID) {
            config.project_id = project_id;
        }
        if let Some(service_account) = lookup(ENV_SERVICE_ACCOUNT) {
            config.service_account = service_account;
        }
        if let Some(path) = lookup(ENV_CREDENTIALS_FILE) {
            config.credentials_file = PathBuf::from(path);
        }

        config
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("no client id specified")]
    MissingClientId,
    #[error("no client secret specified")]
    MissingClientSecret,
    #[error("no service account specified")]
    MissingServiceAccount,
    #[error("no project id specified")]
    MissingProjectId,
    #[error("no credentials file specified")]
    MissingCredentialsFile,
    #[error("could not access credential file '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credential file '{}' is empty", path.display())]
    EmptyCredentialsFile { path: PathBuf },
    #[error("malformed JSON key file: {0}")]
    MalformedKeyFile(#[source] serde_json::Error),
}

/// PEM encoded RSA key material, plus the key id when it came from a
/// JSON key file.
#[derive(Clone)]
pub struct PrivateKey {
    pem: Box<[u8]>,
    key_id: Option<Box<str>>,
}

#[derive(serde::Deserialize)]
struct ServiceAccountKey {
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
}

impl PrivateKey {
    /// Accepts either a bare PEM key (PKCS#8 or PKCS#1) or a JSON
    /// service-account key file. Returns `None` for empty input.
    pub fn parse(bytes: &[u8]) -> Option<Result<Self, CredentialsError>> {
        let trimmed = bytes.trim_ascii();

        if trimmed.is_empty() {
            return None;
        }

        if !trimmed.starts_with(b"{") {
            return Some(Ok(Self {
                pem: Box::from(trimmed),
                key_id: None,
            }));
        }

        let parsed = serde_json::from_slice::<ServiceAccountKey>(trimmed)
            .map_err(CredentialsError::MalformedKeyFile)
            .map(|key| Self {
                pem: key.private_key.into_bytes().into_boxed_slice(),
                key_id: key.private_key_id.filter(|id| !id.is_empty()).map(Box::from),
            });

        Some(parsed)
    }

    pub fn from_pem(pem: impl Into<Box<[u8]>>) -> Self {
        Self {
            pem: pem.into(),
            key_id: None,
        }
    }

    pub fn pem(&self) -> &[u8] {
        &self.pem
    }

    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// True when there is no key material, ignoring whitespace.
    pub fn is_empty(&self) -> bool {
        self.pem.trim_ascii().is_empty()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("pem", &"...")
            .field("key_id", &self.key_id)
            .finish()
    }
}

/// Validated credentials. Immutable once loaded.
#[derive(Clone)]
pub struct Credentials {
    client_id: Box<str>,
    client_secret: Box<str>,
    project_id: Box<str>,
    service_account: Box<str>,
    private_key: PrivateKey,
}

impl Credentials {
    /// Validates every field of `config`, then reads and parses the key file.
    pub async fn load(config: &CredentialsConfig) -> Result<Self, CredentialsError> {
        check_identity(config)?;

        let path = config.credentials_file.as_path();
        if path.as_os_str().is_empty() {
            return Err(CredentialsError::MissingCredentialsFile);
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| CredentialsError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let private_key = parse_key_file(path, &bytes)?;
        debug!(path = %path.display(), "loaded service account key");

        Ok(Self::from_parts(config, private_key))
    }

    /// Builds credentials from an already loaded key, skipping the file.
    pub fn with_private_key(
        config: &CredentialsConfig,
        private_key: PrivateKey,
    ) -> Result<Self, CredentialsError> {
        check_identity(config)?;

        if private_key.is_empty() {
            return Err(CredentialsError::EmptyCredentialsFile {
                path: config.credentials_file.clone(),
            });
        }

        Ok(Self::from_parts(config, private_key))
    }

    fn from_parts(config: &CredentialsConfig, private_key: PrivateKey) -> Self {
        Self {
            client_id: Box::from(config.client_id.as_str()),
            client_secret: Box::from(config.client_secret.as_str()),
            project_id: Box::from(config.project_id.as_str()),
            service_account: Box::from(config.service_account.as_str()),
            private_key,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn service_account(&self) -> &str {
        &self.service_account
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

fn check_identity(config: &CredentialsConfig) -> Result<(), CredentialsError> {
    if config.client_id.is_empty() {
        return Err(CredentialsError::MissingClientId);
    }
    if config.client_secret.is_empty() {
        return Err(CredentialsError::MissingClientSecret);
    }
    if config.service_account.is_empty() {
        return Err(CredentialsError::MissingServiceAccount);
    }
    if config.project_id.is_empty() {
        return Err(CredentialsError::MissingProjectId);
    }
    Ok(())
}

fn parse_key_file(path: &Path, bytes: &[u8]) -> Result<PrivateKey, CredentialsError> {
    match PrivateKey::parse(bytes) {
        Some(Ok(key)) if !key.is_empty() => Ok(key),
        Some(Err(error)) => Err(error),
        Some(Ok(_)) | None => Err(CredentialsError::EmptyCredentialsFile {
            path: path.to_path_buf(),
        }),
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"...")
            .field("project_id", &self.project_id)
            .field("service_account", &self.service_account)
            .field("private_key", &self.private_key)
            .finish()
    }
}
