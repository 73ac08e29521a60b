//! Connection and generation settings.
//!
//! Explicit values win; anything left unset is looked up in the environment
//! (`DB_TYPE`, `HOST`, `PORT`, `DATABASE`, `USER`, `PASSWORD`,
//! `OPENAI_API_KEY`, `COGNIDB_MODEL`, `OPENAI_BASE_URL`, `DB_SSL_MODE`).
//! Resolution never touches the network, so missing credentials are
//! reported before any connection attempt.

use std::path::PathBuf;

use crate::error::{CogniError, Result};
use crate::services::database::traits::{BackendType, ConnectionConfig, ConnectionParams, SslMode};
use crate::services::generator::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const ENV_DB_TYPE: &str = "DB_TYPE";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_DATABASE: &str = "DATABASE";
pub const ENV_USER: &str = "USER";
pub const ENV_PASSWORD: &str = "PASSWORD";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MODEL: &str = "COGNIDB_MODEL";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_SSL_MODE: &str = "DB_SSL_MODE";

const DEFAULT_BACKEND: &str = "mysql";
const DEFAULT_HOST: &str = "localhost";
const MEMORY_DATABASE: &str = ":memory:";

/// Explicitly supplied settings; `None` defers to the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub ssl_mode: Option<String>,
}

/// Fully resolved settings.
#[derive(Clone)]
pub struct CogniDbConfig {
    pub backend: BackendType,
    pub host: String,
    /// Server port; `None` for file-based backends
    pub port: Option<u16>,
    /// Database name, or the database path for file-based backends
    pub database: String,
    pub user: String,
    pub password: String,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub ssl_mode: SslMode,
}

impl std::fmt::Debug for CogniDbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CogniDbConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

impl CogniDbConfig {
    /// Merge overrides with values from `lookup` (an environment reader).
    ///
    /// Empty values count as missing.
    ///
    /// # Errors
    ///
    /// `CogniError::Configuration` naming every missing variable, or an
    /// unknown backend, port or SSL mode.
    pub fn resolve<F>(overrides: ConfigOverrides, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |value: Option<String>, var: &str| {
            value
                .filter(|v| !v.is_empty())
                .or_else(|| lookup(var).filter(|v| !v.is_empty()))
        };

        let backend_name =
            pick(overrides.backend, ENV_DB_TYPE).unwrap_or_else(|| DEFAULT_BACKEND.to_string());
        let backend = BackendType::parse(&backend_name).ok_or_else(|| {
            CogniError::Configuration(format!("Unknown backend type `{}`", backend_name))
        })?;

        let port = match overrides.port {
            Some(port) => Some(port),
            None => match lookup(ENV_PORT).filter(|v| !v.is_empty()) {
                Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
                    CogniError::Configuration(format!("Invalid {} `{}`", ENV_PORT, raw))
                })?),
                None => backend.default_port(),
            },
        };

        let ssl_mode = match pick(overrides.ssl_mode, ENV_SSL_MODE) {
            Some(raw) => parse_ssl_mode(&raw)?,
            None => SslMode::default(),
        };

        let host = pick(overrides.host, ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let database = pick(overrides.database, ENV_DATABASE);
        let user = pick(overrides.user, ENV_USER);
        let password = pick(overrides.password, ENV_PASSWORD);
        let api_key = pick(overrides.api_key, ENV_API_KEY);

        let mut missing = Vec::new();
        if database.is_none() {
            missing.push(ENV_DATABASE);
        }
        if backend.is_server_based() {
            if user.is_none() {
                missing.push(ENV_USER);
            }
            if password.is_none() {
                missing.push(ENV_PASSWORD);
            }
        }
        if api_key.is_none() {
            missing.push(ENV_API_KEY);
        }
        if !missing.is_empty() {
            return Err(CogniError::Configuration(format!(
                "Missing required configuration for {}: {}. \
                 Provide them explicitly or through the environment.",
                backend.display_name(),
                missing.join(", ")
            )));
        }

        Ok(Self {
            backend,
            host,
            port: if backend.is_server_based() { port } else { None },
            database: database.unwrap_or_default(),
            user: user.unwrap_or_default(),
            password: password.unwrap_or_default(),
            api_key: api_key.unwrap_or_default(),
            model: pick(overrides.model, ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: pick(overrides.base_url, ENV_BASE_URL)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            ssl_mode,
        })
    }

    /// Resolve against the process environment.
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self> {
        Self::resolve(overrides, |var| std::env::var(var).ok())
    }

    /// Driver configuration for these settings.
    pub fn connection_config(&self) -> ConnectionConfig {
        let params = if self.backend.is_file_based() {
            if self.backend == BackendType::Sqlite && self.database == MEMORY_DATABASE {
                ConnectionParams::in_memory()
            } else {
                ConnectionParams::file(PathBuf::from(&self.database), false)
            }
        } else {
            ConnectionParams::server(
                self.host.clone(),
                self.port.unwrap_or_default(),
                self.user.clone(),
                self.password.clone(),
                self.database.clone(),
            )
            .with_ssl_mode(self.ssl_mode)
        };

        ConnectionConfig::new(self.database.clone(), self.backend, params)
    }
}

fn parse_ssl_mode(raw: &str) -> Result<SslMode> {
    SslMode::from_db_str(raw).ok_or_else(|| {
        CogniError::Configuration(format!(
            "Invalid {} `{}` (expected disable, prefer or require)",
            ENV_SSL_MODE, raw
        ))
    })
}
