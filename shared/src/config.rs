use std::env;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_PORT: u16 = 22;
const DEFAULT_BASE_DIR: &str = "/uploads";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_CONNECT_RETRIES: u32 = 2;

/// SFTP connection settings, read from the environment once at startup.
///
/// Host, username and password are required; everything else has a default.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub base_dir: String,
    pub connect_timeout: Duration,
    pub connect_retries: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for SFTP_PORT: {0}")]
    InvalidPort(String),
}

impl RelayConfig {
    /// Read configuration from `SFTP_*` environment variables, validating
    /// required fields up front so a misconfigured deployment fails at
    /// startup rather than on the first upload.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(ConfigError::Missing(name)),
            }
        };

        let host = required("SFTP_HOST")?;
        let username = required("SFTP_USER")?;
        let password = required("SFTP_PASS")?;

        let port = match lookup("SFTP_PORT") {
            Some(raw) if !raw.is_empty() => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            _ => DEFAULT_PORT,
        };

        let base_dir = lookup("SFTP_REMOTE_DIR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_DIR.to_string());

        Ok(Self {
            host,
            port,
            username,
            password,
            base_dir,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            connect_retries: DEFAULT_CONNECT_RETRIES,
        })
    }
}
