use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::thread;
use std::time::Duration;

use ssh2::ErrorCode;
use thiserror::Error;

use crate::config::RelayConfig;

// libssh2 SFTP status codes used to tell "not there" apart from real faults.
const FX_NO_SUCH_FILE: i32 = 2;
const FX_NO_SUCH_PATH: i32 = 10;

const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Failure at the remote-store boundary, carrying the protocol's native
/// error code when one was available.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
    pub code: Option<String>,
}

impl StoreError {
    pub fn new(message: impl Into<String>, code: Option<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

impl From<ssh2::Error> for StoreError {
    fn from(err: ssh2::Error) -> Self {
        let code = match err.code() {
            ErrorCode::Session(n) => format!("SSH({n})"),
            ErrorCode::SFTP(n) => format!("SFTP({n})"),
        };
        Self::new(err.message(), Some(code))
    }
}

/// Factory for one authenticated session per invocation.
pub trait RemoteStore {
    type Session: RemoteSession;

    fn connect(&self, config: &RelayConfig) -> Result<Self::Session, StoreError>;
}

/// One open session against the remote file store. The adapter drives it
/// strictly sequentially: probe/create directories, one whole-buffer write,
/// then close.
pub trait RemoteSession {
    /// Metadata probe: does `path` exist?
    fn exists(&mut self, path: &str) -> Result<bool, StoreError>;

    /// Create a single directory level.
    fn mkdir(&mut self, path: &str) -> Result<(), StoreError>;

    /// Write the full buffer to `path` in one logical operation, returning
    /// the number of bytes written.
    fn write(&mut self, path: &str, data: &[u8]) -> Result<u64, StoreError>;

    /// Disconnect. Consumes the session so it cannot be closed twice.
    fn close(self) -> Result<(), StoreError>;
}

/// Production store speaking SSH/SFTP via libssh2.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ssh2Store;

pub struct Ssh2Session {
    session: ssh2::Session,
    sftp: ssh2::Sftp,
}

impl Ssh2Store {
    fn try_connect(config: &RelayConfig) -> Result<Ssh2Session, StoreError> {
        let addr = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(|e| {
                StoreError::new(
                    format!("failed to resolve {}:{}: {e}", config.host, config.port),
                    None,
                )
            })?
            .next()
            .ok_or_else(|| {
                StoreError::new(
                    format!("no address for {}:{}", config.host, config.port),
                    None,
                )
            })?;

        let tcp = TcpStream::connect_timeout(&addr, config.connect_timeout).map_err(|e| {
            StoreError::new(
                format!("failed to connect to {}:{}: {e}", config.host, config.port),
                None,
            )
        })?;
        tcp.set_read_timeout(Some(config.connect_timeout))
            .map_err(|e| StoreError::new(format!("failed to set read timeout: {e}"), None))?;
        tcp.set_write_timeout(Some(config.connect_timeout))
            .map_err(|e| StoreError::new(format!("failed to set write timeout: {e}"), None))?;

        let mut session = ssh2::Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;
        session.userauth_password(&config.username, &config.password)?;
        if !session.authenticated() {
            return Err(StoreError::new("authentication rejected", None));
        }

        let sftp = session.sftp()?;
        Ok(Ssh2Session { session, sftp })
    }
}

impl RemoteStore for Ssh2Store {
    type Session = Ssh2Session;

    fn connect(&self, config: &RelayConfig) -> Result<Ssh2Session, StoreError> {
        let attempts = config.connect_retries + 1;
        let mut last = None;
        for attempt in 1..=attempts {
            match Self::try_connect(config) {
                Ok(session) => return Ok(session),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "sftp connect attempt failed");
                    last = Some(e);
                    if attempt < attempts {
                        thread::sleep(RETRY_DELAY);
                    }
                }
            }
        }
        Err(last.unwrap_or_else(|| StoreError::new("connect failed", None)))
    }
}

impl RemoteSession for Ssh2Session {
    fn exists(&mut self, path: &str) -> Result<bool, StoreError> {
        match self.sftp.stat(Path::new(path)) {
            Ok(_) => Ok(true),
            Err(e) => match e.code() {
                ErrorCode::SFTP(FX_NO_SUCH_FILE) | ErrorCode::SFTP(FX_NO_SUCH_PATH) => Ok(false),
                _ => Err(e.into()),
            },
        }
    }

    fn mkdir(&mut self, path: &str) -> Result<(), StoreError> {
        self.sftp.mkdir(Path::new(path), 0o755)?;
        Ok(())
    }

    fn write(&mut self, path: &str, data: &[u8]) -> Result<u64, StoreError> {
        let mut remote = self.sftp.create(Path::new(path))?;
        remote
            .write_all(data)
            .map_err(|e| StoreError::new(format!("failed to write {path}: {e}"), None))?;
        Ok(data.len() as u64)
    }

    fn close(self) -> Result<(), StoreError> {
        self.session.disconnect(None, "upload complete", None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_code_carried_over() {
        let err = StoreError::from(ssh2::Error::new(ErrorCode::SFTP(3), "permission denied"));
        assert_eq!(err.code.as_deref(), Some("SFTP(3)"));
        assert_eq!(err.message, "permission denied");

        let err = StoreError::from(ssh2::Error::new(ErrorCode::Session(-5), "handshake"));
        assert_eq!(err.code.as_deref(), Some("SSH(-5)"));
    }
}
