use thiserror::Error;

use crate::config::RelayConfig;
use crate::sanitize::{join_remote, sanitize_name};
use crate::store::{RemoteSession, RemoteStore, StoreError};

/// One inbound transfer: untrusted names plus the decoded payload buffer.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub folder: String,
    pub file_name: String,
    pub payload: Vec<u8>,
}

/// Successful transfer report. `warning` is set when the requested subfolder
/// could not be created and the file landed in the nearest existing ancestor
/// instead.
#[derive(Clone, Debug)]
pub struct UploadOutcome {
    pub remote_path: String,
    pub bytes_written: u64,
    pub warning: Option<String>,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("missing file name")]
    MissingFileName,

    #[error("empty file content")]
    EmptyPayload,

    #[error("failed to connect to remote store: {source}")]
    Connect {
        #[source]
        source: StoreError,
    },

    #[error("upload failed: {source}")]
    Write {
        #[source]
        source: StoreError,
    },
}

impl UploadError {
    /// Native protocol code, when the remote store supplied one.
    pub fn native_code(&self) -> Option<&str> {
        match self {
            Self::Connect { source } | Self::Write { source } => source.code.as_deref(),
            _ => None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingFileName | Self::EmptyPayload)
    }
}

/// Transfer one payload to the remote store.
///
/// Runs the invocation sequence: validate, connect, ensure the destination
/// directory, write, close. The session is closed exactly once on every path
/// that opened one; a close failure is logged and never overrides the
/// transfer result. Client errors are returned before any connection is
/// attempted.
pub fn upload<S: RemoteStore>(
    store: &S,
    config: &RelayConfig,
    request: &UploadRequest,
) -> Result<UploadOutcome, UploadError> {
    let folder = sanitize_name(&request.folder);
    let file_name = sanitize_name(&request.file_name);
    if file_name.is_empty() {
        return Err(UploadError::MissingFileName);
    }
    if request.payload.is_empty() {
        return Err(UploadError::EmptyPayload);
    }

    tracing::info!(host = %config.host, port = config.port, "connecting to remote store");
    let mut session = store
        .connect(config)
        .map_err(|source| UploadError::Connect { source })?;

    let result = transfer(&mut session, config, &folder, &file_name, &request.payload);

    match session.close() {
        Ok(()) => tracing::debug!("remote session closed"),
        Err(e) => tracing::warn!(error = %e, "failed to close remote session"),
    }

    result
}

fn transfer<S: RemoteSession>(
    session: &mut S,
    config: &RelayConfig,
    folder: &str,
    file_name: &str,
    payload: &[u8],
) -> Result<UploadOutcome, UploadError> {
    let ensured = ensure_directory(session, &config.base_dir, folder);
    tracing::info!(
        dir = %ensured.dir,
        degraded = ensured.warning.is_some(),
        "directory ensured"
    );

    let remote_path = join_remote(&[&ensured.dir, file_name]);
    let bytes_written = session
        .write(&remote_path, payload)
        .map_err(|source| UploadError::Write { source })?;
    tracing::info!(path = %remote_path, bytes = bytes_written, "write complete");

    Ok(UploadOutcome {
        remote_path,
        bytes_written,
        warning: ensured.warning,
    })
}

struct EnsuredDir {
    dir: String,
    warning: Option<String>,
}

/// Make sure the destination directory exists, creating missing ancestors
/// one level at a time from the root.
///
/// Never fails: a creation error that is not "already exists" degrades to
/// the nearest existing ancestor, reported through `warning` so the caller
/// can see the requested path was not used. A creation error is tolerated
/// when a re-probe shows the directory appeared concurrently.
fn ensure_directory<S: RemoteSession>(session: &mut S, base_dir: &str, folder: &str) -> EnsuredDir {
    let target = join_remote(&[base_dir, folder]);

    match session.exists(&target) {
        Ok(true) => {
            return EnsuredDir {
                dir: target,
                warning: None,
            }
        }
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(dir = %target, error = %e, "directory probe failed");
            return fallback(base_dir, &target, &e);
        }
    }

    let mut nearest = String::from("/");
    let mut prefix = String::new();
    for segment in target.split('/').filter(|s| !s.is_empty()) {
        prefix.push('/');
        prefix.push_str(segment);

        match session.exists(&prefix) {
            Ok(true) => {
                nearest = prefix.clone();
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(dir = %prefix, error = %e, "directory probe failed");
                return fallback(&nearest, &target, &e);
            }
        }

        match session.mkdir(&prefix) {
            Ok(()) => {
                tracing::debug!(dir = %prefix, "created remote directory");
                nearest = prefix.clone();
            }
            Err(e) => {
                // Another invocation may have created it between the probe
                // and the mkdir; a re-probe settles it.
                if matches!(session.exists(&prefix), Ok(true)) {
                    nearest = prefix.clone();
                    continue;
                }
                tracing::warn!(dir = %prefix, error = %e, "directory creation failed");
                return fallback(&nearest, &target, &e);
            }
        }
    }

    EnsuredDir {
        dir: target,
        warning: None,
    }
}

fn fallback(nearest: &str, requested: &str, cause: &StoreError) -> EnsuredDir {
    EnsuredDir {
        dir: nearest.to_string(),
        warning: Some(format!(
            "could not create {requested} ({cause}); wrote to {nearest} instead"
        )),
    }
}
