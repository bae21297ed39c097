//! Error types for upload-session

use thiserror::Error;
use vault_client::VaultClientError;

/// Errors from creating a manager or preparing files.  Failures of individual uploads are not
/// errors here; they are recorded on the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No tokio runtime available; the upload manager must be created inside a runtime")]
    NoRuntime,

    #[error("Client error: {0}")]
    Client(#[from] VaultClientError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file: {0}")]
    InvalidFile(String),
}
