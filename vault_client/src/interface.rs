use bytes::Bytes;
use progress_tracking::ProgressCallback;
use vault_types::{FileRecord, HealthStatus, LoginSession};

use crate::error::{Result, UploadError};

/// Sends one file to the backend.
///
/// Implementations report `(loaded, total)` through `progress_callback` as bytes are handed to
/// the connection, with loaded non-decreasing.  Uploads are attempted exactly once.
#[async_trait::async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload_file(
        &self,
        name: &str,
        mime_type: &str,
        data: Bytes,
        progress_callback: ProgressCallback,
    ) -> std::result::Result<FileRecord, UploadError>;
}

/// The non-upload API calls: account management and the file library.
#[async_trait::async_trait]
pub trait FileLibraryClient: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginSession>;

    /// Creates an account and returns the new user id.
    async fn register(&self, email: &str, password: &str) -> Result<String>;

    async fn list_files(&self) -> Result<Vec<FileRecord>>;

    async fn delete_file(&self, file_id: &str) -> Result<()>;

    async fn health(&self) -> Result<HealthStatus>;
}
