//! Files to upload, and the per-file session record

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use progress_tracking::TransferProgressTracker;
use tokio::time::{Duration, Instant};
use ulid::Ulid;
use vault_types::FileRecord;
use vault_types::file_listing::{DEFAULT_MIME_TYPE, mime_type_for_extension};

use crate::errors::SessionError;

/// Identifies one upload session; assigned at submission and never reused.
pub type SessionId = Ulid;

/// MIME type for a file name, from its extension; `application/octet-stream` when unknown.
pub fn mime_type_for_file_name(name: &str) -> &'static str {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_type_for_extension)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// A file handed to the manager: a name, a declared MIME type and its contents.
#[derive(Clone)]
pub struct UploadFile {
    name: String,
    mime_type: String,
    data: Bytes,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size())
            .finish()
    }
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// In-memory contents, with the MIME type taken from the name's extension.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime_type = mime_type_for_file_name(&name);
        Self::new(name, mime_type, data)
    }

    /// Reads a file from disk.  The session name is the file's base name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SessionError::InvalidFile(format!("{} has no usable file name", path.display())))?
            .to_owned();
        let data = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(name, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// The contents; cloning is cheap.
    pub fn data(&self) -> Bytes {
        self.data.clone()
    }
}

/// Lifecycle state of an upload session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UploadState {
    /// Submitted, waiting for a transfer slot.
    Queued,
    /// The transfer is running.
    Transferring,
    /// Paused by the caller.  The transfer itself keeps running.
    Paused,
    /// The backend accepted the file.
    Completed,
    /// The transfer failed or was aborted.
    Failed,
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Completed | UploadState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadState::Queued => "queued",
            UploadState::Transferring => "transferring",
            UploadState::Paused => "paused",
            UploadState::Completed => "completed",
            UploadState::Failed => "failed",
        }
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time copy of one session, as handed to callers.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadSessionSnapshot {
    pub session_id: SessionId,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub state: UploadState,
    pub bytes_sent: u64,
    pub bytes_total: u64,
    pub progress_percent: u8,
    /// Instantaneous speed in bytes per second.
    pub speed: f64,
    /// Smoothed speed in bytes per second, when smoothing is configured.
    pub smoothed_speed: Option<f64>,
    /// Set only when `state` is `Failed`.
    pub error_detail: Option<String>,
    /// Set only when `state` is `Completed`.
    pub result_record: Option<FileRecord>,
}

/// The manager's record of one file's transfer.
#[derive(Debug)]
pub struct UploadSession {
    session_id: SessionId,
    file_name: String,
    file_size: u64,
    mime_type: String,
    pub(crate) state: UploadState,
    pub(crate) progress: TransferProgressTracker,
    pub(crate) error_detail: Option<String>,
    pub(crate) result_record: Option<FileRecord>,
}

impl UploadSession {
    pub(crate) fn new(file: &UploadFile, now: Instant, smoothing_half_life: Option<Duration>) -> Self {
        Self {
            session_id: Ulid::new(),
            file_name: file.name().to_owned(),
            file_size: file.size(),
            mime_type: file.mime_type().to_owned(),
            state: UploadState::Queued,
            progress: TransferProgressTracker::new(file.size(), now, smoothing_half_life),
            error_detail: None,
            result_record: None,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn snapshot(&self) -> UploadSessionSnapshot {
        let progress = self.progress.progress();
        UploadSessionSnapshot {
            session_id: self.session_id,
            file_name: self.file_name.clone(),
            file_size: self.file_size,
            mime_type: self.mime_type.clone(),
            state: self.state,
            bytes_sent: progress.bytes_sent,
            bytes_total: progress.bytes_total,
            progress_percent: progress.progress_percent,
            speed: progress.speed,
            smoothed_speed: progress.smoothed_speed,
            error_detail: self.error_detail.clone(),
            result_record: self.result_record.clone(),
        }
    }
}
