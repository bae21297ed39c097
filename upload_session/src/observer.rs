//! Notifications from the manager to its caller

use async_trait::async_trait;
use vault_types::FileRecord;

use crate::session::{SessionId, UploadSessionSnapshot, UploadState};

/// A progress or state update for one session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionProgress {
    pub session_id: SessionId,
    pub file_name: String,
    pub state: UploadState,
    pub bytes_sent: u64,
    pub bytes_total: u64,
    pub progress_percent: u8,
    pub speed: f64,
    pub smoothed_speed: Option<f64>,
}

impl From<&UploadSessionSnapshot> for SessionProgress {
    fn from(s: &UploadSessionSnapshot) -> Self {
        Self {
            session_id: s.session_id,
            file_name: s.file_name.clone(),
            state: s.state,
            bytes_sent: s.bytes_sent,
            bytes_total: s.bytes_total,
            progress_percent: s.progress_percent,
            speed: s.speed,
            smoothed_speed: s.smoothed_speed,
        }
    }
}

/// How a session ended.  Delivered exactly once per session that reaches a terminal state.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionOutcome {
    Completed {
        session_id: SessionId,
        file_name: String,
        record: FileRecord,
    },
    Failed {
        session_id: SessionId,
        file_name: String,
        error_detail: String,
    },
}

impl SessionOutcome {
    pub fn session_id(&self) -> SessionId {
        match self {
            SessionOutcome::Completed { session_id, .. } | SessionOutcome::Failed { session_id, .. } => *session_id,
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            SessionOutcome::Completed { file_name, .. } | SessionOutcome::Failed { file_name, .. } => file_name,
        }
    }

    /// Builds the outcome of a terminal snapshot; `None` while the session is still active.
    pub(crate) fn from_snapshot(s: &UploadSessionSnapshot) -> Option<Self> {
        match (s.state, &s.result_record, &s.error_detail) {
            (UploadState::Completed, Some(record), _) => Some(SessionOutcome::Completed {
                session_id: s.session_id,
                file_name: s.file_name.clone(),
                record: record.clone(),
            }),
            (UploadState::Failed, _, Some(detail)) => Some(SessionOutcome::Failed {
                session_id: s.session_id,
                file_name: s.file_name.clone(),
                error_detail: detail.clone(),
            }),
            _ => None,
        }
    }
}

/// Receives updates from an [crate::UploadSessionManager].
///
/// Calls are made one at a time from the manager's event loop, in the order the events were
/// applied; a slow observer delays later notifications but never blocks a transfer.
#[async_trait]
pub trait UploadObserver: Send + Sync {
    async fn on_progress(&self, progress: SessionProgress);

    async fn on_terminal(&self, outcome: SessionOutcome);
}

/// An observer that ignores everything; callers can poll `sessions()` instead.
#[derive(Debug, Default)]
pub struct NoOpUploadObserver;

#[async_trait]
impl UploadObserver for NoOpUploadObserver {
    async fn on_progress(&self, _progress: SessionProgress) {}

    async fn on_terminal(&self, _outcome: SessionOutcome) {}
}
