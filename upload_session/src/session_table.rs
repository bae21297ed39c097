//! The session set and its state machine
//!
//! ```text
//! Queued --(slot granted)--> Transferring
//! Transferring --(pause)--> Paused --(resume)--> Transferring
//! Transferring | Paused --(2xx with valid descriptor)--> Completed
//! Queued | Transferring | Paused --(error or abort)--> Failed
//! ```
//!
//! `Completed` and `Failed` never change again.  Every method takes the current time explicitly,
//! so the table has no clock or I/O of its own.

use tokio::time::{Duration, Instant};
use tracing::debug;
use vault_types::FileRecord;

use crate::session::{SessionId, UploadFile, UploadSession, UploadSessionSnapshot, UploadState};

/// All sessions known to a manager, in submission order.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: Vec<UploadSession>,
    smoothing_half_life: Option<Duration>,
}

impl SessionTable {
    pub fn new(smoothing_half_life: Option<Duration>) -> Self {
        Self {
            sessions: Vec::new(),
            smoothing_half_life,
        }
    }

    fn find_mut(&mut self, id: SessionId) -> Option<&mut UploadSession> {
        self.sessions.iter_mut().find(|s| s.session_id() == id)
    }

    /// Appends a `Queued` session for `file`.
    pub fn insert(&mut self, file: &UploadFile, now: Instant) -> SessionId {
        let session = UploadSession::new(file, now, self.smoothing_half_life);
        let id = session.session_id();
        self.sessions.push(session);
        id
    }

    /// `Queued -> Transferring`; the speed reference starts at `now`.
    pub fn start_transfer(&mut self, id: SessionId, now: Instant) -> Option<UploadSessionSnapshot> {
        let session = self.find_mut(id)?;
        if session.state != UploadState::Queued {
            return None;
        }
        session.state = UploadState::Transferring;
        session.progress.start(now);
        Some(session.snapshot())
    }

    /// `Transferring -> Paused`.  Returns whether the state changed.
    pub fn pause(&mut self, id: SessionId) -> bool {
        match self.find_mut(id) {
            Some(session) if session.state == UploadState::Transferring => {
                session.state = UploadState::Paused;
                true
            },
            _ => false,
        }
    }

    /// `Paused -> Transferring`.  Returns whether the state changed.
    pub fn resume(&mut self, id: SessionId) -> bool {
        match self.find_mut(id) {
            Some(session) if session.state == UploadState::Paused => {
                session.state = UploadState::Transferring;
                true
            },
            _ => false,
        }
    }

    /// Applies a progress tick and returns the new snapshot.
    ///
    /// Pausing does not stop the transfer, so a `Paused` session keeps counting and stays
    /// `Paused`.  Ticks for unknown, queued or terminal sessions are ignored.
    pub fn record_progress(
        &mut self,
        id: SessionId,
        loaded: u64,
        total: u64,
        now: Instant,
    ) -> Option<UploadSessionSnapshot> {
        let session = self.find_mut(id)?;
        match session.state {
            UploadState::Transferring | UploadState::Paused => {
                session.progress.record(loaded, total, now);
                Some(session.snapshot())
            },
            state => {
                debug!(%id, %state, loaded, "ignoring progress tick");
                None
            },
        }
    }

    /// `Transferring | Paused -> Completed` with the backend's record.
    pub fn complete(&mut self, id: SessionId, record: FileRecord) -> Option<UploadSessionSnapshot> {
        let session = self.find_mut(id)?;
        if !matches!(session.state, UploadState::Transferring | UploadState::Paused) {
            debug!(%id, state = %session.state, "ignoring completion");
            return None;
        }
        session.state = UploadState::Completed;
        session.progress.complete();
        session.result_record = Some(record);
        Some(session.snapshot())
    }

    /// Any non-terminal state `-> Failed` with a human-readable detail.
    pub fn fail(&mut self, id: SessionId, error_detail: String) -> Option<UploadSessionSnapshot> {
        let session = self.find_mut(id)?;
        if session.state.is_terminal() {
            debug!(%id, state = %session.state, "ignoring failure");
            return None;
        }
        session.state = UploadState::Failed;
        session.error_detail = Some(error_detail);
        Some(session.snapshot())
    }

    /// Removes a session regardless of its state.
    pub fn remove(&mut self, id: SessionId) -> Option<UploadSession> {
        let idx = self.sessions.iter().position(|s| s.session_id() == id)?;
        Some(self.sessions.remove(idx))
    }

    pub fn get(&self, id: SessionId) -> Option<UploadSessionSnapshot> {
        self.sessions.iter().find(|s| s.session_id() == id).map(UploadSession::snapshot)
    }

    pub fn snapshots(&self) -> Vec<UploadSessionSnapshot> {
        self.sessions.iter().map(UploadSession::snapshot).collect()
    }

    /// Whether any session is still `Queued`, `Transferring` or `Paused`.
    pub fn has_active(&self) -> bool {
        self.sessions.iter().any(|s| !s.state().is_terminal())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
