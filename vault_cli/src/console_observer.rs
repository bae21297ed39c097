use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use upload_session::{SessionId, SessionOutcome, SessionProgress, UploadObserver, UploadState};
use utils::output_bytes;

/// Prints one line to stderr whenever a session's percentage or state changes, and one line per
/// finished upload.
#[derive(Default)]
pub(crate) struct ConsoleObserver {
    last_seen: Mutex<HashMap<SessionId, (u8, UploadState)>>,
}

#[async_trait]
impl UploadObserver for ConsoleObserver {
    async fn on_progress(&self, progress: SessionProgress) {
        let key = (progress.progress_percent, progress.state);
        let changed = self.last_seen.lock().insert(progress.session_id, key) != Some(key);
        if changed {
            eprintln!("{}", progress_line(&progress));
        }
    }

    async fn on_terminal(&self, outcome: SessionOutcome) {
        self.last_seen.lock().remove(&outcome.session_id());
        eprintln!("{}", outcome_line(&outcome));
    }
}

pub(crate) fn progress_line(progress: &SessionProgress) -> String {
    let speed = progress.smoothed_speed.unwrap_or(progress.speed);
    format!(
        "{}: {:>3}% ({} of {}) {}/s [{}]",
        progress.file_name,
        progress.progress_percent,
        output_bytes(progress.bytes_sent),
        output_bytes(progress.bytes_total),
        output_bytes(speed.max(0.0) as u64),
        progress.state
    )
}

pub(crate) fn outcome_line(outcome: &SessionOutcome) -> String {
    match outcome {
        SessionOutcome::Completed { file_name, record, .. } => {
            format!("{file_name}: uploaded as {} ({})", record.id, record.url)
        },
        SessionOutcome::Failed {
            file_name, error_detail, ..
        } => format!("{file_name}: failed: {error_detail}"),
    }
}
