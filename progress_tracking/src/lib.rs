mod transfer_progress;

use std::sync::Arc;

pub use transfer_progress::{TransferProgress, TransferProgressTracker, progress_percent};

/// Callback invoked by a transport as bytes are acknowledged, with `(loaded, total)`.
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// A callback that drops every update.
pub fn no_op_progress_callback() -> ProgressCallback {
    Arc::new(|_, _| {})
}
