use more_asserts::debug_assert_le;
use tokio::time::{Duration, Instant};
use tracing::debug;
use utils::ExpWeightedMovingAvg;

/// Rounded completion percentage in `[0, 100]`; `0` when `total` is zero.
pub fn progress_percent(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (loaded.min(total) as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// The visible counters of one transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferProgress {
    pub bytes_sent: u64,
    pub bytes_total: u64,
    pub progress_percent: u8,
    /// Instantaneous speed in bytes per second.
    pub speed: f64,
    /// Time-decayed average speed, present only when smoothing is enabled.
    pub smoothed_speed: Option<f64>,
}

/// Bookkeeping for the progress ticks of a single transfer.
///
/// Each tick reports `(loaded, total)` observed at `now`.  The speed is the byte delta since the
/// previous tick over the elapsed time, and is zero when no time has passed.  The previous-tick
/// reference starts at zero bytes at the moment the transfer starts.
#[derive(Debug, Clone)]
pub struct TransferProgressTracker {
    progress: TransferProgress,
    prev_loaded: u64,
    prev_timestamp: Instant,
    smoothing_half_life: Option<Duration>,
    smoothed: Option<ExpWeightedMovingAvg>,
}

impl TransferProgressTracker {
    pub fn new(bytes_total: u64, start: Instant, smoothing_half_life: Option<Duration>) -> Self {
        let smoothing_half_life = smoothing_half_life.filter(|hl| !hl.is_zero());
        Self {
            progress: TransferProgress {
                bytes_sent: 0,
                bytes_total,
                progress_percent: 0,
                speed: 0.0,
                smoothed_speed: smoothing_half_life.map(|_| 0.0),
            },
            prev_loaded: 0,
            prev_timestamp: start,
            smoothing_half_life,
            smoothed: smoothing_half_life.map(|hl| ExpWeightedMovingAvg::new_time_decay(hl, start)),
        }
    }

    /// Resets the previous-tick reference to `(0, start)`; called when the transfer actually begins.
    pub fn start(&mut self, start: Instant) {
        self.prev_loaded = 0;
        self.prev_timestamp = start;
        if let Some(hl) = self.smoothing_half_life {
            self.smoothed = Some(ExpWeightedMovingAvg::new_time_decay(hl, start));
        }
    }

    /// Applies a live tick and returns the updated counters.
    pub fn record(&mut self, loaded: u64, total: u64, now: Instant) -> TransferProgress {
        if total > 0 {
            self.progress.bytes_total = total;
        }

        let delta_bytes = loaded.saturating_sub(self.prev_loaded);
        let delta_secs = now.saturating_duration_since(self.prev_timestamp).as_secs_f64();
        let speed = if delta_secs > 0.0 {
            delta_bytes as f64 / delta_secs
        } else {
            0.0
        };

        let bytes_sent = loaded.min(self.progress.bytes_total).max(self.progress.bytes_sent);
        self.progress.bytes_sent = bytes_sent;
        self.progress.progress_percent = progress_percent(bytes_sent, self.progress.bytes_total);
        self.progress.speed = speed;

        if let Some(avg) = self.smoothed.as_mut() {
            avg.update_at(speed, now);
            self.progress.smoothed_speed = Some(avg.value());
        }

        self.prev_loaded = loaded;
        self.prev_timestamp = now;

        debug_assert_le!(self.progress.progress_percent, 100);
        debug!(loaded, total, speed, percent = self.progress.progress_percent, "progress tick");

        self.progress
    }

    /// Marks every byte as sent.
    pub fn complete(&mut self) -> TransferProgress {
        self.progress.bytes_sent = self.progress.bytes_total;
        self.progress.progress_percent = 100;
        self.progress
    }

    pub fn progress(&self) -> TransferProgress {
        self.progress
    }
}
