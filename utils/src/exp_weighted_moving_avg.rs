use tokio::time::{Duration, Instant};

/// Exponentially-weighted moving average with a time-based half-life.
///
/// The decay factor for elapsed time Δt is: decay = 2^(-Δt / half_life).  Timestamps are
/// passed in by the caller so that a sample is always weighted against the moment it was
/// observed, not the moment it was folded in.
#[derive(Debug, Clone)]
pub struct ExpWeightedMovingAvg {
    half_life_secs: f64,
    last_update: Instant,
    weight: f64,
    value: f64,
}

impl ExpWeightedMovingAvg {
    /// Create a new tracker using the given half-life, starting the clock at `start`.
    pub fn new_time_decay(half_life: Duration, start: Instant) -> Self {
        let hl_secs = half_life.as_secs_f64();
        assert!(hl_secs.is_finite() && hl_secs > 0.0, "half-life must be positive");

        Self {
            half_life_secs: hl_secs,
            last_update: start,
            weight: 0.0,
            value: 0.0,
        }
    }

    /// Add a sample observed at `now`, decaying existing state first.  A timestamp earlier
    /// than the previous one applies no decay.
    pub fn update_at(&mut self, sample: f64, now: Instant) {
        let dt_secs = now.saturating_duration_since(self.last_update).as_secs_f64();

        // decay = 2^(-Δt / T½)
        let decay = (-dt_secs / self.half_life_secs).exp2();
        self.last_update = self.last_update.max(now);

        self.weight *= decay;
        self.value *= decay;

        self.weight += 1.0;
        self.value += sample;
    }

    /// Current exponentially-weighted mean (0.0 if no samples yet).
    pub fn value(&self) -> f64 {
        if self.weight == 0.0 {
            0.0
        } else {
            self.value / self.weight
        }
    }
}
