//! Reconnect pacing for the event-stream feeds.

use std::time::Duration;

/// Jittered exponential delay between reconnect attempts. Feeds retry
/// forever; gaps in the stream carry no meaning beyond "nothing new yet",
/// so giving up is never correct here.
#[derive(Debug, Clone)]
pub struct StreamBackoff {
    /// Delay before the first reconnect attempt.
    pub initial: Duration,
    /// Cap on the delay between attempts.
    pub max: Duration,
}

impl Default for StreamBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
        }
    }
}

impl StreamBackoff {
    pub fn from_millis(initial_ms: u64, max_ms: u64) -> Self {
        Self {
            initial: Duration::from_millis(initial_ms),
            max: Duration::from_millis(max_ms),
        }
    }

    /// Delay for the given consecutive-failure count (0-indexed),
    /// doubling per attempt up to the cap, with ~20% deterministic
    /// jitter to spread reconnect storms.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.initial.as_millis() as f64;
        let exp_ms = base_ms * 2f64.powi(attempt.min(24) as i32);
        let capped_ms = exp_ms.min(self.max.as_millis() as f64);
        let jitter = capped_ms * 0.2 * jitter_fraction(attempt);
        Duration::from_millis((capped_ms + jitter) as u64)
    }
}

/// Deterministic pseudo-random fraction in `[0, 1)` from the attempt
/// number; enough to de-synchronize clients, nothing more.
fn jitter_fraction(attempt: u32) -> f64 {
    let hash = attempt.wrapping_add(1).wrapping_mul(0x9E37_79B9);
    f64::from(hash >> 8) / f64::from(1u32 << 24)
}
