//! Completion-time estimation from successive stats snapshots.
//!
//! The tracker watches the `succeeded` counter between an anchor snapshot
//! and the current one to derive a throughput, then projects the time to
//! drain the `enqueued` backlog. The anchor is set once, on the first
//! snapshot that shows work in flight, and never advances afterwards, so
//! the rate is measured against the start of the processing run rather
//! than a sliding window. Re-anchoring per estimate would track shifting
//! throughput more closely; see DESIGN.md for why the fixed anchor is
//! kept.

use chrono::{DateTime, Duration, Utc};

use jd_domain::stats::{Estimation, JobStats};

struct Anchor {
    succeeded: u64,
    at: DateTime<Utc>,
}

/// Derives an [`Estimation`] for each incoming [`JobStats`] snapshot.
/// One tracker per stats feed; created with the feed, never reset.
#[derive(Default)]
pub struct EstimationTracker {
    anchor: Option<Anchor>,
}

impl EstimationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one snapshot observed at `now`.
    ///
    /// Returns `None` when no estimation can be emitted this cycle (the
    /// elapsed interval since the anchor is not positive); the caller
    /// must then leave its previous published snapshot untouched.
    pub fn observe(&mut self, stats: &JobStats, now: DateTime<Utc>) -> Option<Estimation> {
        // Re-evaluated from scratch on every snapshot: a drained queue is
        // not a terminal state, work may arrive again.
        if stats.is_drained() {
            return Some(Estimation::done());
        }

        let anchor = match &self.anchor {
            None => {
                self.anchor = Some(Anchor {
                    succeeded: stats.succeeded,
                    at: now,
                });
                return Some(Estimation::not_yet_available());
            }
            Some(anchor) => anchor,
        };

        let delta_succeeded = stats.succeeded.saturating_sub(anchor.succeeded);
        if delta_succeeded < 1 {
            // Throughput not observable yet; keep waiting from the same
            // baseline.
            return Some(Estimation::not_yet_available());
        }

        let elapsed_ms = (now - anchor.at).num_milliseconds();
        if elapsed_ms <= 0 {
            return None;
        }

        let rate = delta_succeeded as f64 * 1_000.0 / elapsed_ms as f64;
        let eta_ms = stats.enqueued as f64 / rate * 1_000.0;
        if !eta_ms.is_finite() {
            return Some(Estimation::not_yet_available());
        }

        match now.checked_add_signed(Duration::milliseconds(eta_ms.round() as i64)) {
            Some(eta) => Some(Estimation::available(eta)),
            // Projection beyond representable time: no usable ETA.
            None => Some(Estimation::not_yet_available()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stats(enqueued: u64, processing: u64, succeeded: u64) -> JobStats {
        JobStats {
            enqueued,
            processing,
            succeeded,
            ..JobStats::default()
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn drained_queue_is_done_regardless_of_history() {
        let mut tracker = EstimationTracker::new();
        assert_eq!(
            tracker.observe(&stats(0, 0, 100), t0()),
            Some(Estimation::done())
        );

        // Also after anchoring.
        tracker.observe(&stats(10, 1, 0), t0());
        assert_eq!(
            tracker.observe(&stats(0, 0, 10), t0() + Duration::seconds(5)),
            Some(Estimation::done())
        );
    }

    #[test]
    fn first_busy_snapshot_anchors_without_estimate() {
        let mut tracker = EstimationTracker::new();
        assert_eq!(
            tracker.observe(&stats(10, 2, 0), t0()),
            Some(Estimation::not_yet_available())
        );
    }

    #[test]
    fn second_snapshot_projects_eta_from_observed_rate() {
        let mut tracker = EstimationTracker::new();
        tracker.observe(&stats(10, 2, 0), t0());

        // Two succeeded in two seconds: one per second; eight left.
        let now = t0() + Duration::milliseconds(2_000);
        let estimation = tracker.observe(&stats(8, 2, 2), now).unwrap();
        assert!(estimation.estimated_processing_time_available);
        assert_eq!(
            estimation.estimated_processing_time,
            Some(now + Duration::seconds(8))
        );
    }

    #[test]
    fn no_progress_keeps_waiting_from_the_same_baseline() {
        let mut tracker = EstimationTracker::new();
        tracker.observe(&stats(10, 2, 0), t0());

        let later = t0() + Duration::seconds(3);
        assert_eq!(
            tracker.observe(&stats(10, 2, 0), later),
            Some(Estimation::not_yet_available())
        );

        // The original anchor still drives the rate once progress shows:
        // 4 succeeded over 4s from t0, not over 1s from the last call.
        let now = t0() + Duration::seconds(4);
        let estimation = tracker.observe(&stats(4, 2, 4), now).unwrap();
        assert_eq!(
            estimation.estimated_processing_time,
            Some(now + Duration::seconds(4))
        );
    }

    #[test]
    fn anchor_stays_fixed_across_estimates() {
        let mut tracker = EstimationTracker::new();
        tracker.observe(&stats(100, 4, 0), t0());

        let first = tracker
            .observe(&stats(90, 4, 10), t0() + Duration::seconds(10))
            .unwrap();
        assert!(first.estimated_processing_time_available);

        // 20 succeeded over 20s from the ORIGINAL anchor: still 1/s.
        let now = t0() + Duration::seconds(20);
        let second = tracker.observe(&stats(80, 4, 20), now).unwrap();
        assert_eq!(
            second.estimated_processing_time,
            Some(now + Duration::seconds(80))
        );
    }

    #[test]
    fn non_positive_elapsed_skips_emission() {
        let mut tracker = EstimationTracker::new();
        tracker.observe(&stats(10, 2, 0), t0());

        // Same instant: interval is zero, nothing can be derived.
        assert_eq!(tracker.observe(&stats(8, 2, 2), t0()), None);
        // Clock went backwards.
        assert_eq!(
            tracker.observe(&stats(8, 2, 2), t0() - Duration::seconds(1)),
            None
        );
    }

    #[test]
    fn succeeded_counter_reset_is_not_progress() {
        let mut tracker = EstimationTracker::new();
        tracker.observe(&stats(10, 2, 50), t0());

        // Counter below the anchor (e.g. server-side reset): treated as
        // no observable throughput, not a panic or a negative rate.
        assert_eq!(
            tracker.observe(&stats(10, 2, 40), t0() + Duration::seconds(2)),
            Some(Estimation::not_yet_available())
        );
    }

    #[test]
    fn done_does_not_clear_the_anchor() {
        let mut tracker = EstimationTracker::new();
        tracker.observe(&stats(10, 2, 0), t0());
        tracker.observe(&stats(0, 0, 10), t0() + Duration::seconds(1));

        // Work arrives again: the old anchor is still the baseline.
        let now = t0() + Duration::seconds(10);
        let estimation = tracker.observe(&stats(5, 1, 10), now).unwrap();
        assert_eq!(
            estimation.estimated_processing_time,
            Some(now + Duration::seconds(5))
        );
    }
}
