//! Aggregate job counters pushed by the dashboard event stream, plus the
//! client-side completion estimate attached to each snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate counters for every job state, as published on the
/// `jobstats` event stream. Each message carries the full set; a new
/// message supersedes the previous one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobStats {
    pub scheduled: u64,
    pub enqueued: u64,
    pub processing: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub deleted: u64,
    pub all_time_succeeded: u64,
    pub background_job_servers: u64,
    pub recurring_jobs: u64,
}

impl JobStats {
    /// True when nothing is waiting and nothing is running.
    pub fn is_drained(&self) -> bool {
        self.enqueued < 1 && self.processing < 1
    }
}

/// Completion estimate derived from two successive [`JobStats`] snapshots.
/// Never produced by the server; recomputed client-side on every message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Estimation {
    pub processing_done: bool,
    pub estimated_processing_time_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_processing_time: Option<DateTime<Utc>>,
}

impl Estimation {
    /// Queue is drained: nothing enqueued, nothing processing.
    pub fn done() -> Self {
        Self {
            processing_done: true,
            estimated_processing_time_available: false,
            estimated_processing_time: None,
        }
    }

    /// Work remains but throughput has not been observed yet.
    pub fn not_yet_available() -> Self {
        Self {
            processing_done: false,
            estimated_processing_time_available: false,
            estimated_processing_time: None,
        }
    }

    /// Work remains and an ETA could be computed from observed throughput.
    pub fn available(eta: DateTime<Utc>) -> Self {
        Self {
            processing_done: false,
            estimated_processing_time_available: true,
            estimated_processing_time: Some(eta),
        }
    }
}

/// What the stats store holds: the last received counters plus the
/// estimate derived from them. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    #[serde(flatten)]
    pub stats: JobStats,
    pub estimation: Estimation,
}

impl StatsSnapshot {
    pub fn new(stats: JobStats, estimation: Estimation) -> Self {
        Self { stats, estimation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zeroed() {
        let stats = JobStats::default();
        assert_eq!(stats.enqueued, 0);
        assert_eq!(stats.succeeded, 0);
        assert_eq!(stats.all_time_succeeded, 0);
        assert!(stats.is_drained());
    }

    #[test]
    fn drained_requires_both_counters_empty() {
        let mut stats = JobStats::default();
        stats.enqueued = 1;
        assert!(!stats.is_drained());

        stats.enqueued = 0;
        stats.processing = 3;
        assert!(!stats.is_drained());
    }

    #[test]
    fn stats_deserialize_from_wire_message() {
        let json = serde_json::json!({
            "scheduled": 2,
            "enqueued": 10,
            "processing": 4,
            "succeeded": 120,
            "failed": 1,
            "deleted": 0,
            "allTimeSucceeded": 9000,
            "backgroundJobServers": 3,
            "recurringJobs": 5,
        });
        let stats: JobStats = serde_json::from_value(json).unwrap();
        assert_eq!(stats.enqueued, 10);
        assert_eq!(stats.all_time_succeeded, 9000);
        assert_eq!(stats.background_job_servers, 3);
    }

    #[test]
    fn stats_tolerate_missing_fields() {
        let stats: JobStats = serde_json::from_value(serde_json::json!({
            "enqueued": 7,
        }))
        .unwrap();
        assert_eq!(stats.enqueued, 7);
        assert_eq!(stats.succeeded, 0);
    }

    #[test]
    fn estimation_constructors() {
        assert!(Estimation::done().processing_done);
        assert!(!Estimation::done().estimated_processing_time_available);

        let pending = Estimation::not_yet_available();
        assert!(!pending.processing_done);
        assert!(!pending.estimated_processing_time_available);
        assert!(pending.estimated_processing_time.is_none());

        let eta = Utc::now();
        let avail = Estimation::available(eta);
        assert!(avail.estimated_processing_time_available);
        assert_eq!(avail.estimated_processing_time, Some(eta));
    }

    #[test]
    fn snapshot_serializes_flat_with_estimation() {
        let snap = StatsSnapshot::new(JobStats::default(), Estimation::done());
        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(value["enqueued"], 0);
        assert_eq!(value["estimation"]["processingDone"], true);
    }
}
