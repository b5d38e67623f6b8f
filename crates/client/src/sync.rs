//! Wiring facade: the stores, the estimation tracker and the feed tasks
//! behind them, constructed once at application start and torn down
//! explicitly. Nothing here is a global; a second [`DashboardSync`] is a
//! fully independent pipeline (useful against a second cluster, or in
//! tests).

use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use jd_domain::jobs::Job;
use jd_domain::servers::{normalize_servers, BackgroundJobServer};
use jd_domain::stats::{JobStats, StatsSnapshot};

use crate::config::DashboardConfig;
use crate::estimation::EstimationTracker;
use crate::reconnect::StreamBackoff;
use crate::sse::{spawn_json_feed, FeedHandle};
use crate::store::Store;

/// Owns the live stores for one dashboard connection.
///
/// Lifecycle: [`start`](Self::start) spawns one feed task per stream
/// endpoint; [`shutdown`](Self::shutdown) stops them all. The stores stay
/// readable after shutdown, frozen at their last value.
pub struct DashboardSync {
    http: reqwest::Client,
    stream_base: String,
    backoff: StreamBackoff,
    stats: Store<StatsSnapshot>,
    servers: Store<Vec<BackgroundJobServer>>,
    feeds: Vec<FeedHandle>,
}

impl DashboardSync {
    /// Connect the stats and servers streams and start keeping their
    /// stores current.
    ///
    /// Builds its own HTTP client with a connect timeout only: stream
    /// connections are long-lived, so a whole-request timeout (as the
    /// REST client uses) would sever them mid-flight.
    pub fn start(config: &DashboardConfig) -> jd_domain::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.api.timeout_secs))
            .build()
            .map_err(|e| jd_domain::Error::Config(format!("stream client build failed: {e}")))?;

        let backoff = StreamBackoff::from_millis(
            config.stream.initial_reconnect_ms,
            config.stream.max_reconnect_ms,
        );
        let stream_base = config.stream.base_url.clone();

        let stats: Store<StatsSnapshot> = Store::new();
        let stats_store = stats.clone();
        let tracker = Mutex::new(EstimationTracker::new());
        let stats_feed = spawn_json_feed::<JobStats, _>(
            &http,
            format!("{stream_base}/jobstats"),
            backoff.clone(),
            move |incoming| match tracker.lock().observe(&incoming, Utc::now()) {
                Some(estimation) => stats_store.set(StatsSnapshot::new(incoming, estimation)),
                None => tracing::debug!("stats snapshot skipped, unusable interval"),
            },
        );

        let servers: Store<Vec<BackgroundJobServer>> = Store::new();
        let servers_store = servers.clone();
        let servers_feed = spawn_json_feed::<Vec<BackgroundJobServer>, _>(
            &http,
            format!("{stream_base}/servers"),
            backoff.clone(),
            move |list| servers_store.set(normalize_servers(list)),
        );

        Ok(Self {
            http,
            stream_base,
            backoff,
            stats,
            servers,
            feeds: vec![stats_feed, servers_feed],
        })
    }

    /// Latest stats snapshot with its derived estimation.
    pub fn stats(&self) -> &Store<StatsSnapshot> {
        &self.stats
    }

    /// Latest server list, sorted by first heartbeat.
    pub fn servers(&self) -> &Store<Vec<BackgroundJobServer>> {
        &self.servers
    }

    /// Follow a single job's progress stream. The caller owns the
    /// returned handle and tears the stream down when the job view goes
    /// away.
    pub fn watch_job(&self, id: Uuid) -> (Store<Option<Job>>, FeedHandle) {
        let store: Store<Option<Job>> = Store::new();
        let job_store = store.clone();
        let handle = spawn_json_feed::<Job, _>(
            &self.http,
            format!("{}/jobs/{id}", self.stream_base),
            self.backoff.clone(),
            move |job| job_store.set(Some(job)),
        );
        (store, handle)
    }

    /// Stop every feed owned by this instance. Idempotent.
    pub fn shutdown(&self) {
        for feed in &self.feeds {
            feed.close();
        }
    }
}
