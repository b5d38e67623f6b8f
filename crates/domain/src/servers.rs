//! Background job server descriptors as published on the `servers`
//! event stream and `GET /api/servers`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One worker host in the cluster, keyed by `id`. Heartbeats and resource
/// gauges are refreshed by the server on every announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundJobServer {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    pub worker_pool_size: u32,
    pub poll_interval_in_seconds: u32,
    pub first_heartbeat: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
    pub running: bool,
    #[serde(default)]
    pub system_total_memory: i64,
    #[serde(default)]
    pub system_free_memory: i64,
    #[serde(default)]
    pub system_cpu_load: f64,
    #[serde(default)]
    pub process_max_memory: i64,
    #[serde(default)]
    pub process_free_memory: i64,
    #[serde(default)]
    pub process_allocated_memory: i64,
    #[serde(default)]
    pub process_cpu_load: f64,
}

/// Normalize a server list as received from the wire: unique by `id`
/// (the last occurrence wins) and sorted by `first_heartbeat` ascending.
/// Both the stream and the REST endpoint may deliver duplicates during a
/// server restart window.
pub fn normalize_servers(mut servers: Vec<BackgroundJobServer>) -> Vec<BackgroundJobServer> {
    // Last occurrence wins, so walk from the end and keep first-seen ids.
    let mut seen = std::collections::HashSet::new();
    let mut deduped = Vec::with_capacity(servers.len());
    while let Some(server) = servers.pop() {
        if seen.insert(server.id) {
            deduped.push(server);
        }
    }
    deduped.sort_by_key(|s| s.first_heartbeat);
    deduped
}
