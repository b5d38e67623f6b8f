//! Client-side synchronization core for a background-job dashboard.
//!
//! The server owns all job state and publishes it two ways: one-way
//! server-sent event streams (`jobstats`, `servers`, per-job) and a
//! paginated REST API. This crate keeps a local, subscribable copy of
//! that state current:
//!
//! - [`store::Store`] — single-slot publish/subscribe holder per entity
//! - [`sse`] — auto-reconnecting event-stream ingestion
//! - [`estimation`] — throughput/ETA derivation from stats snapshots
//! - [`rest`] — typed client for the REST surface
//! - [`sync::DashboardSync`] — facade wiring the above together
//!
//! Everything a view layer may depend on is `Store::get`/`subscribe`,
//! the REST client, and the pure formatters in `jd-domain`.

pub mod config;
pub mod estimation;
pub mod reconnect;
pub mod rest;
pub mod sse;
pub mod store;
pub mod sync;

pub use config::DashboardConfig;
pub use rest::DashboardApi;
pub use sse::FeedHandle;
pub use store::{Store, Subscription};
pub use sync::DashboardSync;
