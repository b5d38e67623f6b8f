//! Typed HTTP client for the dashboard REST API.
//!
//! Reads retry on transport errors and 5xx with exponential backoff;
//! client errors (4xx) surface immediately. Mutations are user actions
//! and are never retried automatically; the caller decides.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use jd_domain::jobs::{Job, JobState, Page, PageRequest, RecurringJob};
use jd_domain::problems::{Problem, ProblemKind, VersionInfo};
use jd_domain::servers::{normalize_servers, BackgroundJobServer};
use jd_domain::{Error, Result};

use crate::config::ApiConfig;
use crate::store::Store;

/// Client for the dashboard REST surface.
pub struct DashboardApi {
    http: reqwest::Client,
    config: ApiConfig,
}

impl DashboardApi {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("HTTP client build failed: {e}")))?;
        Ok(Self { http, config })
    }

    // ── Reads ──────────────────────────────────────────────────────

    /// All known job servers, sorted by first heartbeat and unique by id.
    pub async fn servers(&self) -> Result<Vec<BackgroundJobServer>> {
        let servers: Vec<BackgroundJobServer> = self.get_json("/servers").await?;
        Ok(normalize_servers(servers))
    }

    pub async fn jobs(&self, state: JobState, page: &PageRequest) -> Result<Page<Job>> {
        self.get_json(&format!("/jobs?state={}&{}", state.as_str(), page.to_query()))
            .await
    }

    pub async fn job(&self, id: Uuid) -> Result<Job> {
        self.get_json(&format!("/jobs/{id}")).await
    }

    pub async fn recurring_jobs(&self, page: &PageRequest) -> Result<Page<RecurringJob>> {
        self.get_json(&format!("/recurring-jobs?{}", page.to_query()))
            .await
    }

    /// Distinct signatures of all known jobs, for filter dropdowns.
    pub async fn job_signatures(&self) -> Result<Vec<String>> {
        self.get_json("/job-signatures").await
    }

    pub async fn problems(&self) -> Result<Vec<Problem>> {
        self.get_json("/problems").await
    }

    pub async fn version(&self) -> Result<VersionInfo> {
        self.get_json("/version").await
    }

    // ── Mutations (204 on success) ─────────────────────────────────

    pub async fn delete_job(&self, id: Uuid) -> Result<()> {
        self.expect_no_content(self.http.delete(self.url(&format!("/jobs/{id}"))))
            .await
    }

    pub async fn requeue_job(&self, id: Uuid) -> Result<()> {
        self.expect_no_content(self.http.post(self.url(&format!("/jobs/{id}/requeue"))))
            .await
    }

    pub async fn delete_recurring_job(&self, id: &str) -> Result<()> {
        self.expect_no_content(self.http.delete(self.url(&format!("/recurring-jobs/{id}"))))
            .await
    }

    pub async fn trigger_recurring_job(&self, id: &str) -> Result<()> {
        self.expect_no_content(
            self.http
                .post(self.url(&format!("/recurring-jobs/{id}/trigger"))),
        )
        .await
    }

    pub async fn dismiss_problem(&self, kind: ProblemKind) -> Result<()> {
        self.expect_no_content(self.http.delete(self.url(&format!("/problems/{}", kind.as_str()))))
            .await
    }

    // ── Cancellable refresh ────────────────────────────────────────

    /// One-shot refresh of the server list into a store. A response that
    /// completes after `cancel` fired is discarded, never applied.
    pub async fn refresh_servers_into(
        &self,
        store: &Store<Vec<BackgroundJobServer>>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let servers = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            r = self.servers() => r?,
        };
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        store.set(servers);
        Ok(())
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);

        let mut last_err = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff =
                    Duration::from_millis(self.config.retry_backoff_ms << (attempt - 1).min(6));
                tokio::time::sleep(backoff).await;
            }

            let start = Instant::now();
            match self.http.get(&url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    tracing::debug!(
                        %url,
                        status = status.as_u16(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        attempt,
                        "dashboard API call"
                    );

                    if status.is_success() {
                        return resp.json::<T>().await.map_err(|e| Error::Http(e.to_string()));
                    }

                    let err = Error::Api {
                        status: status.as_u16(),
                        message: resp.text().await.unwrap_or_default(),
                    };
                    if status.is_client_error() {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
                Err(e) => {
                    last_err = Some(Error::Http(e.to_string()));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Http("retries exhausted".into())))
    }

    async fn expect_no_content(&self, request: reqwest::RequestBuilder) -> Result<()> {
        let resp = request.send().await.map_err(|e| Error::Http(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            if status != StatusCode::NO_CONTENT {
                tracing::debug!(status = status.as_u16(), "mutation returned a body");
            }
            return Ok(());
        }
        Err(Error::Api {
            status: status.as_u16(),
            message: resp.text().await.unwrap_or_default(),
        })
    }
}
