//! Job and recurring-job wire types, plus the pagination envelope used by
//! every list endpoint of the dashboard API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Scheduled,
    Enqueued,
    Processing,
    Succeeded,
    Failed,
    Deleted,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Scheduled => "SCHEDULED",
            JobState::Enqueued => "ENQUEUED",
            JobState::Processing => "PROCESSING",
            JobState::Succeeded => "SUCCEEDED",
            JobState::Failed => "FAILED",
            JobState::Deleted => "DELETED",
        }
    }
}

/// A single background job as returned by `GET /api/jobs` and pushed on
/// the per-job event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub job_name: String,
    #[serde(default)]
    pub job_signature: Option<String>,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Set while a server holds the job.
    #[serde(default)]
    pub server_id: Option<Uuid>,
    /// Most recent failure message, if the job has failed at least once.
    #[serde(default)]
    pub last_error: Option<String>,
}

/// A recurring job definition: a schedule expression (cron or interval,
/// possibly carrying a carbon-aware margin, see [`crate::schedule`]) plus
/// the next materialization time computed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringJob {
    pub id: String,
    pub job_name: String,
    pub schedule_expression: String,
    #[serde(default)]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub next_run: Option<DateTime<Utc>>,
}

// ── Pagination ─────────────────────────────────────────────────────

/// Envelope returned by every list endpoint:
/// `{total, limit, currentPage, items}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total: u64,
    pub limit: u32,
    pub current_page: u32,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Number of pages at the envelope's limit; zero items is zero pages.
    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit as u64) as u32
    }

    pub fn has_next(&self) -> bool {
        self.current_page + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 0
    }
}

/// `offset`/`limit`/`order` query parameters accepted by list endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u32,
    pub order: String,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
            order: "updatedAt:DESC".into(),
        }
    }
}

impl PageRequest {
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Render as a query string fragment (no leading `?`).
    pub fn to_query(&self) -> String {
        format!("offset={}&limit={}&order={}", self.offset, self.limit, self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_wire_names_are_screaming() {
        let json = serde_json::to_string(&JobState::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
        let back: JobState = serde_json::from_str("\"ENQUEUED\"").unwrap();
        assert_eq!(back, JobState::Enqueued);
    }

    #[test]
    fn job_deserializes_without_optional_fields() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "jobName": "send-invoice",
            "state": "SCHEDULED",
            "createdAt": "2024-06-15T09:00:00Z",
            "updatedAt": "2024-06-15T09:00:00Z",
        });
        let job: Job = serde_json::from_value(json).unwrap();
        assert_eq!(job.job_name, "send-invoice");
        assert!(job.server_id.is_none());
        assert!(job.last_error.is_none());
    }

    #[test]
    fn page_envelope_roundtrip() {
        let json = serde_json::json!({
            "total": 45,
            "limit": 20,
            "currentPage": 1,
            "items": ["a", "b"],
        });
        let page: Page<String> = serde_json::from_value(json).unwrap();
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn page_boundaries() {
        let page = Page::<u32> {
            total: 40,
            limit: 20,
            current_page: 1,
            items: vec![],
        };
        assert_eq!(page.total_pages(), 2);
        assert!(!page.has_next());

        let empty = Page::<u32> {
            total: 0,
            limit: 20,
            current_page: 0,
            items: vec![],
        };
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.has_next());
        assert!(!empty.has_previous());
    }

    #[test]
    fn page_request_query_rendering() {
        let req = PageRequest::default().with_offset(40).with_limit(10);
        assert_eq!(req.to_query(), "offset=40&limit=10&order=updatedAt:DESC");
    }

    #[test]
    fn recurring_job_deserializes_with_margin_expression() {
        let json = serde_json::json!({
            "id": "daily-report",
            "jobName": "generate daily report",
            "scheduleExpression": "0 3 * * * [PT2H/PT6H]",
            "zoneId": "Europe/Brussels",
        });
        let job: RecurringJob = serde_json::from_value(json).unwrap();
        assert_eq!(job.id, "daily-report");
        assert!(job.next_run.is_none());
        assert!(job.schedule_expression.contains("[PT2H/PT6H]"));
    }
}
