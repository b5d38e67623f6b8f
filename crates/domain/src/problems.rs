//! Cluster problems surfaced on the dashboard, and the version endpoint
//! payload.

use serde::{Deserialize, Serialize};

/// Kind of a cluster problem. Unknown kinds deserialize to [`Unknown`]
/// so a newer server cannot break an older client.
///
/// [`Unknown`]: ProblemKind::Unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProblemKind {
    /// A job processing server threw an exception severe enough to stop.
    SevereException,
    /// Cluster members run different versions of the job server.
    VersionMismatch,
    /// A newer release is available.
    NewVersionAvailable,
    /// Servers poll faster than the configured interval allows.
    PollIntervalTooShort,
    #[serde(other)]
    Unknown,
}

impl ProblemKind {
    /// Wire name used in `DELETE /api/problems/{type}`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemKind::SevereException => "severe-exception",
            ProblemKind::VersionMismatch => "version-mismatch",
            ProblemKind::NewVersionAvailable => "new-version-available",
            ProblemKind::PollIntervalTooShort => "poll-interval-too-short",
            ProblemKind::Unknown => "unknown",
        }
    }

    /// Only some problems can be dismissed from the dashboard.
    pub fn dismissable(&self) -> bool {
        matches!(
            self,
            ProblemKind::SevereException | ProblemKind::NewVersionAvailable
        )
    }
}

/// One problem entry from `GET /api/problems`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(rename = "type")]
    pub kind: ProblemKind,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of `GET /api/version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: String,
    #[serde(default)]
    pub latest_version: Option<String>,
}
