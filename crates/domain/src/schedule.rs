//! Schedule expression splitting.
//!
//! A recurring job's schedule is a cron or interval expression, optionally
//! followed by a bracketed carbon-aware margin pair:
//! `"0 3 * * * [PT2H/PT6H]"` means "preferably at 03:00, movable up to two
//! hours earlier or six hours later". The base expression is *not*
//! validated here; cron grammar is the scheduler's concern.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::duration::parse_iso8601_duration;

/// A schedule expression split into its base expression and optional
/// carbon-aware margins. Margins are kept verbatim as ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleExpression {
    pub schedule_expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_after: Option<String>,
}

impl ScheduleExpression {
    /// Margin before the scheduled point, in seconds, if present and valid.
    pub fn margin_before_seconds(&self) -> Option<f64> {
        self.margin_before.as_deref().and_then(parse_iso8601_duration)
    }

    /// Margin after the scheduled point, in seconds, if present and valid.
    pub fn margin_after_seconds(&self) -> Option<f64> {
        self.margin_after.as_deref().and_then(parse_iso8601_duration)
    }
}

fn margin_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.*?)\s*\[\s*([^\s/\]]+)\s*/\s*([^\s/\]]+)\s*\]\s*$")
            .expect("valid margin regex")
    })
}

/// Split an optional trailing `[before/after]` margin pair off a schedule
/// expression. Whitespace around the brackets and slashes is tolerated.
/// Input without a well-formed pair comes back whole, margins absent;
/// this function never fails.
pub fn parse_schedule_expression(text: &str) -> ScheduleExpression {
    if let Some(caps) = margin_re().captures(text) {
        return ScheduleExpression {
            schedule_expression: caps[1].trim().to_string(),
            margin_before: Some(caps[2].to_string()),
            margin_after: Some(caps[3].to_string()),
        };
    }
    ScheduleExpression {
        schedule_expression: text.trim().to_string(),
        margin_before: None,
        margin_after: None,
    }
}
