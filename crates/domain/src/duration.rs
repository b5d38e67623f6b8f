//! Pure text transforms for durations and byte sizes.
//!
//! All functions here are total: bad input yields a sentinel (`None` or an
//! empty string), never a panic, so callers can always render a fallback.

use std::sync::OnceLock;

use regex::Regex;

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3_600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

fn iso8601_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^PT(?:(\d+)D)?(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d{1,6})?)S)?$")
            .expect("valid duration regex")
    })
}

fn group_f64(caps: &regex::Captures<'_>, i: usize) -> f64 {
    caps.get(i)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Parse an ISO-8601 `PT…` duration into total seconds.
///
/// Fields combine additively (D=86400, H=3600, M=60, S=1); fractional
/// seconds up to six decimals are preserved. A bare `"PT"` is zero.
/// Anything outside the grammar returns `None`.
pub fn parse_iso8601_duration(text: &str) -> Option<f64> {
    let caps = iso8601_re().captures(text)?;
    Some(
        group_f64(&caps, 1) * SECONDS_PER_DAY
            + group_f64(&caps, 2) * SECONDS_PER_HOUR
            + group_f64(&caps, 3) * SECONDS_PER_MINUTE
            + group_f64(&caps, 4),
    )
}

/// Render a duration in seconds as `"1 hour, 1 minute, 1 second"`.
///
/// Whole units only (floored); zero components are omitted; a
/// non-positive or non-finite total renders as the empty string.
pub fn format_duration(total_seconds: f64) -> String {
    if !total_seconds.is_finite() || total_seconds <= 0.0 {
        return String::new();
    }

    const UNITS: [(&str, u64); 5] = [
        ("year", 31_536_000),
        ("day", 86_400),
        ("hour", 3_600),
        ("minute", 60),
        ("second", 1),
    ];

    let mut rest = total_seconds.floor() as u64;
    let mut parts = Vec::new();
    for (name, unit_seconds) in UNITS {
        let count = rest / unit_seconds;
        rest %= unit_seconds;
        match count {
            0 => {}
            1 => parts.push(format!("1 {name}")),
            n => parts.push(format!("{n} {name}s")),
        }
    }
    parts.join(", ")
}

/// Render a byte count with one decimal and an SI (`kB`…`YB`) or binary
/// (`KiB`…`YiB`) unit suffix. Values below the unit threshold stay as
/// integer bytes.
pub fn human_file_size(bytes: i64, use_si: bool) -> String {
    let threshold = if use_si { 1000.0 } else { 1024.0 };
    let mut value = bytes as f64;
    if value.abs() < threshold {
        return format!("{bytes} B");
    }

    let units: &[&str] = if use_si {
        &["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"]
    } else {
        &["KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"]
    };

    let mut unit = 0;
    loop {
        value /= threshold;
        if value.abs() < threshold || unit == units.len() - 1 {
            break;
        }
        unit += 1;
    }
    format!("{:.1} {}", value, units[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── ISO-8601 parsing ─────────────────────────────────────────────

    #[test]
    fn parse_hours() {
        assert_eq!(parse_iso8601_duration("PT24H"), Some(86_400.0));
    }

    #[test]
    fn parse_combined_fields() {
        assert_eq!(parse_iso8601_duration("PT1H30M10S"), Some(5_410.0));
        assert_eq!(parse_iso8601_duration("PT2D3H"), Some(2.0 * 86_400.0 + 3.0 * 3_600.0));
    }

    #[test]
    fn parse_bare_pt_is_zero() {
        assert_eq!(parse_iso8601_duration("PT"), Some(0.0));
    }

    #[test]
    fn parse_fractional_seconds() {
        assert_eq!(parse_iso8601_duration("PT0.5S"), Some(0.5));
        assert_eq!(parse_iso8601_duration("PT1.123456S"), Some(1.123456));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_iso8601_duration(""), None);
        assert_eq!(parse_iso8601_duration("PT25X"), None);
        assert_eq!(parse_iso8601_duration("25H"), None);
        assert_eq!(parse_iso8601_duration("PT1H trailing"), None);
        // More than six fraction digits is outside the grammar.
        assert_eq!(parse_iso8601_duration("PT1.1234567S"), None);
    }

    #[test]
    fn parse_round_trips_additive_decomposition() {
        for (text, seconds) in [
            ("PT1D", 86_400.0),
            ("PT12H", 43_200.0),
            ("PT90M", 5_400.0),
            ("PT45S", 45.0),
            ("PT1D1H1M1S", 86_400.0 + 3_600.0 + 60.0 + 1.0),
        ] {
            assert_eq!(parse_iso8601_duration(text), Some(seconds), "{text}");
        }
    }

    // ── Human-readable durations ─────────────────────────────────────

    #[test]
    fn format_singular_units() {
        assert_eq!(format_duration(3_661.0), "1 hour, 1 minute, 1 second");
    }

    #[test]
    fn format_plural_units() {
        assert_eq!(format_duration(7_322.0), "2 hours, 2 minutes, 2 seconds");
    }

    #[test]
    fn format_skips_zero_components() {
        assert_eq!(format_duration(3_600.0), "1 hour");
        assert_eq!(format_duration(86_461.0), "1 day, 1 minute, 1 second");
    }

    #[test]
    fn format_years() {
        let two_years_and_a_day = 2.0 * 365.0 * 86_400.0 + 86_400.0;
        assert_eq!(format_duration(two_years_and_a_day), "2 years, 1 day");
    }

    #[test]
    fn format_non_positive_is_empty() {
        assert_eq!(format_duration(0.0), "");
        assert_eq!(format_duration(-1.0), "");
        assert_eq!(format_duration(f64::NAN), "");
        assert_eq!(format_duration(f64::INFINITY), "");
    }

    #[test]
    fn format_floors_fractional_seconds() {
        assert_eq!(format_duration(0.9), "");
        assert_eq!(format_duration(1.9), "1 second");
    }

    // ── File sizes ───────────────────────────────────────────────────

    #[test]
    fn file_size_si() {
        assert_eq!(human_file_size(1_500, true), "1.5 kB");
        assert_eq!(human_file_size(1_000_000, true), "1.0 MB");
    }

    #[test]
    fn file_size_binary() {
        assert_eq!(human_file_size(1_536, false), "1.5 KiB");
        assert_eq!(human_file_size(1_048_576, false), "1.0 MiB");
    }

    #[test]
    fn file_size_below_threshold_is_integer_bytes() {
        assert_eq!(human_file_size(500, true), "500 B");
        assert_eq!(human_file_size(500, false), "500 B");
        assert_eq!(human_file_size(0, true), "0 B");
    }

    #[test]
    fn file_size_negative_keeps_sign() {
        assert_eq!(human_file_size(-500, true), "-500 B");
        assert_eq!(human_file_size(-1_500, true), "-1.5 kB");
    }

    #[test]
    fn file_size_does_not_run_past_largest_unit() {
        let huge = i64::MAX;
        let rendered = human_file_size(huge, false);
        assert!(rendered.ends_with("EiB"), "got {rendered}");
    }
}
