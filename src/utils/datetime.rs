//! Datetime parsing for upstream posting dates
//!
//! Careers APIs report posting dates in a handful of formats. Posting dates
//! are informational only, so anything unparseable becomes `None` rather
//! than failing the listing.
//!
//! # Usage
//!
//! ```rust
//! use job_finder::utils::datetime::DateTimeParser;
//!
//! let dt1 = DateTimeParser::parse_flexible("2024-03-01T12:00:00Z");
//! let dt2 = DateTimeParser::parse_flexible("March 1, 2024");
//! assert!(dt1.is_some() && dt2.is_some());
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Date-only formats tried in order, interpreted as midnight UTC
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y"];

pub struct DateTimeParser;

impl DateTimeParser {
    /// Parse datetime from the formats seen across careers APIs
    ///
    /// Supports:
    /// - RFC3339 with timezone or offset: "2023-01-01T12:00:00Z"
    /// - SQLite format (assumes UTC): "2023-01-01 12:00:00"
    /// - Plain dates: "2023-01-01", "January 1, 2023", "Jan 1, 2023"
    pub fn parse_flexible(input: &str) -> Option<DateTime<Utc>> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Some(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
            return Some(naive.and_utc());
        }

        DATE_FORMATS.iter().find_map(|format| {
            NaiveDate::parse_from_str(input, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
    }

    /// Parse an optional string field, treating absent and unparseable alike
    pub fn parse_optional(input: Option<&str>) -> Option<DateTime<Utc>> {
        input.and_then(Self::parse_flexible)
    }

    /// Format for human-readable output
    pub fn format_for_display(dt: &DateTime<Utc>) -> String {
        dt.format("%Y-%m-%d %H:%M UTC").to_string()
    }
}
