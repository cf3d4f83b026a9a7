// src/snapshots/record.rs
// =============================================================================
// Decoding of snapshot index lines.
//
// Each line of a `fl=timestamp,original` response looks like:
//
//     20190415083012 http://a.com/report.pdf
//
// Every line is decoded on its own. A bad line becomes a `ParseSkip` and the
// rest of the response is still used.
// =============================================================================

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const DISPLAY_FORMAT: &str = "%d %B %Y, %H:%M:%S";

/// One capture of a URL, with its replay link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotRecord {
    /// 14-digit `YYYYMMDDHHMMSS`
    pub timestamp: String,
    pub original: String,
    /// `<archive-base>/web/<timestamp>/<original>`
    pub replay_url: String,
    #[serde(skip)]
    captured_at: NaiveDateTime,
}

/// Why a line did not become a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "value", rename_all = "snake_case")]
pub enum ParseSkip {
    MissingFields,
    BadTimestamp(String),
}

impl fmt::Display for ParseSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseSkip::MissingFields => write!(f, "expected timestamp and URL"),
            ParseSkip::BadTimestamp(ts) => write!(f, "invalid timestamp '{}'", ts),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Record(SnapshotRecord),
    Skipped(ParseSkip),
}

impl SnapshotRecord {
    /// Capture time as shown in the report, e.g. `15 April 2019, 08:30:12`
    pub fn display_time(&self) -> String {
        self.captured_at.format(DISPLAY_FORMAT).to_string()
    }
}

/// Checks the 14-digit form before handing it to chrono
pub fn parse_timestamp(ts: &str) -> Option<NaiveDateTime> {
    if ts.len() != 14 || !ts.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok()
}

pub fn replay_url(archive_base: &str, timestamp: &str, original: &str) -> String {
    format!(
        "{}/web/{}/{}",
        archive_base.trim_end_matches('/'),
        timestamp,
        original
    )
}

/// Pulls the timestamp segment back out of a replay URL
#[cfg(test)]
pub fn timestamp_from_replay_url(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("/web/")?;
    let ts = rest.split('/').next()?;
    parse_timestamp(ts).map(|_| ts)
}

/// Decodes one non-empty line: first field timestamp, second original URL
pub fn parse_line(archive_base: &str, line: &str) -> LineOutcome {
    let mut fields = line.split_whitespace();
    let (timestamp, original) = match (fields.next(), fields.next()) {
        (Some(ts), Some(original)) => (ts, original),
        _ => return LineOutcome::Skipped(ParseSkip::MissingFields),
    };

    match parse_timestamp(timestamp) {
        Some(captured_at) => LineOutcome::Record(SnapshotRecord {
            timestamp: timestamp.to_string(),
            original: original.to_string(),
            replay_url: replay_url(archive_base, timestamp, original),
            captured_at,
        }),
        None => LineOutcome::Skipped(ParseSkip::BadTimestamp(timestamp.to_string())),
    }
}

/// Decodes a whole response body, skipping blank lines
pub fn parse_body(archive_base: &str, body: &str) -> Vec<LineOutcome> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| parse_line(archive_base, line))
        .collect()
}
