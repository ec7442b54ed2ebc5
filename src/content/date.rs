//! Date resolution for posts
//!
//! A post's canonical timestamp comes from, in order: a `date` + `time`
//! front-matter pair, a `date` field alone (several accepted formats),
//! the most recent version-control commit touching the file, the
//! filesystem modification time, and finally the current time. Each
//! failed step logs a warning and falls through; resolution never fails.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde_yaml::Value;
use std::path::Path;
use std::process::Command;

use super::frontmatter::RawFrontMatter;

/// Format used when `date` and `time` appear together
const COMBINED_DATE_FORMAT: &str = "%m/%d/%Y";
const COMBINED_TIME_FORMAT: &str = "%H:%M";

/// Accepted `date`-only patterns, tried in order
enum Pattern {
    Date(&'static str),
    DateTime(&'static str),
}

const DATE_PATTERNS: &[Pattern] = &[
    Pattern::Date("%Y-%m-%d"),
    Pattern::Date("%Y/%m/%d"),
    Pattern::Date("%B %d, %Y"),
    Pattern::Date("%d/%m/%Y"),
    Pattern::Date("%m/%d/%Y"),
    Pattern::DateTime("%Y-%m-%d %H:%M:%S"),
];

/// Resolve a post's timestamp from its front-matter and source file.
pub fn resolve(raw: &RawFrontMatter, path: &Path) -> DateTime<Local> {
    if let Some(dt) = combined_date_time(raw) {
        return dt;
    }

    if let Some(value) = raw.get("date") {
        if let Some(dt) = parse_date_value(value) {
            return dt;
        }
        tracing::warn!("could not parse date {:?} in {:?}", value, path);
    }

    fallback_timestamp(path)
}

/// Step 1: `date` (`M/D/YYYY`) combined with `time` (`HH:MM`).
fn combined_date_time(raw: &RawFrontMatter) -> Option<DateTime<Local>> {
    let date = raw.get("date")?.as_str()?;
    let time = raw.get("time")?.as_str()?;

    let d = NaiveDate::parse_from_str(date.trim(), COMBINED_DATE_FORMAT).ok()?;
    let t = NaiveTime::parse_from_str(time.trim(), COMBINED_TIME_FORMAT).ok()?;
    to_local(d.and_time(t))
}

/// Step 2: a lone `date` field, either a native timestamp or a string.
fn parse_date_value(value: &Value) -> Option<DateTime<Local>> {
    match value {
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Local.timestamp_opt(secs, 0).single()
        }
        Value::String(s) => parse_date_string(s),
        _ => None,
    }
}

fn parse_date_string(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim();

    // ISO-8601 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return to_local(dt);
    }

    for pattern in DATE_PATTERNS {
        let parsed = match pattern {
            Pattern::Date(fmt) => NaiveDate::parse_from_str(s, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            Pattern::DateTime(fmt) => NaiveDateTime::parse_from_str(s, fmt).ok(),
        };
        if let Some(dt) = parsed {
            return to_local(dt);
        }
    }

    None
}

/// Steps 3-5: commit time, then mtime, then now.
fn fallback_timestamp(path: &Path) -> DateTime<Local> {
    if let Some(dt) = git_commit_time(path) {
        return dt;
    }

    match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(mtime) => DateTime::<Local>::from(mtime),
        Err(e) => {
            tracing::warn!("no modification time for {:?}: {}", path, e);
            Local::now()
        }
    }
}

/// Timestamp of the most recent commit touching `path`, when the file
/// lives in a git checkout and git is available.
fn git_commit_time(path: &Path) -> Option<DateTime<Local>> {
    let dir = path.parent()?;
    let name = path.file_name()?;

    let output = Command::new("git")
        .args(["log", "-1", "--format=%ct", "--"])
        .arg(name)
        .current_dir(dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let secs: i64 = String::from_utf8_lossy(&output.stdout).trim().parse().ok()?;
    Local.timestamp_opt(secs, 0).single()
}

fn to_local(dt: NaiveDateTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&dt).earliest()
}
