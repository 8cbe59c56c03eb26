//! Timestamps are stored as fixed-width RFC 3339 UTC text so that SQLite's
//! lexical `ORDER BY` agrees with chronological order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

pub fn format(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
pub fn now() -> String {
    format(Utc::now())
}

/// Parse a stored timestamp. Accepts RFC 3339 and the bare
/// `YYYY-MM-DD HH:MM:SS` form SQLite's `datetime()` produces.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|ndt| ndt.and_utc())
}

/// Parse a client-supplied date-time. Offsets are honoured; values without
/// one are taken as UTC, and a bare date means midnight.
pub fn parse_client(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Some(ts) = parse(raw) {
        return Some(ts);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ndt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}
