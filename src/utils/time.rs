use chrono::{DateTime, Utc};

/// Timestamp format used by the hh.ru API, e.g. `2026-03-04T12:30:00+0300`.
pub const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// A record with an unparseable publication date is still worth keeping,
/// so any failure falls back to the collection time.
pub fn parse_published_at(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_str(s, PUBLISHED_AT_FORMAT).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}
