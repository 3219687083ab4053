//! Timestamp encoding for TEXT columns.
//!
//! Instants written by this crate use a fixed-width RFC 3339 form in UTC
//! (`2026-10-19T09:00:00.000000Z`) so that string comparison in SQL matches
//! chronological order. Columns filled by `datetime('now')` use SQLite's
//! `YYYY-MM-DD HH:MM:SS` form; [`parse`] accepts both.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

use crate::error::{DatabaseError, Result};

const SQLITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Encode an instant for storage. Instants outside years 0000..=9999 are
/// clamped to that range so the encoding stays fixed-width.
pub fn format(ts: DateTime<Utc>) -> String {
    let floor = NaiveDate::from_ymd_opt(0, 1, 1).map(|d| d.and_time(NaiveTime::MIN).and_utc());
    let ceiling = NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|d| d.and_hms_micro_opt(23, 59, 59, 999_999))
        .map(|dt| dt.and_utc());
    let ts = match (floor, ceiling) {
        (Some(floor), _) if ts < floor => floor,
        (_, Some(ceiling)) if ts > ceiling => ceiling,
        _ => ts,
    };
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a stored instant. `column` names the source for error reporting.
pub fn parse(column: &'static str, value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, SQLITE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| DatabaseError::InvalidTimestamp {
            column,
            value: value.to_string(),
        })
}
