//! Append-only nudge log. The latest `attempted_at` doubles as cadence state.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{NewNudgeLogEntry, NudgeLogEntry};
use crate::timestamp;

/// Append one entry. Returns the new row id.
pub async fn append_entry(pool: &SqlitePool, entry: &NewNudgeLogEntry) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO nudge_log (user_id, attempted_at, channel, target, message, outcome, error)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.user_id)
    .bind(timestamp::format(entry.attempted_at))
    .bind(&entry.channel)
    .bind(&entry.target)
    .bind(&entry.message)
    .bind(entry.outcome.as_str())
    .bind(&entry.error)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Most recent attempt, sent or failed.
pub async fn last_dispatch(pool: &SqlitePool, user_id: &str) -> Result<Option<DateTime<Utc>>> {
    let latest = sqlx::query_scalar::<_, Option<String>>(
        r#"
        SELECT MAX(attempted_at)
        FROM nudge_log
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    latest
        .map(|value| timestamp::parse("attempted_at", &value))
        .transpose()
}

/// Newest entries first.
pub async fn list_entries(pool: &SqlitePool, user_id: &str, limit: i64) -> Result<Vec<NudgeLogEntry>> {
    let entries = sqlx::query_as::<_, NudgeLogEntry>(
        r#"
        SELECT id, user_id, attempted_at, channel, target, message, outcome, error
        FROM nudge_log
        WHERE user_id = ?
        ORDER BY attempted_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Number of attempts at or after `since`.
pub async fn count_entries_since(
    pool: &SqlitePool,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM nudge_log
        WHERE user_id = ? AND attempted_at >= ?
        "#,
    )
    .bind(user_id)
    .bind(timestamp::format(since))
    .fetch_one(pool)
    .await?;

    Ok(count)
}
