//! Per-user dispatch reservations.
//!
//! One row per user holds the instant of the last claimed dispatch window.
//! Claiming is a single conditional upsert, so two runs racing for the same
//! user cannot both win.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::timestamp;

/// Claim the window for `user_id` at `now`.
///
/// Succeeds when the user has no reservation or the existing one is at or
/// before `window_start`. Returns false when another claim holds the window.
pub async fn try_reserve(
    pool: &SqlitePool,
    user_id: &str,
    now: DateTime<Utc>,
    window_start: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO dispatch_reservations (user_id, reserved_at)
        VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            reserved_at = excluded.reserved_at
        WHERE dispatch_reservations.reserved_at <= ?
        "#,
    )
    .bind(user_id)
    .bind(timestamp::format(now))
    .bind(timestamp::format(window_start))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Current reservation instant, if any.
pub async fn get_reservation(pool: &SqlitePool, user_id: &str) -> Result<Option<DateTime<Utc>>> {
    let reserved_at = sqlx::query_scalar::<_, String>(
        r#"
        SELECT reserved_at
        FROM dispatch_reservations
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    reserved_at
        .map(|value| timestamp::parse("reserved_at", &value))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{user, Database};
    use chrono::{Duration, TimeZone};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        user::create_user(db.pool(), "u1", "Asha").await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_claim_and_contend() {
        let db = test_db().await;
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let interval = Duration::hours(1);

        assert!(try_reserve(db.pool(), "u1", now, now - interval).await.unwrap());
        assert_eq!(get_reservation(db.pool(), "u1").await.unwrap(), Some(now));

        // Same window: second claim loses
        assert!(!try_reserve(db.pool(), "u1", now, now - interval).await.unwrap());
        let later = now + Duration::minutes(30);
        assert!(!try_reserve(db.pool(), "u1", later, later - interval).await.unwrap());
        assert_eq!(get_reservation(db.pool(), "u1").await.unwrap(), Some(now));

        // Boundary is inclusive
        let next = now + interval;
        assert!(try_reserve(db.pool(), "u1", next, next - interval).await.unwrap());
        assert_eq!(get_reservation(db.pool(), "u1").await.unwrap(), Some(next));
    }

    #[tokio::test]
    async fn test_unbounded_window_claims_only_once() {
        let db = test_db().await;
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let open_ended = DateTime::<Utc>::MIN_UTC;

        assert!(try_reserve(db.pool(), "u1", now, open_ended).await.unwrap());
        let much_later = now + Duration::days(4000);
        assert!(!try_reserve(db.pool(), "u1", much_later, open_ended).await.unwrap());
        assert_eq!(get_reservation(db.pool(), "u1").await.unwrap(), Some(now));
    }

    #[tokio::test]
    async fn test_no_reservation() {
        let db = test_db().await;
        assert!(get_reservation(db.pool(), "u1").await.unwrap().is_none());
    }
}
