//! Nudge preference storage.

use sqlx::SqlitePool;

use crate::models::NudgePreferenceRecord;
use crate::validation::{validate_range, validate_text, validate_time_of_day, MAX_LABEL_LENGTH};
use crate::Result;

/// Create or replace a user's nudge preferences.
///
/// Quiet-hour bounds must be `HH:MM` and goals non-negative. Channel, cadence,
/// tone and timezone vocabularies are checked by the nudge engine when read.
pub async fn upsert_nudge_preferences(
    pool: &SqlitePool,
    record: &NudgePreferenceRecord,
) -> Result<()> {
    for bound in [&record.quiet_start, &record.quiet_end].into_iter().flatten() {
        validate_time_of_day(bound)?;
    }
    for label in [&record.channel, &record.cadence, &record.tone, &record.timezone]
        .into_iter()
        .flatten()
    {
        validate_text("preference", label, MAX_LABEL_LENGTH)?;
    }
    for (field, goal) in [
        ("steps goal", record.goal_steps),
        ("water goal", record.goal_water_ml),
        ("sleep goal", record.goal_sleep_minutes),
        ("calories goal", record.goal_calories),
        ("protein goal", record.goal_protein_g),
        ("fiber goal", record.goal_fiber_g),
    ] {
        if let Some(goal) = goal {
            validate_range(field, goal as f64, 0.0, u32::MAX as f64)?;
        }
    }

    sqlx::query(
        r#"
        INSERT INTO nudge_preferences (
            user_id, channel, cadence, tone, quiet_start, quiet_end, timezone,
            goal_steps, goal_water_ml, goal_sleep_minutes,
            goal_calories, goal_protein_g, goal_fiber_g,
            remind_steps, remind_water, remind_sleep
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            channel = excluded.channel,
            cadence = excluded.cadence,
            tone = excluded.tone,
            quiet_start = excluded.quiet_start,
            quiet_end = excluded.quiet_end,
            timezone = excluded.timezone,
            goal_steps = excluded.goal_steps,
            goal_water_ml = excluded.goal_water_ml,
            goal_sleep_minutes = excluded.goal_sleep_minutes,
            goal_calories = excluded.goal_calories,
            goal_protein_g = excluded.goal_protein_g,
            goal_fiber_g = excluded.goal_fiber_g,
            remind_steps = excluded.remind_steps,
            remind_water = excluded.remind_water,
            remind_sleep = excluded.remind_sleep,
            updated_at = datetime('now')
        "#,
    )
    .bind(&record.user_id)
    .bind(&record.channel)
    .bind(&record.cadence)
    .bind(&record.tone)
    .bind(&record.quiet_start)
    .bind(&record.quiet_end)
    .bind(&record.timezone)
    .bind(record.goal_steps)
    .bind(record.goal_water_ml)
    .bind(record.goal_sleep_minutes)
    .bind(record.goal_calories)
    .bind(record.goal_protein_g)
    .bind(record.goal_fiber_g)
    .bind(record.remind_steps)
    .bind(record.remind_water)
    .bind(record.remind_sleep)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a user's nudge preferences.
pub async fn get_nudge_preferences(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<NudgePreferenceRecord>> {
    let record = sqlx::query_as::<_, NudgePreferenceRecord>(
        r#"
        SELECT user_id, channel, cadence, tone, quiet_start, quiet_end, timezone,
               goal_steps, goal_water_ml, goal_sleep_minutes,
               goal_calories, goal_protein_g, goal_fiber_g,
               remind_steps, remind_water, remind_sleep, updated_at
        FROM nudge_preferences
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Remove a user's nudge preferences. Returns false if none existed.
pub async fn clear_nudge_preferences(pool: &SqlitePool, user_id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM nudge_preferences
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{user, Database, DatabaseError};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        user::create_user(db.pool(), "u1", "Asha").await.unwrap();
        db
    }

    fn record() -> NudgePreferenceRecord {
        NudgePreferenceRecord {
            user_id: "u1".to_string(),
            channel: Some("chat".to_string()),
            cadence: Some("daily".to_string()),
            tone: Some("gentle".to_string()),
            quiet_start: Some("22:00".to_string()),
            quiet_end: Some("07:00".to_string()),
            timezone: Some("Europe/Paris".to_string()),
            goal_steps: Some(8000),
            goal_water_ml: Some(2500),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = test_db().await;
        assert!(get_nudge_preferences(db.pool(), "u1").await.unwrap().is_none());

        upsert_nudge_preferences(db.pool(), &record()).await.unwrap();
        let stored = get_nudge_preferences(db.pool(), "u1").await.unwrap().unwrap();
        assert_eq!(stored.cadence.as_deref(), Some("daily"));
        assert_eq!(stored.goal_steps, Some(8000));
        assert_eq!(stored.goal_sleep_minutes, None);
        assert_eq!(stored.remind_water, None);

        let hourly = NudgePreferenceRecord {
            cadence: Some("hourly".to_string()),
            goal_steps: None,
            ..record()
        };
        upsert_nudge_preferences(db.pool(), &hourly).await.unwrap();
        let stored = get_nudge_preferences(db.pool(), "u1").await.unwrap().unwrap();
        assert_eq!(stored.cadence.as_deref(), Some("hourly"));
        assert_eq!(stored.goal_steps, None);
    }

    #[tokio::test]
    async fn test_reminder_switches_round_trip() {
        let db = test_db().await;
        let muted = NudgePreferenceRecord {
            remind_water: Some(false),
            remind_sleep: Some(true),
            ..record()
        };
        upsert_nudge_preferences(db.pool(), &muted).await.unwrap();

        let stored = get_nudge_preferences(db.pool(), "u1").await.unwrap().unwrap();
        assert_eq!(stored.remind_steps, None);
        assert_eq!(stored.remind_water, Some(false));
        assert_eq!(stored.remind_sleep, Some(true));
    }

    #[tokio::test]
    async fn test_rejects_malformed_quiet_hours() {
        let db = test_db().await;
        let bad = NudgePreferenceRecord {
            quiet_start: Some("10pm".to_string()),
            ..record()
        };
        let result = upsert_nudge_preferences(db.pool(), &bad).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rejects_negative_goal() {
        let db = test_db().await;
        let bad = NudgePreferenceRecord {
            goal_water_ml: Some(-1),
            ..record()
        };
        assert!(upsert_nudge_preferences(db.pool(), &bad).await.is_err());
    }

    #[tokio::test]
    async fn test_clear() {
        let db = test_db().await;
        upsert_nudge_preferences(db.pool(), &record()).await.unwrap();
        assert!(clear_nudge_preferences(db.pool(), "u1").await.unwrap());
        assert!(!clear_nudge_preferences(db.pool(), "u1").await.unwrap());
    }
}
