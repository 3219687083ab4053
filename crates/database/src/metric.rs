//! Append-only metric snapshots.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{MetricSnapshot, MetricValues};
use crate::timestamp;
use crate::validation::{validate_range, ValidationError};

/// Integer metric columns with nudge goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricColumn {
    Steps,
    WaterMl,
    SleepMinutes,
    Calories,
    ProteinG,
    FiberG,
}

impl MetricColumn {
    pub const ALL: [MetricColumn; 6] = [
        MetricColumn::Steps,
        MetricColumn::WaterMl,
        MetricColumn::SleepMinutes,
        MetricColumn::Calories,
        MetricColumn::ProteinG,
        MetricColumn::FiberG,
    ];

    /// Get the database column name for this metric.
    pub fn column_name(&self) -> &'static str {
        match self {
            MetricColumn::Steps => "steps",
            MetricColumn::WaterMl => "water_ml",
            MetricColumn::SleepMinutes => "sleep_minutes",
            MetricColumn::Calories => "calories",
            MetricColumn::ProteinG => "protein_g",
            MetricColumn::FiberG => "fiber_g",
        }
    }
}

/// Most recent non-null observation of one metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestMetric {
    pub column: MetricColumn,
    pub value: i64,
    pub observed_at: DateTime<Utc>,
}

fn validate_values(values: &MetricValues) -> std::result::Result<(), ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::Empty("metric snapshot".to_string()));
    }
    for (field, value) in [
        ("steps", values.steps),
        ("water_ml", values.water_ml),
        ("sleep_minutes", values.sleep_minutes),
        ("calories", values.calories),
        ("protein_g", values.protein_g),
        ("fiber_g", values.fiber_g),
    ] {
        if let Some(value) = value {
            validate_range(field, value as f64, 0.0, i32::MAX as f64)?;
        }
    }
    if let Some(weight) = values.weight_kg {
        validate_range("weight_kg", weight, 0.0, 500.0)?;
    }
    if let Some(mood) = values.mood {
        validate_range("mood", mood as f64, 1.0, 5.0)?;
    }
    Ok(())
}

/// Record a snapshot. Returns the new row id.
pub async fn record_snapshot(
    pool: &SqlitePool,
    user_id: &str,
    observed_at: DateTime<Utc>,
    values: &MetricValues,
) -> Result<i64> {
    validate_values(values)?;

    let result = sqlx::query(
        r#"
        INSERT INTO metric_snapshots (
            user_id, observed_at, steps, water_ml, sleep_minutes,
            calories, protein_g, fiber_g, weight_kg, mood
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(timestamp::format(observed_at))
    .bind(values.steps)
    .bind(values.water_ml)
    .bind(values.sleep_minutes)
    .bind(values.calories)
    .bind(values.protein_g)
    .bind(values.fiber_g)
    .bind(values.weight_kg)
    .bind(values.mood)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Most recent non-null value of one metric.
pub async fn latest_metric(
    pool: &SqlitePool,
    user_id: &str,
    column: MetricColumn,
) -> Result<Option<LatestMetric>> {
    // Column names can't be bound; they come from the MetricColumn enum.
    let query = format!(
        r#"
        SELECT {column}, observed_at
        FROM metric_snapshots
        WHERE user_id = ? AND {column} IS NOT NULL
        ORDER BY observed_at DESC, id DESC
        LIMIT 1
        "#,
        column = column.column_name()
    );

    let row = sqlx::query_as::<_, (i64, String)>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    row.map(|(value, observed_at)| {
        Ok(LatestMetric {
            column,
            value,
            observed_at: timestamp::parse("observed_at", &observed_at)?,
        })
    })
    .transpose()
}

/// Latest value of every goal metric the user has ever recorded.
pub async fn latest_metrics(pool: &SqlitePool, user_id: &str) -> Result<Vec<LatestMetric>> {
    let mut latest = Vec::new();
    for column in MetricColumn::ALL {
        if let Some(metric) = latest_metric(pool, user_id, column).await? {
            latest.push(metric);
        }
    }
    Ok(latest)
}

/// Snapshots observed at or after `since`, oldest first.
pub async fn list_snapshots(
    pool: &SqlitePool,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<MetricSnapshot>> {
    let rows = sqlx::query_as::<_, MetricSnapshot>(
        r#"
        SELECT id, user_id, observed_at, steps, water_ml, sleep_minutes,
               calories, protein_g, fiber_g, weight_kg, mood
        FROM metric_snapshots
        WHERE user_id = ? AND observed_at >= ?
        ORDER BY observed_at ASC, id ASC
        "#,
    )
    .bind(user_id)
    .bind(timestamp::format(since))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Delete a single snapshot belonging to `user_id`.
pub async fn delete_snapshot(pool: &SqlitePool, user_id: &str, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM metric_snapshots
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "MetricSnapshot",
            id: id.to_string(),
        });
    }

    Ok(())
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

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 7, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_latest_is_per_column() {
        let db = test_db().await;

        let morning = MetricValues {
            steps: Some(1200),
            sleep_minutes: Some(390),
            ..Default::default()
        };
        record_snapshot(db.pool(), "u1", t0(), &morning).await.unwrap();

        let noon = MetricValues {
            steps: Some(5000),
            water_ml: Some(800),
            ..Default::default()
        };
        record_snapshot(db.pool(), "u1", t0() + Duration::hours(5), &noon)
            .await
            .unwrap();

        let steps = latest_metric(db.pool(), "u1", MetricColumn::Steps)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(steps.value, 5000);
        assert_eq!(steps.observed_at, t0() + Duration::hours(5));

        // Sleep keeps the older observation since noon left it null
        let sleep = latest_metric(db.pool(), "u1", MetricColumn::SleepMinutes)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sleep.value, 390);
        assert_eq!(sleep.observed_at, t0());

        let all = latest_metrics(db.pool(), "u1").await.unwrap();
        let columns: Vec<_> = all.iter().map(|m| m.column).collect();
        assert_eq!(
            columns,
            vec![
                MetricColumn::Steps,
                MetricColumn::WaterMl,
                MetricColumn::SleepMinutes
            ]
        );
    }

    #[tokio::test]
    async fn test_latest_orders_by_observation_not_insertion() {
        let db = test_db().await;
        let later = MetricValues {
            steps: Some(9000),
            ..Default::default()
        };
        let earlier = MetricValues {
            steps: Some(100),
            ..Default::default()
        };
        record_snapshot(db.pool(), "u1", t0() + Duration::hours(3), &later)
            .await
            .unwrap();
        record_snapshot(db.pool(), "u1", t0(), &earlier).await.unwrap();

        let steps = latest_metric(db.pool(), "u1", MetricColumn::Steps)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(steps.value, 9000);
    }

    #[tokio::test]
    async fn test_no_metrics() {
        let db = test_db().await;
        assert!(latest_metrics(db.pool(), "u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_empty_and_invalid() {
        let db = test_db().await;
        let result = record_snapshot(db.pool(), "u1", t0(), &MetricValues::default()).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));

        let bad_mood = MetricValues {
            mood: Some(9),
            ..Default::default()
        };
        assert!(record_snapshot(db.pool(), "u1", t0(), &bad_mood).await.is_err());
    }

    #[tokio::test]
    async fn test_list_and_delete_snapshots() {
        let db = test_db().await;
        let values = MetricValues {
            water_ml: Some(250),
            weight_kg: Some(70.4),
            ..Default::default()
        };
        for hours in [0, 24, 48] {
            record_snapshot(db.pool(), "u1", t0() + Duration::hours(hours), &values)
                .await
                .unwrap();
        }

        let recent = list_snapshots(db.pool(), "u1", t0() + Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].weight_kg, Some(70.4));

        delete_snapshot(db.pool(), "u1", recent[0].id).await.unwrap();
        assert_eq!(list_snapshots(db.pool(), "u1", t0()).await.unwrap().len(), 2);
        assert!(matches!(
            delete_snapshot(db.pool(), "u1", recent[0].id).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
