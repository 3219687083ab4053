//! Stores backed by the SQLite database crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::{
    link, metric, nudge_log, preference, reservation, Database, LogOutcome, MetricColumn,
    NewNudgeLogEntry, NudgePreferenceRecord,
};
use nudge_core::{Goals, LatestMetrics, Observation, Quantity, RawPreferences, Reminders};
use tracing::warn;

use crate::error::OrchestratorError;
use crate::stores::{
    DispatchEntry, DispatchLog, DispatchOutcome, MetricsStore, PreferenceStore, Recipient,
    UserDirectory,
};

/// Implements every orchestrator store over one [`Database`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    database: Database,
}

impl SqliteStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

fn quantity_for(column: MetricColumn) -> Quantity {
    match column {
        MetricColumn::Steps => Quantity::Steps,
        MetricColumn::WaterMl => Quantity::Water,
        MetricColumn::SleepMinutes => Quantity::Sleep,
        MetricColumn::Calories => Quantity::Calories,
        MetricColumn::ProteinG => Quantity::Protein,
        MetricColumn::FiberG => Quantity::Fiber,
    }
}

/// Map a stored row to engine input.
///
/// Unset goals keep the engine defaults; a goal that does not fit `u32` is
/// treated as untracked. An unset reminder switch means on.
pub fn raw_preferences(record: NudgePreferenceRecord) -> RawPreferences {
    let mut goals = Goals::default();
    for (quantity, stored) in [
        (Quantity::Steps, record.goal_steps),
        (Quantity::Water, record.goal_water_ml),
        (Quantity::Sleep, record.goal_sleep_minutes),
        (Quantity::Calories, record.goal_calories),
        (Quantity::Protein, record.goal_protein_g),
        (Quantity::Fiber, record.goal_fiber_g),
    ] {
        if let Some(value) = stored {
            let goal = u32::try_from(value).ok();
            if goal.is_none() {
                warn!(user_id = %record.user_id, quantity = quantity.as_str(), value, "Ignoring out-of-range goal");
            }
            goals.set(quantity, goal);
        }
    }

    RawPreferences {
        channel: record.channel,
        cadence: record.cadence,
        tone: record.tone,
        quiet_start: record.quiet_start,
        quiet_end: record.quiet_end,
        timezone: record.timezone,
        goals,
        reminders: Reminders {
            steps: record.remind_steps.unwrap_or(true),
            water: record.remind_water.unwrap_or(true),
            sleep: record.remind_sleep.unwrap_or(true),
        },
    }
}

#[async_trait]
impl PreferenceStore for SqliteStore {
    async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<RawPreferences>, OrchestratorError> {
        let record = preference::get_nudge_preferences(self.database.pool(), user_id).await?;
        Ok(record.map(raw_preferences))
    }
}

#[async_trait]
impl MetricsStore for SqliteStore {
    async fn get_latest_metrics(&self, user_id: &str) -> Result<LatestMetrics, OrchestratorError> {
        let latest = metric::latest_metrics(self.database.pool(), user_id).await?;
        Ok(latest
            .into_iter()
            .map(|m| {
                (
                    quantity_for(m.column),
                    Observation::new(m.value, m.observed_at),
                )
            })
            .collect())
    }
}

#[async_trait]
impl DispatchLog for SqliteStore {
    async fn get_last_dispatch(
        &self,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, OrchestratorError> {
        Ok(nudge_log::last_dispatch(self.database.pool(), user_id).await?)
    }

    async fn append(&self, entry: &DispatchEntry) -> Result<(), OrchestratorError> {
        let (outcome, error) = match &entry.outcome {
            DispatchOutcome::Sent => (LogOutcome::Sent, None),
            DispatchOutcome::Failed { reason } => (LogOutcome::Failed, Some(reason.clone())),
        };
        let row = NewNudgeLogEntry {
            user_id: entry.user_id.clone(),
            attempted_at: entry.attempted_at,
            channel: entry.channel.clone(),
            target: entry.target.clone(),
            message: entry.message.clone(),
            outcome,
            error,
        };
        nudge_log::append_entry(self.database.pool(), &row).await?;
        Ok(())
    }

    async fn reserve(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
    ) -> Result<bool, OrchestratorError> {
        Ok(reservation::try_reserve(self.database.pool(), user_id, now, window_start).await?)
    }
}

#[async_trait]
impl UserDirectory for SqliteStore {
    async fn list_recipients(&self) -> Result<Vec<Recipient>, OrchestratorError> {
        let rows = link::list_users_with_links(self.database.pool()).await?;
        Ok(rows
            .into_iter()
            .map(|(user_id, chat_id)| Recipient { user_id, chat_id })
            .collect())
    }
}
