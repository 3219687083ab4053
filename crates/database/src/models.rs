//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Opaque account id (e.g., "c27fb365-0c84-4cf2-8555-814bb065e448")
    pub id: String,
    /// Display name
    pub name: String,
    /// When the account was created.
    pub created_at: String,
}

/// Health profile (identity and demographics).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: String,
    pub age: Option<i64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    /// Free text such as "Sedentary" or "Very active".
    pub activity_level: Option<String>,
    /// Free-text goals.
    pub goals_text: Option<String>,
    pub conditions: Option<String>,
    pub medications: Option<String>,
    /// Legacy profile timezone; nudges use the preference timezone.
    pub timezone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Association between an account and a Telegram chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TelegramLink {
    pub user_id: String,
    /// One-time code; void once `telegram_id` is set.
    pub link_code: String,
    pub telegram_id: Option<i64>,
    pub created_at: String,
    pub linked_at: Option<String>,
}

impl TelegramLink {
    /// Whether the code has been redeemed.
    pub fn is_linked(&self) -> bool {
        self.telegram_id.is_some()
    }
}

/// Stored nudge preferences. Columns are loosely typed; callers validate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NudgePreferenceRecord {
    pub user_id: String,
    pub channel: Option<String>,
    pub cadence: Option<String>,
    pub tone: Option<String>,
    /// `HH:MM` local time.
    pub quiet_start: Option<String>,
    /// `HH:MM` local time.
    pub quiet_end: Option<String>,
    /// IANA zone name.
    pub timezone: Option<String>,
    pub goal_steps: Option<i64>,
    pub goal_water_ml: Option<i64>,
    pub goal_sleep_minutes: Option<i64>,
    pub goal_calories: Option<i64>,
    pub goal_protein_g: Option<i64>,
    pub goal_fiber_g: Option<i64>,
    /// Reminder switches; `None` means on.
    pub remind_steps: Option<bool>,
    pub remind_water: Option<bool>,
    pub remind_sleep: Option<bool>,
    pub updated_at: String,
}

/// Values recorded together at one instant. `None` means not observed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    pub steps: Option<i64>,
    pub water_ml: Option<i64>,
    pub sleep_minutes: Option<i64>,
    pub calories: Option<i64>,
    pub protein_g: Option<i64>,
    pub fiber_g: Option<i64>,
    pub weight_kg: Option<f64>,
    /// Self-reported 1..=5.
    pub mood: Option<i64>,
}

impl MetricValues {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One recorded metric snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MetricSnapshot {
    pub id: i64,
    pub user_id: String,
    pub observed_at: String,
    pub steps: Option<i64>,
    pub water_ml: Option<i64>,
    pub sleep_minutes: Option<i64>,
    pub calories: Option<i64>,
    pub protein_g: Option<i64>,
    pub fiber_g: Option<i64>,
    pub weight_kg: Option<f64>,
    pub mood: Option<i64>,
}

/// Result of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogOutcome {
    Sent,
    Failed,
}

impl LogOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogOutcome::Sent => "sent",
            LogOutcome::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(LogOutcome::Sent),
            "failed" => Some(LogOutcome::Failed),
            _ => None,
        }
    }
}

/// An immutable nudge log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NudgeLogEntry {
    pub id: i64,
    pub user_id: String,
    pub attempted_at: String,
    pub channel: String,
    /// Target label, e.g. "steps" or "check_in".
    pub target: String,
    pub message: String,
    /// "sent" or "failed".
    pub outcome: String,
    pub error: Option<String>,
}

impl NudgeLogEntry {
    pub fn outcome(&self) -> Option<LogOutcome> {
        LogOutcome::parse(&self.outcome)
    }
}

/// Fields for appending a log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNudgeLogEntry {
    pub user_id: String,
    pub attempted_at: chrono::DateTime<chrono::Utc>,
    pub channel: String,
    pub target: String,
    pub message: String,
    pub outcome: LogOutcome,
    pub error: Option<String>,
}
