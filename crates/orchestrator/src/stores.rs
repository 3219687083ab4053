//! Store traits the orchestrator reads from and writes to.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nudge_core::{LatestMetrics, RawPreferences};
use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

/// Source of per-user nudge preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Stored preferences, or `None` if the user never saved any.
    async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<RawPreferences>, OrchestratorError>;
}

/// Source of the latest observation per quantity.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Latest observations; empty when nothing was ever recorded.
    async fn get_latest_metrics(&self, user_id: &str) -> Result<LatestMetrics, OrchestratorError>;
}

/// Append-only record of send attempts plus the per-user window claim.
#[async_trait]
pub trait DispatchLog: Send + Sync {
    /// Most recent attempt, sent or failed.
    async fn get_last_dispatch(
        &self,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, OrchestratorError>;

    /// Record one attempt. Entries are never modified afterwards.
    async fn append(&self, entry: &DispatchEntry) -> Result<(), OrchestratorError>;

    /// Claim the dispatch window for `user_id`.
    ///
    /// Returns true when there is no reservation or the existing one is at or
    /// before `window_start`; the reservation then moves to `now`. Returns
    /// false when another run holds the window.
    async fn reserve(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
    ) -> Result<bool, OrchestratorError>;
}

/// Enumerates users who might receive a nudge.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_recipients(&self) -> Result<Vec<Recipient>, OrchestratorError>;
}

/// A user and their linked chat, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub user_id: String,
    pub chat_id: Option<i64>,
}

impl Recipient {
    pub fn new(user_id: impl Into<String>, chat_id: Option<i64>) -> Self {
        Self {
            user_id: user_id.into(),
            chat_id,
        }
    }
}

/// Result of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent,
    Failed { reason: String },
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent)
    }
}

/// One immutable dispatch log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchEntry {
    pub user_id: String,
    pub attempted_at: DateTime<Utc>,
    pub channel: String,
    /// Target label, e.g. `steps` or `check_in`.
    pub target: String,
    pub message: String,
    pub outcome: DispatchOutcome,
}

/// The four stores the orchestrator needs.
///
/// Each may be backed by a different implementation.
#[derive(Clone)]
pub struct Stores {
    pub preferences: Arc<dyn PreferenceStore>,
    pub metrics: Arc<dyn MetricsStore>,
    pub log: Arc<dyn DispatchLog>,
    pub directory: Arc<dyn UserDirectory>,
}

impl Stores {
    /// Use one backend for every store.
    pub fn shared<T>(store: Arc<T>) -> Self
    where
        T: PreferenceStore + MetricsStore + DispatchLog + UserDirectory + 'static,
    {
        Self {
            preferences: store.clone(),
            metrics: store.clone(),
            log: store.clone(),
            directory: store,
        }
    }
}
