//! In-memory stores for tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nudge_core::{LatestMetrics, Observation, Quantity, RawPreferences};
use tokio::sync::{Mutex, RwLock};

use crate::error::OrchestratorError;
use crate::stores::{
    DispatchEntry, DispatchLog, MetricsStore, PreferenceStore, Recipient, UserDirectory,
};

/// Thread-safe store implementing every orchestrator store trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    recipients: RwLock<Vec<Recipient>>,
    preferences: RwLock<HashMap<String, RawPreferences>>,
    metrics: RwLock<HashMap<String, LatestMetrics>>,
    entries: RwLock<Vec<DispatchEntry>>,
    reservations: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user to the directory. Duplicates are kept as given.
    pub async fn add_recipient(&self, user_id: &str, chat_id: Option<i64>) {
        self.recipients
            .write()
            .await
            .push(Recipient::new(user_id, chat_id));
    }

    pub async fn set_preferences(&self, user_id: &str, preferences: RawPreferences) {
        self.preferences
            .write()
            .await
            .insert(user_id.to_string(), preferences);
    }

    /// Record an observation, keeping whichever is newer.
    pub async fn record_metric(&self, user_id: &str, quantity: Quantity, observation: Observation) {
        let mut metrics = self.metrics.write().await;
        let latest = metrics.entry(user_id.to_string()).or_default();
        match latest.get(&quantity) {
            Some(existing) if existing.observed_at > observation.observed_at => {}
            _ => {
                latest.insert(quantity, observation);
            }
        }
    }

    /// All log entries in append order.
    pub async fn entries(&self) -> Vec<DispatchEntry> {
        self.entries.read().await.clone()
    }

    /// Log entries for one user in append order.
    pub async fn entries_for(&self, user_id: &str) -> Vec<DispatchEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn reservation(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.reservations.lock().await.get(user_id).copied()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryStore {
    async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<RawPreferences>, OrchestratorError> {
        Ok(self.preferences.read().await.get(user_id).cloned())
    }
}

#[async_trait]
impl MetricsStore for InMemoryStore {
    async fn get_latest_metrics(&self, user_id: &str) -> Result<LatestMetrics, OrchestratorError> {
        Ok(self
            .metrics
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl DispatchLog for InMemoryStore {
    async fn get_last_dispatch(
        &self,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, OrchestratorError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.attempted_at)
            .max())
    }

    async fn append(&self, entry: &DispatchEntry) -> Result<(), OrchestratorError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn reserve(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
    ) -> Result<bool, OrchestratorError> {
        let mut reservations = self.reservations.lock().await;
        match reservations.get(user_id) {
            Some(reserved_at) if *reserved_at > window_start => Ok(false),
            _ => {
                reservations.insert(user_id.to_string(), now);
                Ok(true)
            }
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn list_recipients(&self) -> Result<Vec<Recipient>, OrchestratorError> {
        Ok(self.recipients.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::DispatchOutcome;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, hour, 0, 0).unwrap()
    }

    fn entry(user_id: &str, attempted_at: DateTime<Utc>, outcome: DispatchOutcome) -> DispatchEntry {
        DispatchEntry {
            user_id: user_id.to_string(),
            attempted_at,
            channel: "chat".to_string(),
            target: "steps".to_string(),
            message: "walk".to_string(),
            outcome,
        }
    }

    #[tokio::test]
    async fn test_last_dispatch_counts_failed_attempts() {
        let store = InMemoryStore::new();
        assert_eq!(store.get_last_dispatch("u1").await.unwrap(), None);

        store.append(&entry("u1", at(8), DispatchOutcome::Sent)).await.unwrap();
        store
            .append(&entry(
                "u1",
                at(10),
                DispatchOutcome::Failed {
                    reason: "timeout".to_string(),
                },
            ))
            .await
            .unwrap();
        store.append(&entry("u2", at(12), DispatchOutcome::Sent)).await.unwrap();

        assert_eq!(store.get_last_dispatch("u1").await.unwrap(), Some(at(10)));
        assert_eq!(store.entries_for("u1").await.len(), 2);
    }

    #[tokio::test]
    async fn test_reserve_is_exclusive_within_window() {
        let store = InMemoryStore::new();
        let interval = Duration::hours(1);
        let now = at(9);

        assert!(store.reserve("u1", now, now - interval).await.unwrap());
        assert!(!store.reserve("u1", now, now - interval).await.unwrap());

        // Boundary is inclusive: a reservation exactly one interval old is free.
        let later = now + interval;
        assert!(store.reserve("u1", later, later - interval).await.unwrap());
        assert_eq!(store.reservation("u1").await, Some(later));

        assert!(store.reserve("u2", now, now - interval).await.unwrap());
    }

    #[tokio::test]
    async fn test_record_metric_keeps_newest() {
        let store = InMemoryStore::new();
        store
            .record_metric("u1", Quantity::Steps, Observation::new(5000, at(10)))
            .await;
        store
            .record_metric("u1", Quantity::Steps, Observation::new(1000, at(8)))
            .await;

        let latest = store.get_latest_metrics("u1").await.unwrap();
        assert_eq!(latest.get(&Quantity::Steps).map(|o| o.value), Some(5000));
        assert!(store.get_latest_metrics("nobody").await.unwrap().is_empty());
    }
}
