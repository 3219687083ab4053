//! Per-user dispatch pipeline and the batch runner.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use nudge_core::{
    compute_gaps, ContentSelector, Eligibility, EligibilityEvaluator, Ineligible, LatestMetrics,
    NudgeConfig, NudgeContent, NudgePreferences, NudgeTarget, TextGenerator,
};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::sender::ChannelSender;
use crate::stores::{DispatchEntry, DispatchOutcome, Recipient, Stores};

/// A user cleared to receive a nudge in this run.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibleUser {
    pub user_id: String,
    pub chat_id: i64,
    pub preferences: NudgePreferences,
    /// Cadence window the dispatch will occupy.
    pub interval: Duration,
}

/// Result of the evaluate step.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Eligible(EligibleUser),
    NotEligible(Ineligible),
}

/// What happened to one user in one run.
#[derive(Debug, Clone, PartialEq)]
pub enum UserOutcome {
    /// Delivered and logged as sent.
    Sent { target: NudgeTarget },
    /// Attempted, failed, and logged as failed.
    Failed { target: NudgeTarget, reason: String },
    /// Not eligible; nothing written.
    Skipped(Ineligible),
    /// Another run holds this user's window; nothing written.
    Contended,
    /// Dry run: content chosen and handed to the sender, nothing claimed or logged.
    Previewed(NudgeContent),
    /// A store failed; the error stayed inside this user.
    Errored(String),
}

/// Counts for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub contended: usize,
    pub previewed: usize,
    pub errored: usize,
    /// Skips per reason code.
    pub skip_reasons: BTreeMap<&'static str, usize>,
}

impl BatchReport {
    pub fn record(&mut self, outcome: &UserOutcome) {
        self.total += 1;
        match outcome {
            UserOutcome::Sent { .. } => self.sent += 1,
            UserOutcome::Failed { .. } => self.failed += 1,
            UserOutcome::Skipped(reason) => {
                self.skipped += 1;
                *self.skip_reasons.entry(reason.code()).or_default() += 1;
            }
            UserOutcome::Contended => self.contended += 1,
            UserOutcome::Previewed(_) => self.previewed += 1,
            UserOutcome::Errored(_) => self.errored += 1,
        }
    }
}

/// Decides, claims, sends and logs nudges.
///
/// Per user and run: `evaluate`, then for eligible users `claim`,
/// `select_content`, `send` and `log_outcome`. Every instant comes from the
/// caller, so one batch sees one consistent `now`.
pub struct NudgeOrchestrator<S: ChannelSender> {
    stores: Stores,
    sender: S,
    evaluator: EligibilityEvaluator,
    selector: ContentSelector,
    freshness: Duration,
    generation_timeout: StdDuration,
    config: OrchestratorConfig,
}

impl<S: ChannelSender> NudgeOrchestrator<S> {
    /// Create an orchestrator with template-only content.
    pub fn new(stores: Stores, sender: S, engine: &NudgeConfig, config: OrchestratorConfig) -> Self {
        Self {
            stores,
            sender,
            evaluator: engine.evaluator(),
            selector: engine.content_selector(),
            freshness: engine.freshness,
            generation_timeout: engine.generation_timeout,
            config,
        }
    }

    /// Try `generator` before templates.
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        info!("Nudge text generator enabled: {}", generator.name());
        self.selector = self
            .selector
            .with_generator(generator, self.generation_timeout);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Decide whether `recipient` may be nudged at `now`. Writes nothing.
    pub async fn evaluate(
        &self,
        recipient: &Recipient,
        now: DateTime<Utc>,
    ) -> Result<Evaluation, OrchestratorError> {
        let user_id = recipient.user_id.as_str();

        let Some(raw) = self.stores.preferences.get_preferences(user_id).await? else {
            debug!(user_id, "No nudge preferences stored");
            return Ok(Evaluation::NotEligible(Ineligible::Misconfigured(
                "no preferences stored".to_string(),
            )));
        };

        let preferences = match NudgePreferences::from_raw(&raw) {
            Ok(preferences) => preferences,
            Err(err) => {
                warn!(user_id, "Invalid nudge preferences, not nudging: {}", err);
                return Ok(Evaluation::NotEligible(Ineligible::Misconfigured(
                    err.to_string(),
                )));
            }
        };

        let last_dispatch = self.stores.log.get_last_dispatch(user_id).await?;
        let interval = match self.evaluator.evaluate(now, &preferences, last_dispatch) {
            Eligibility::Eligible { interval } => interval,
            Eligibility::NotEligible(reason) => return Ok(Evaluation::NotEligible(reason)),
        };

        let Some(chat_id) = recipient.chat_id else {
            return Ok(Evaluation::NotEligible(Ineligible::NotLinked));
        };

        Ok(Evaluation::Eligible(EligibleUser {
            user_id: user_id.to_string(),
            chat_id,
            preferences,
            interval,
        }))
    }

    /// Claim the user's cadence window. False means another run holds it.
    ///
    /// A window reaching past the earliest representable instant only
    /// succeeds when the user holds no reservation at all.
    pub async fn claim(
        &self,
        user: &EligibleUser,
        now: DateTime<Utc>,
    ) -> Result<bool, OrchestratorError> {
        let window_start = now
            .checked_sub_signed(user.interval)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.stores
            .log
            .reserve(&user.user_id, now, window_start)
            .await
    }

    /// Compute gaps and pick the message.
    ///
    /// Metrics that cannot be loaded count as absent, which yields a check-in.
    pub async fn select_content(&self, user: &EligibleUser, now: DateTime<Utc>) -> NudgeContent {
        let latest = match self.stores.metrics.get_latest_metrics(&user.user_id).await {
            Ok(latest) => latest,
            Err(err) => {
                warn!(
                    user_id = %user.user_id,
                    "Metrics unavailable, treating every gap as unknown: {}", err
                );
                LatestMetrics::new()
            }
        };

        let goals = user.preferences.nudge_goals();
        let gaps = compute_gaps(&latest, &goals, now, self.freshness);
        self.selector.select(&gaps, &goals, user.preferences.tone).await
    }

    /// Deliver through the channel sender under the send timeout.
    pub async fn send(&self, chat_id: i64, text: &str) -> DispatchOutcome {
        match timeout(self.config.send_timeout, self.sender.send(chat_id, text)).await {
            Ok(Ok(())) => DispatchOutcome::Sent,
            Ok(Err(err)) => DispatchOutcome::Failed {
                reason: err.to_string(),
            },
            Err(_) => DispatchOutcome::Failed {
                reason: OrchestratorError::SendTimeout(self.config.send_timeout).to_string(),
            },
        }
    }

    /// Append the single log entry for this attempt, stamped with `now`.
    pub async fn log_outcome(
        &self,
        user: &EligibleUser,
        now: DateTime<Utc>,
        content: &NudgeContent,
        outcome: DispatchOutcome,
    ) -> Result<(), OrchestratorError> {
        let entry = DispatchEntry {
            user_id: user.user_id.clone(),
            attempted_at: now,
            channel: user.preferences.channel.as_str().to_string(),
            target: content.target.label().to_string(),
            message: content.text.clone(),
            outcome,
        };
        self.stores.log.append(&entry).await
    }

    /// Run the full pipeline for one user. Never returns an error.
    pub async fn process_user(&self, recipient: &Recipient, now: DateTime<Utc>) -> UserOutcome {
        match self.try_process_user(recipient, now).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(user_id = %recipient.user_id, "Nudge processing failed: {}", err);
                UserOutcome::Errored(err.to_string())
            }
        }
    }

    async fn try_process_user(
        &self,
        recipient: &Recipient,
        now: DateTime<Utc>,
    ) -> Result<UserOutcome, OrchestratorError> {
        let user = match self.evaluate(recipient, now).await? {
            Evaluation::Eligible(user) => user,
            Evaluation::NotEligible(reason) => {
                debug!(user_id = %recipient.user_id, reason = reason.code(), "Skipping: {}", reason);
                return Ok(UserOutcome::Skipped(reason));
            }
        };

        if self.config.dry_run {
            let content = self.select_content(&user, now).await;
            debug!(
                user_id = %user.user_id,
                target = content.target.label(),
                "Previewing nudge"
            );
            let preview = self.send(user.chat_id, &content.text).await;
            if let DispatchOutcome::Failed { reason } = preview {
                warn!(
                    user_id = %user.user_id,
                    sender = self.sender.name(),
                    "Preview delivery failed: {}", reason
                );
            }
            return Ok(UserOutcome::Previewed(content));
        }

        if !self.claim(&user, now).await? {
            info!(user_id = %user.user_id, "Dispatch window already claimed by another run");
            return Ok(UserOutcome::Contended);
        }

        let content = self.select_content(&user, now).await;
        let outcome = self.send(user.chat_id, &content.text).await;
        self.log_outcome(&user, now, &content, outcome.clone()).await?;

        let target = content.target;
        match outcome {
            DispatchOutcome::Sent => {
                info!(
                    user_id = %user.user_id,
                    sender = self.sender.name(),
                    target = target.label(),
                    "Nudge sent"
                );
                Ok(UserOutcome::Sent { target })
            }
            DispatchOutcome::Failed { reason } => {
                warn!(
                    user_id = %user.user_id,
                    sender = self.sender.name(),
                    target = target.label(),
                    "Nudge send failed: {}", reason
                );
                Ok(UserOutcome::Failed { target, reason })
            }
        }
    }

    /// Process every known user once with bounded parallelism.
    ///
    /// Duplicate directory entries are dropped, first one wins. Only a
    /// failure to list users is returned as an error.
    pub async fn run_batch(&self, now: DateTime<Utc>) -> Result<BatchReport, OrchestratorError> {
        let mut seen = HashSet::new();
        let recipients: Vec<Recipient> = self
            .stores
            .directory
            .list_recipients()
            .await?
            .into_iter()
            .filter(|recipient| seen.insert(recipient.user_id.clone()))
            .collect();

        info!(
            users = recipients.len(),
            dry_run = self.config.dry_run,
            "Starting nudge batch at {}", now
        );

        let outcomes: Vec<UserOutcome> = stream::iter(recipients.iter())
            .map(|recipient| self.process_user(recipient, now))
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut report = BatchReport::default();
        for outcome in &outcomes {
            report.record(outcome);
        }

        info!(
            total = report.total,
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            contended = report.contended,
            errored = report.errored,
            "Nudge batch complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nudge_core::Quantity;

    #[test]
    fn test_batch_report_counts_reasons() {
        let mut report = BatchReport::default();
        report.record(&UserOutcome::Sent {
            target: NudgeTarget::CheckIn,
        });
        report.record(&UserOutcome::Failed {
            target: NudgeTarget::Quantity {
                quantity: Quantity::Water,
                gap: 500,
                goal: 2500,
            },
            reason: "blocked".to_string(),
        });
        report.record(&UserOutcome::Skipped(Ineligible::ChannelDisabled));
        report.record(&UserOutcome::Skipped(Ineligible::NotLinked));
        report.record(&UserOutcome::Skipped(Ineligible::NotLinked));
        report.record(&UserOutcome::Contended);
        report.record(&UserOutcome::Errored("db locked".to_string()));

        assert_eq!(report.total, 7);
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.contended, 1);
        assert_eq!(report.errored, 1);
        assert_eq!(report.skip_reasons.get("not_linked"), Some(&2));
        assert_eq!(report.skip_reasons.get("channel_disabled"), Some(&1));
    }
}
