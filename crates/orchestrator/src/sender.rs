//! Channel senders that deliver a nudge to a linked chat.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use telegram_sender::TelegramClient;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::OrchestratorError;

/// Trait for delivering a nudge message.
///
/// Abstracted to support different transports (Telegram, tests, dry runs).
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Deliver `text` to the external chat `chat_id`.
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), OrchestratorError>;

    /// Sender name for logs.
    fn name(&self) -> &str;
}

/// A sender that only logs what it would deliver. Used for dry runs.
#[derive(Debug, Clone, Default)]
pub struct LoggingSender;

#[async_trait]
impl ChannelSender for LoggingSender {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), OrchestratorError> {
        info!("[dry-run] Nudge for chat {}: {}", chat_id, text);
        Ok(())
    }

    fn name(&self) -> &str {
        "logging"
    }
}

/// Delivers nudges through the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramChannel {
    client: TelegramClient,
}

impl TelegramChannel {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChannelSender for TelegramChannel {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), OrchestratorError> {
        let sent = self.client.send_text(chat_id, text).await?;
        debug!(chat_id, message_id = sent.message_id, "Telegram accepted nudge");
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

/// A message captured by [`RecordingSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMessage {
    pub chat_id: i64,
    pub text: String,
}

/// Records every send; can be told to fail or stall.
///
/// Clones share the same record, so a test can keep one handle and give the
/// other to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<RecordedMessage>>>,
    fail_with: Option<String>,
    delay: Option<Duration>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails with `reason` after being recorded.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Sleep for `delay` before completing each send.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Messages attempted so far, in order.
    pub async fn sent(&self) -> Vec<RecordedMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ChannelSender for RecordingSender {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), OrchestratorError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.sent.lock().await.push(RecordedMessage {
            chat_id,
            text: text.to_string(),
        });

        match &self.fail_with {
            Some(reason) => Err(OrchestratorError::SendFailed(reason.clone())),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_sender() {
        let sender = LoggingSender;
        sender.send(42, "test").await.unwrap();
        assert_eq!(sender.name(), "logging");
    }

    #[tokio::test]
    async fn test_recording_sender_shares_record_between_clones() {
        let sender = RecordingSender::new();
        let handle = sender.clone();

        sender.send(7, "hello").await.unwrap();
        assert_eq!(
            handle.sent().await,
            vec![RecordedMessage {
                chat_id: 7,
                text: "hello".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_failing_sender_still_records() {
        let sender = RecordingSender::failing("chat blocked the bot");

        let err = sender.send(7, "hello").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::SendFailed(ref r) if r == "chat blocked the bot"));
        assert_eq!(sender.sent().await.len(), 1);
    }
}
