//! Error types for orchestrator operations.

use database::DatabaseError;
use nudge_core::ConfigError;
use telegram_sender::TelegramError;
use thiserror::Error;

/// Errors that can occur while dispatching nudges.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Persistence layer failed.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// A non-SQL store failed.
    #[error("store error: {0}")]
    Store(String),

    /// Telegram rejected or failed the send.
    #[error("telegram error: {0}")]
    Telegram(#[from] TelegramError),

    /// Message sending failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The sender did not finish within the send timeout.
    #[error("send timed out after {0:?}")]
    SendTimeout(std::time::Duration),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
