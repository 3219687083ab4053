//! Error types for telegram-sender.

use thiserror::Error;

/// Errors that can occur when talking to the Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed (connect, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered `ok: false`.
    #[error("Telegram API error {code}: {description}")]
    Api { code: i32, description: String },

    /// Non-success status without a Bot API error body.
    #[error("Unexpected response: HTTP {status}: {body}")]
    UnexpectedResponse { status: u16, body: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Text is empty after trimming.
    #[error("Message text is empty")]
    EmptyMessage,

    /// Text exceeds the Bot API limit.
    #[error("Message too long ({length} chars, max {max})")]
    MessageTooLong { length: usize, max: usize },
}

impl TelegramError {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            TelegramError::Http(e) => e.is_timeout() || e.is_connect(),
            TelegramError::Api { code, .. } => *code == 429 || *code >= 500,
            TelegramError::UnexpectedResponse { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
