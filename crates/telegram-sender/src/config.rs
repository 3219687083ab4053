//! Configuration for the Bot API client.

use std::env;
use std::time::Duration;

use crate::error::TelegramError;

/// Default Bot API base URL.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for connecting to the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: String,
    /// Base URL of the Bot API (overridable for tests and local Bot API servers).
    pub api_url: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Suppress link previews in sent messages.
    pub disable_web_page_preview: bool,
}

impl TelegramConfig {
    /// Create a new configuration with the given bot token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            disable_web_page_preview: true,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// - `TELEGRAM_TOKEN` (required)
    /// - `TELEGRAM_API_URL` (default: https://api.telegram.org)
    pub fn from_env() -> Result<Self, TelegramError> {
        let token = env::var("TELEGRAM_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| TelegramError::Config("TELEGRAM_TOKEN not set".to_string()))?;

        let mut config = Self::new(token.trim());
        if let Ok(url) = env::var("TELEGRAM_API_URL") {
            config = config.with_api_url(url);
        }
        Ok(config)
    }

    /// Override the API base URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the URL for a Bot API method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .field("disable_web_page_preview", &self.disable_web_page_preview)
            .finish()
    }
}
