//! Telegram Bot API HTTP client.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::TelegramConfig;
use crate::error::TelegramError;
use crate::types::{ApiResponse, BotUser, SendMessageParams, SentMessage};

/// Bot API limit on message text length, in UTF-16 code units; chars is close enough.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    /// Build a client. Does not contact the API.
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramError> {
        if config.token.trim().is_empty() {
            return Err(TelegramError::Config("bot token is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(TelegramError::Http)?;

        Ok(Self { http, config })
    }

    /// Fetch the bot account; useful as a token check at startup.
    pub async fn get_me(&self) -> Result<BotUser, TelegramError> {
        let me: BotUser = self.call::<(), _>("getMe", None).await?;
        info!(
            "Telegram bot ready: {}",
            me.username.as_deref().unwrap_or(&me.first_name)
        );
        Ok(me)
    }

    /// Send a plain text message to a chat.
    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<SentMessage, TelegramError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TelegramError::EmptyMessage);
        }
        let length = text.chars().count();
        if length > MAX_MESSAGE_CHARS {
            return Err(TelegramError::MessageTooLong {
                length,
                max: MAX_MESSAGE_CHARS,
            });
        }

        let params = SendMessageParams {
            chat_id,
            text: text.to_string(),
            disable_web_page_preview: self.config.disable_web_page_preview,
        };
        self.call("sendMessage", Some(params)).await
    }

    /// Get the configuration.
    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<R, TelegramError> {
        debug!("Bot API call: {}", method);

        let request = self.http.post(self.config.method_url(method));
        let request = match &params {
            Some(params) => request.json(params),
            None => request,
        };
        let response = request.send().await.map_err(TelegramError::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(TelegramError::Http)?;

        let envelope: ApiResponse<R> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) => {
                return Err(TelegramError::UnexpectedResponse {
                    status: status.as_u16(),
                    body,
                })
            }
        };

        if !envelope.ok {
            return Err(TelegramError::Api {
                code: envelope.error_code.unwrap_or(status.as_u16() as i32),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        envelope
            .result
            .ok_or_else(|| TelegramError::UnexpectedResponse {
                status: status.as_u16(),
                body: "missing result".to_string(),
            })
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("config", &self.config)
            .finish()
    }
}
