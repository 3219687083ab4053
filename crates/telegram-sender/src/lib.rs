//! Minimal Telegram Bot API client.
//!
//! Only what outbound nudges need: `sendMessage` and a `getMe` token check.
//!
//! # Example
//!
//! ```no_run
//! use telegram_sender::{TelegramClient, TelegramConfig};
//!
//! # async fn example() -> Result<(), telegram_sender::TelegramError> {
//! let client = TelegramClient::new(TelegramConfig::from_env()?)?;
//! let sent = client.send_text(123456789, "💧 Time for a glass of water").await?;
//! println!("Sent message {}", sent.message_id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{TelegramClient, MAX_MESSAGE_CHARS};
pub use config::TelegramConfig;
pub use error::TelegramError;
pub use types::*;
