//! Nudge orchestrator for Health Whisperer.
//!
//! Composes the decision engine in [`nudge_core`] with stores and a chat
//! channel. For each user and scheduled run:
//!
//! ```text
//! evaluate ──not eligible──▶ done (nothing written)
//!    │
//!  eligible
//!    ▼
//! claim ──held by another run──▶ done (nothing written)
//!    │
//!    ▼
//! select_content ─▶ send (timeout) ─▶ log_outcome ─▶ done
//! ```
//!
//! Last-sent state is derived from the append-only dispatch log. The only
//! mutable marker is the per-user reservation claimed in `claim`, which keeps
//! two concurrent runs from both sending inside one cadence window.
//!
//! In a dry run the selected text goes straight to the sender, skipping
//! `claim` and `log_outcome`; the worker pairs it with [`LoggingSender`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::Utc;
//! use nudge_core::NudgeConfig;
//! use orchestrator::{InMemoryStore, NudgeOrchestrator, OrchestratorConfig, RecordingSender, Stores};
//!
//! # async fn example() -> Result<(), orchestrator::OrchestratorError> {
//! let store = Arc::new(InMemoryStore::new());
//! let orchestrator = NudgeOrchestrator::new(
//!     Stores::shared(store),
//!     RecordingSender::new(),
//!     &NudgeConfig::default(),
//!     OrchestratorConfig::default(),
//! );
//! let report = orchestrator.run_batch(Utc::now()).await?;
//! assert_eq!(report.total, 0);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod memory;
mod orchestrator;
mod sender;
mod sqlite;
mod stores;

pub use config::{
    OrchestratorConfig, OrchestratorConfigBuilder, DEFAULT_MAX_CONCURRENCY, DEFAULT_SEND_TIMEOUT,
};
pub use error::OrchestratorError;
pub use memory::InMemoryStore;
pub use orchestrator::{BatchReport, EligibleUser, Evaluation, NudgeOrchestrator, UserOutcome};
pub use sender::{
    ChannelSender, LoggingSender, RecordedMessage, RecordingSender, TelegramChannel,
};
pub use sqlite::{raw_preferences, SqliteStore};
pub use stores::{
    DispatchEntry, DispatchLog, DispatchOutcome, MetricsStore, PreferenceStore, Recipient, Stores,
    UserDirectory,
};
