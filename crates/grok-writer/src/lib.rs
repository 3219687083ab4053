//! xAI Grok nudge writer for Health Whisperer.
//!
//! Implements [`nudge_core::TextGenerator`] on top of the xAI
//! chat-completions API so the content selector can phrase nudges with a
//! model, falling back to templates whenever this crate errors or is slow.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use grok_writer::{GrokWriter, GrokWriterConfig};
//! use nudge_core::ContentSelector;
//!
//! # fn example() -> Result<(), nudge_core::GenerationError> {
//! let writer = GrokWriter::new(GrokWriterConfig::builder().api_key("xai-...").build())?;
//! let selector = ContentSelector::default()
//!     .with_generator(Arc::new(writer), std::time::Duration::from_secs(8));
//! # Ok(())
//! # }
//! ```

mod api_types;
mod config;
mod writer;

pub use api_types::*;
pub use config::{GrokWriterConfig, GrokWriterConfigBuilder, DEFAULT_SYSTEM_PROMPT};
pub use writer::GrokWriter;
