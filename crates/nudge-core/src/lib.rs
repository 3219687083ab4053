//! Nudge decision engine for Health Whisperer.
//!
//! This crate holds the logic that decides *whether* a wellness nudge should
//! fire for a user right now and *what* it should say. It is pure apart from
//! the optional [`TextGenerator`] call, and reads no clock of its own: every
//! decision takes the current instant from the caller.
//!
//! - [`compute_gaps`] - deficits between latest observations and goals
//! - [`EligibilityEvaluator`] - cadence and quiet-hours gate
//! - [`ContentSelector`] - target selection plus generated or template text
//! - [`NudgeConfig`] - intervals, freshness window and tie-break priority
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use nudge_core::{compute_gaps, LatestMetrics, NudgeConfig, Observation, Quantity, RawPreferences};
//!
//! # async fn example() {
//! let config = NudgeConfig::default();
//! let now = Utc.with_ymd_and_hms(2026, 10, 19, 13, 0, 0).unwrap();
//!
//! let raw = RawPreferences {
//!     cadence: Some("daily".to_string()),
//!     quiet_start: Some("22:00".to_string()),
//!     quiet_end: Some("07:00".to_string()),
//!     ..Default::default()
//! };
//! let decision = config.evaluator().evaluate_raw(now, Some(&raw), None);
//! assert!(decision.is_eligible());
//!
//! let mut latest = LatestMetrics::new();
//! latest.insert(Quantity::Steps, Observation::new(5000, now));
//! let gaps = compute_gaps(&latest, &raw.goals, now, config.freshness);
//!
//! let content = config
//!     .content_selector()
//!     .select(&gaps, &raw.goals, Default::default())
//!     .await;
//! assert_eq!(content.target.label(), "steps");
//! # }
//! ```

mod config;
mod content;
mod eligibility;
mod error;
mod gap;
mod generator;
mod preferences;
mod quantity;
pub mod templates;

pub use config::{
    NudgeConfig, NudgeConfigBuilder, DEFAULT_FRESHNESS_HOURS, DEFAULT_TIMEZONE, MAX_WINDOW_HOURS,
};
pub use content::{
    select_target, ContentSelector, ContentSource, NudgeContent, NudgeTarget,
    DEFAULT_GENERATION_TIMEOUT,
};
pub use eligibility::{Eligibility, EligibilityEvaluator, Ineligible};
pub use error::{ConfigError, GenerationError, PreferenceError};
pub use gap::{compute_gaps, Gap, GapReport, LatestMetrics, Observation};
pub use generator::{PromptContext, TextGenerator};
pub use preferences::{
    Cadence, CadenceIntervals, Channel, NudgePreferences, QuietHours, RawPreferences, Reminders,
    Tone,
};
pub use quantity::{Goals, Quantity};

// Re-export async_trait for implementors of TextGenerator
pub use async_trait::async_trait;
