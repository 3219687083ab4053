//! Engine configuration.

use std::env;
use std::time::Duration as StdDuration;

use chrono::Duration;
use chrono_tz::Tz;

use crate::content::{ContentSelector, DEFAULT_GENERATION_TIMEOUT};
use crate::eligibility::EligibilityEvaluator;
use crate::error::ConfigError;
use crate::preferences::CadenceIntervals;
use crate::quantity::Quantity;

/// Default zone for users who never picked one.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Default age after which an observation no longer counts.
pub const DEFAULT_FRESHNESS_HOURS: i64 = 24;

/// Upper bound for any configured window: ten years.
pub const MAX_WINDOW_HOURS: i64 = 10 * 365 * 24;

/// Tunables for the nudge decision engine.
#[derive(Debug, Clone)]
pub struct NudgeConfig {
    /// Minimum interval per cadence.
    pub intervals: CadenceIntervals,
    /// Maximum observation age for a known gap.
    pub freshness: Duration,
    /// Timezone applied when a user has none.
    pub default_timezone: Tz,
    /// Tie-break order for equal gaps.
    pub priority: Vec<Quantity>,
    /// Time allowed for text generation before falling back.
    pub generation_timeout: StdDuration,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            intervals: CadenceIntervals::default(),
            freshness: Duration::hours(DEFAULT_FRESHNESS_HOURS),
            default_timezone: DEFAULT_TIMEZONE,
            priority: Quantity::ALL.to_vec(),
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }
}

impl NudgeConfig {
    /// Create configuration from environment variables.
    ///
    /// All variables are optional. Freshness and cadence windows longer
    /// than ten years are rejected.
    /// - `NUDGE_FRESHNESS_HOURS` - observation freshness window (default: 24)
    /// - `NUDGE_DEFAULT_TIMEZONE` - IANA zone for users without one (default: America/New_York)
    /// - `NUDGE_CADENCE_HOURLY_MINUTES` (default: 60)
    /// - `NUDGE_CADENCE_THREE_PER_DAY_MINUTES` (default: 240)
    /// - `NUDGE_CADENCE_SMART_MINUTES` (default: 360)
    /// - `NUDGE_CADENCE_DAILY_MINUTES` (default: 1440)
    /// - `NUDGE_PRIORITY` - comma-separated tie-break order (default: steps,water,sleep,calories,protein,fiber)
    /// - `NUDGE_GENERATION_TIMEOUT_SECS` (default: 8)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let freshness = match read_bounded("NUDGE_FRESHNESS_HOURS", MAX_WINDOW_HOURS)? {
            Some(hours) => window("NUDGE_FRESHNESS_HOURS", hours, Duration::try_hours)?,
            None => defaults.freshness,
        };

        let default_timezone = match env::var("NUDGE_DEFAULT_TIMEZONE") {
            Ok(name) => name.trim().parse::<Tz>().map_err(|_| ConfigError::Invalid {
                name: "NUDGE_DEFAULT_TIMEZONE",
                value: name.clone(),
            })?,
            Err(_) => defaults.default_timezone,
        };

        let minutes = |name: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match read_bounded(name, MAX_WINDOW_HOURS * 60)? {
                Some(n) => window(name, n, Duration::try_minutes),
                None => Ok(default),
            }
        };
        let intervals = CadenceIntervals {
            hourly: minutes("NUDGE_CADENCE_HOURLY_MINUTES", defaults.intervals.hourly)?,
            three_per_day: minutes(
                "NUDGE_CADENCE_THREE_PER_DAY_MINUTES",
                defaults.intervals.three_per_day,
            )?,
            smart: minutes("NUDGE_CADENCE_SMART_MINUTES", defaults.intervals.smart)?,
            daily: minutes("NUDGE_CADENCE_DAILY_MINUTES", defaults.intervals.daily)?,
        };

        let priority = match env::var("NUDGE_PRIORITY") {
            Ok(value) => parse_priority(&value).ok_or(ConfigError::Invalid {
                name: "NUDGE_PRIORITY",
                value,
            })?,
            Err(_) => defaults.priority,
        };

        let generation_timeout = read_bounded("NUDGE_GENERATION_TIMEOUT_SECS", i64::MAX)?
            .map(|secs| StdDuration::from_secs(secs as u64))
            .unwrap_or(defaults.generation_timeout);

        Ok(Self {
            intervals,
            freshness,
            default_timezone,
            priority,
            generation_timeout,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> NudgeConfigBuilder {
        NudgeConfigBuilder::default()
    }

    /// Evaluator using these intervals and default timezone.
    pub fn evaluator(&self) -> EligibilityEvaluator {
        EligibilityEvaluator::new(self.intervals, self.default_timezone)
    }

    /// Template-only content selector using this priority.
    pub fn content_selector(&self) -> ContentSelector {
        ContentSelector::new(self.priority.clone())
    }
}

/// Builder for NudgeConfig.
#[derive(Debug, Default)]
pub struct NudgeConfigBuilder {
    config: NudgeConfig,
}

impl NudgeConfigBuilder {
    pub fn intervals(mut self, intervals: CadenceIntervals) -> Self {
        self.config.intervals = intervals;
        self
    }

    pub fn freshness(mut self, freshness: Duration) -> Self {
        self.config.freshness = freshness;
        self
    }

    pub fn default_timezone(mut self, tz: Tz) -> Self {
        self.config.default_timezone = tz;
        self
    }

    pub fn priority(mut self, priority: Vec<Quantity>) -> Self {
        self.config.priority = priority;
        self
    }

    pub fn generation_timeout(mut self, timeout: StdDuration) -> Self {
        self.config.generation_timeout = timeout;
        self
    }

    pub fn build(self) -> NudgeConfig {
        self.config
    }
}

/// Read an integer in `1..=max`; unset is `None`.
fn read_bounded(name: &'static str, max: i64) -> Result<Option<i64>, ConfigError> {
    match env::var(name) {
        Ok(value) => match value.trim().parse::<i64>() {
            Ok(n) if n > 0 && n <= max => Ok(Some(n)),
            _ => Err(ConfigError::Invalid { name, value }),
        },
        Err(_) => Ok(None),
    }
}

fn window(
    name: &'static str,
    n: i64,
    build: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    build(n).ok_or_else(|| ConfigError::Invalid {
        name,
        value: n.to_string(),
    })
}

/// Parse a comma-separated quantity list; `None` if any entry is unknown or the list is empty.
fn parse_priority(value: &str) -> Option<Vec<Quantity>> {
    let mut priority = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let quantity = Quantity::parse(part)?;
        if !priority.contains(&quantity) {
            priority.push(quantity);
        }
    }
    (!priority.is_empty()).then_some(priority)
}
