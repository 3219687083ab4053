//! Nudge preferences: channel, cadence, quiet hours, tone and goals.
//!
//! Stores hand back loosely typed [`RawPreferences`]; they are validated into
//! [`NudgePreferences`] once, at the store boundary, so the decision logic
//! only ever sees well-formed values.

use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::PreferenceError;
use crate::quantity::{Goals, Quantity};

/// Where nudges are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// The linked chat account.
    Chat,
    /// Nudges disabled.
    None,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Chat => "chat",
            Channel::None => "none",
        }
    }

    /// Parse a stored channel value.
    ///
    /// `telegram` is accepted as the chat channel and `inapp` as disabled,
    /// since in-app hints are not pushed.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "chat" | "telegram" => Some(Channel::Chat),
            "none" | "off" | "inapp" => Some(Channel::None),
            _ => None,
        }
    }
}

/// Minimum spacing between nudges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Hourly,
    ThreePerDay,
    Smart,
    Daily,
    /// Explicit interval in minutes (always at least one).
    Custom { minutes: u32 },
    /// Nudges disabled.
    None,
}

impl Cadence {
    /// Storage representation; custom intervals render as `custom:<minutes>`.
    pub fn to_storage(&self) -> String {
        match self {
            Cadence::Hourly => "hourly".to_string(),
            Cadence::ThreePerDay => "3_per_day".to_string(),
            Cadence::Smart => "smart".to_string(),
            Cadence::Daily => "daily".to_string(),
            Cadence::Custom { minutes } => format!("custom:{}", minutes),
            Cadence::None => "none".to_string(),
        }
    }

    /// Parse a stored cadence value.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        if let Some(minutes) = s.strip_prefix("custom:") {
            return match minutes.trim().parse::<u32>() {
                Ok(minutes) if minutes > 0 => Some(Cadence::Custom { minutes }),
                _ => None,
            };
        }
        match s.as_str() {
            "hourly" => Some(Cadence::Hourly),
            "3_per_day" | "three_per_day" => Some(Cadence::ThreePerDay),
            "smart" => Some(Cadence::Smart),
            "daily" => Some(Cadence::Daily),
            "none" | "off" => Some(Cadence::None),
            _ => None,
        }
    }
}

/// Message tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Gentle,
    Coachy,
    Fun,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Gentle => "gentle",
            Tone::Coachy => "coachy",
            Tone::Fun => "fun",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gentle" => Some(Tone::Gentle),
            "coachy" => Some(Tone::Coachy),
            "fun" => Some(Tone::Fun),
            _ => None,
        }
    }
}

/// A daily local-time window with no nudges.
///
/// Start is inclusive and end exclusive. A window whose start is after its
/// end wraps past midnight; equal bounds describe an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl QuietHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse `HH:MM` (or `HH:MM:SS`) bounds.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        Some(Self::new(parse_clock(start)?, parse_clock(end)?))
    }

    /// Whether a local time falls inside the window.
    pub fn contains(&self, local: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= local && local < self.end
        } else {
            local >= self.start || local < self.end
        }
    }
}

fn parse_clock(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

/// Per-quantity reminder switches for steps, water and sleep.
///
/// Other quantities have no switch; their goal alone decides whether they
/// are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminders {
    pub steps: bool,
    pub water: bool,
    pub sleep: bool,
}

impl Default for Reminders {
    fn default() -> Self {
        Self {
            steps: true,
            water: true,
            sleep: true,
        }
    }
}

impl Reminders {
    pub fn enabled(&self, quantity: Quantity) -> bool {
        match quantity {
            Quantity::Steps => self.steps,
            Quantity::Water => self.water,
            Quantity::Sleep => self.sleep,
            Quantity::Calories | Quantity::Protein | Quantity::Fiber => true,
        }
    }

    /// Goals with every switched-off quantity untracked.
    pub fn mask(&self, goals: &Goals) -> Goals {
        let mut masked = *goals;
        for quantity in Quantity::ALL {
            if !self.enabled(quantity) {
                masked.set(quantity, None);
            }
        }
        masked
    }
}

/// Preferences as read from a store, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPreferences {
    pub channel: Option<String>,
    pub cadence: Option<String>,
    pub tone: Option<String>,
    pub quiet_start: Option<String>,
    pub quiet_end: Option<String>,
    pub timezone: Option<String>,
    pub goals: Goals,
    pub reminders: Reminders,
}

/// Validated nudge preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct NudgePreferences {
    pub channel: Channel,
    pub cadence: Cadence,
    pub quiet_hours: QuietHours,
    pub tone: Tone,
    pub goals: Goals,
    pub reminders: Reminders,
    /// `None` means the user never chose one; the evaluator applies its default.
    pub timezone: Option<Tz>,
}

impl NudgePreferences {
    /// Validate stored preferences.
    ///
    /// Channel defaults to chat and tone to gentle when unset. Cadence and
    /// quiet hours have no default: missing or malformed values are errors,
    /// and so is an unparseable timezone.
    pub fn from_raw(raw: &RawPreferences) -> Result<Self, PreferenceError> {
        let channel = match raw.channel.as_deref() {
            None => Channel::Chat,
            Some(value) => Channel::parse(value)
                .ok_or_else(|| PreferenceError::invalid("channel", value))?,
        };

        let cadence_value = raw
            .cadence
            .as_deref()
            .ok_or(PreferenceError::Missing("cadence"))?;
        let cadence = Cadence::parse(cadence_value)
            .ok_or_else(|| PreferenceError::invalid("cadence", cadence_value))?;

        let tone = match raw.tone.as_deref() {
            None => Tone::default(),
            Some(value) => {
                Tone::parse(value).ok_or_else(|| PreferenceError::invalid("tone", value))?
            }
        };

        let (start, end) = match (raw.quiet_start.as_deref(), raw.quiet_end.as_deref()) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(PreferenceError::Missing("quiet_hours")),
        };
        let quiet_hours = QuietHours::parse(start, end)
            .ok_or_else(|| PreferenceError::invalid("quiet_hours", format!("{}-{}", start, end)))?;

        let timezone = match raw.timezone.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => Some(
                name.parse::<Tz>()
                    .map_err(|_| PreferenceError::invalid("timezone", name))?,
            ),
        };

        Ok(Self {
            channel,
            cadence,
            quiet_hours,
            tone,
            goals: raw.goals,
            reminders: raw.reminders,
            timezone,
        })
    }

    /// Goals eligible for a nudge: tracked and not switched off.
    pub fn nudge_goals(&self) -> Goals {
        self.reminders.mask(&self.goals)
    }
}

/// Cadence intervals that are configuration rather than fixed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceIntervals {
    pub hourly: Duration,
    pub three_per_day: Duration,
    pub smart: Duration,
    pub daily: Duration,
}

impl Default for CadenceIntervals {
    fn default() -> Self {
        Self {
            hourly: Duration::hours(1),
            three_per_day: Duration::hours(4),
            smart: Duration::hours(6),
            daily: Duration::hours(24),
        }
    }
}

impl CadenceIntervals {
    /// Minimum interval for a cadence; `None` for a disabled cadence.
    pub fn interval(&self, cadence: Cadence) -> Option<Duration> {
        match cadence {
            Cadence::Hourly => Some(self.hourly),
            Cadence::ThreePerDay => Some(self.three_per_day),
            Cadence::Smart => Some(self.smart),
            Cadence::Daily => Some(self.daily),
            Cadence::Custom { minutes } => Some(Duration::minutes(i64::from(minutes))),
            Cadence::None => None,
        }
    }
}
