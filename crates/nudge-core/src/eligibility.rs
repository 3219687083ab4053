//! The single yes/no gate for "nudge this user now".

use std::fmt;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::preferences::{CadenceIntervals, Channel, NudgePreferences, RawPreferences};

/// Outcome of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    /// A nudge may be sent. `interval` is the cadence window it will occupy.
    Eligible { interval: Duration },
    NotEligible(Ineligible),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible { .. })
    }
}

/// Why a user may not be nudged right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligible {
    /// Channel is set to none.
    ChannelDisabled,
    /// Cadence is set to none.
    CadenceDisabled,
    /// Preferences are absent or malformed.
    Misconfigured(String),
    /// Chat channel selected but no chat account is linked.
    NotLinked,
    /// Local time falls inside the quiet-hours window.
    QuietHours { local_time: NaiveTime },
    /// The cadence interval has not elapsed since the last dispatch.
    CadenceNotElapsed { remaining: Duration },
}

impl Ineligible {
    /// Short machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            Ineligible::ChannelDisabled => "channel_disabled",
            Ineligible::CadenceDisabled => "cadence_disabled",
            Ineligible::Misconfigured(_) => "misconfigured",
            Ineligible::NotLinked => "not_linked",
            Ineligible::QuietHours { .. } => "quiet_hours",
            Ineligible::CadenceNotElapsed { .. } => "cadence_not_elapsed",
        }
    }
}

impl fmt::Display for Ineligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligible::Misconfigured(reason) => write!(f, "misconfigured: {}", reason),
            Ineligible::QuietHours { local_time } => {
                write!(f, "quiet hours (local {})", local_time.format("%H:%M"))
            }
            Ineligible::CadenceNotElapsed { remaining } => {
                write!(f, "cadence not elapsed ({}m remaining)", remaining.num_minutes())
            }
            other => f.write_str(other.code()),
        }
    }
}

/// Evaluates cadence and quiet hours against a caller-supplied clock.
#[derive(Debug, Clone)]
pub struct EligibilityEvaluator {
    intervals: CadenceIntervals,
    default_timezone: Tz,
}

impl Default for EligibilityEvaluator {
    fn default() -> Self {
        Self::new(CadenceIntervals::default(), chrono_tz::America::New_York)
    }
}

impl EligibilityEvaluator {
    pub fn new(intervals: CadenceIntervals, default_timezone: Tz) -> Self {
        Self {
            intervals,
            default_timezone,
        }
    }

    pub fn intervals(&self) -> &CadenceIntervals {
        &self.intervals
    }

    pub fn default_timezone(&self) -> Tz {
        self.default_timezone
    }

    /// Decide from stored preferences, failing closed when they are absent or invalid.
    pub fn evaluate_raw(
        &self,
        now: DateTime<Utc>,
        raw: Option<&RawPreferences>,
        last_dispatch: Option<DateTime<Utc>>,
    ) -> Eligibility {
        let Some(raw) = raw else {
            return Eligibility::NotEligible(Ineligible::Misconfigured(
                "no preferences stored".to_string(),
            ));
        };

        match NudgePreferences::from_raw(raw) {
            Ok(prefs) => self.evaluate(now, &prefs, last_dispatch),
            Err(err) => Eligibility::NotEligible(Ineligible::Misconfigured(err.to_string())),
        }
    }

    /// Decide whether a nudge may be sent at `now`.
    ///
    /// Disabled channel or cadence wins over everything else, then quiet
    /// hours, then cadence. With no prior dispatch the user is eligible; a
    /// last dispatch stamped after `now` never counts as elapsed.
    pub fn evaluate(
        &self,
        now: DateTime<Utc>,
        prefs: &NudgePreferences,
        last_dispatch: Option<DateTime<Utc>>,
    ) -> Eligibility {
        if prefs.channel == Channel::None {
            return Eligibility::NotEligible(Ineligible::ChannelDisabled);
        }

        let Some(interval) = self.intervals.interval(prefs.cadence) else {
            return Eligibility::NotEligible(Ineligible::CadenceDisabled);
        };
        if interval <= Duration::zero() {
            return Eligibility::NotEligible(Ineligible::Misconfigured(format!(
                "non-positive interval for cadence {}",
                prefs.cadence.to_storage()
            )));
        }

        let tz = prefs.timezone.unwrap_or(self.default_timezone);
        let local_time = now.with_timezone(&tz).time();
        if prefs.quiet_hours.contains(local_time) {
            return Eligibility::NotEligible(Ineligible::QuietHours { local_time });
        }

        let Some(last) = last_dispatch else {
            return Eligibility::Eligible { interval };
        };

        let elapsed = now - last;
        if elapsed >= interval {
            Eligibility::Eligible { interval }
        } else {
            Eligibility::NotEligible(Ineligible::CadenceNotElapsed {
                remaining: interval.checked_sub(&elapsed).unwrap_or(Duration::MAX),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::{Cadence, QuietHours, Reminders, Tone};
    use crate::quantity::Goals;
    use chrono::TimeZone;

    fn prefs(cadence: Cadence) -> NudgePreferences {
        NudgePreferences {
            channel: Channel::Chat,
            cadence,
            quiet_hours: QuietHours::parse("22:00", "07:00").unwrap(),
            tone: Tone::Gentle,
            goals: Goals::default(),
            reminders: Reminders::default(),
            timezone: Some(chrono_tz::UTC),
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, h, m, 0).unwrap()
    }

    #[test]
    fn test_no_prior_dispatch_is_eligible() {
        let eval = EligibilityEvaluator::default();
        let result = eval.evaluate(at(9, 0), &prefs(Cadence::Daily), None);
        assert_eq!(result, Eligibility::Eligible { interval: Duration::hours(24) });
    }

    #[test]
    fn test_quiet_hours_block_regardless_of_cadence() {
        let eval = EligibilityEvaluator::default();
        for (h, m) in [(22, 0), (23, 0), (0, 30), (6, 59)] {
            let result = eval.evaluate(at(h, m), &prefs(Cadence::Hourly), None);
            assert!(
                matches!(result, Eligibility::NotEligible(Ineligible::QuietHours { .. })),
                "{:02}:{:02} should be quiet",
                h,
                m
            );
        }
        assert!(eval.evaluate(at(7, 0), &prefs(Cadence::Hourly), None).is_eligible());
    }

    #[test]
    fn test_cadence_boundary_is_eligible() {
        let eval = EligibilityEvaluator::default();
        let now = at(12, 0);

        let exactly = eval.evaluate(now, &prefs(Cadence::Hourly), Some(now - Duration::hours(1)));
        assert!(exactly.is_eligible());

        let early = eval.evaluate(
            now,
            &prefs(Cadence::Hourly),
            Some(now - Duration::minutes(59)),
        );
        assert_eq!(
            early,
            Eligibility::NotEligible(Ineligible::CadenceNotElapsed {
                remaining: Duration::minutes(1)
            })
        );
    }

    #[test]
    fn test_custom_cadence() {
        let eval = EligibilityEvaluator::default();
        let now = at(12, 0);
        let prefs = prefs(Cadence::Custom { minutes: 90 });

        assert!(!eval.evaluate(now, &prefs, Some(now - Duration::minutes(89))).is_eligible());
        assert!(eval.evaluate(now, &prefs, Some(now - Duration::minutes(90))).is_eligible());
    }

    #[test]
    fn test_future_last_dispatch_not_elapsed() {
        let eval = EligibilityEvaluator::default();
        let now = at(12, 0);
        let result = eval.evaluate(now, &prefs(Cadence::Hourly), Some(now + Duration::minutes(5)));
        assert!(!result.is_eligible());
    }

    #[test]
    fn test_disabled_channel_or_cadence() {
        let eval = EligibilityEvaluator::default();
        let mut p = prefs(Cadence::Hourly);
        p.channel = Channel::None;
        assert_eq!(
            eval.evaluate(at(12, 0), &p, None),
            Eligibility::NotEligible(Ineligible::ChannelDisabled)
        );

        assert_eq!(
            eval.evaluate(at(12, 0), &prefs(Cadence::None), None),
            Eligibility::NotEligible(Ineligible::CadenceDisabled)
        );
    }

    #[test]
    fn test_quiet_hours_use_user_timezone() {
        let eval = EligibilityEvaluator::default();
        let mut p = prefs(Cadence::Hourly);
        p.timezone = Some(chrono_tz::Asia::Tokyo);

        // 14:00 UTC is 23:00 in Tokyo.
        let result = eval.evaluate(at(14, 0), &p, None);
        assert!(matches!(result, Eligibility::NotEligible(Ineligible::QuietHours { .. })));

        // 00:00 UTC is 09:00 in Tokyo.
        assert!(eval.evaluate(at(0, 0), &p, None).is_eligible());
    }

    #[test]
    fn test_missing_timezone_uses_default() {
        let eval = EligibilityEvaluator::new(CadenceIntervals::default(), chrono_tz::Asia::Tokyo);
        let mut p = prefs(Cadence::Hourly);
        p.timezone = None;
        assert!(!eval.evaluate(at(14, 0), &p, None).is_eligible());
    }

    #[test]
    fn test_evaluate_raw_fails_closed() {
        let eval = EligibilityEvaluator::default();

        let absent = eval.evaluate_raw(at(12, 0), None, None);
        assert!(matches!(absent, Eligibility::NotEligible(Ineligible::Misconfigured(_))));

        let raw = RawPreferences {
            cadence: Some("every-minute".to_string()),
            quiet_start: Some("22:00".to_string()),
            quiet_end: Some("07:00".to_string()),
            ..Default::default()
        };
        let malformed = eval.evaluate_raw(at(12, 0), Some(&raw), None);
        assert!(matches!(malformed, Eligibility::NotEligible(Ineligible::Misconfigured(_))));

        let valid = RawPreferences {
            cadence: Some("hourly".to_string()),
            ..raw
        };
        assert!(eval.evaluate_raw(at(12, 0), Some(&valid), None).is_eligible());
    }
}
