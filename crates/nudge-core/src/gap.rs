//! Gap calculation between latest observations and goals.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::quantity::{Goals, Quantity};

/// A single observed value for a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub value: i64,
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    pub fn new(value: i64, observed_at: DateTime<Utc>) -> Self {
        Self { value, observed_at }
    }
}

/// Latest observation per quantity for one user. May be empty.
pub type LatestMetrics = BTreeMap<Quantity, Observation>;

/// Shortfall against a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gap {
    /// Remaining amount to reach the goal; zero once met.
    Known(u64),
    /// No observation inside the freshness window.
    Unknown,
}

impl Gap {
    /// Positive known shortfall, if any.
    pub fn deficit(&self) -> Option<u64> {
        match self {
            Gap::Known(gap) if *gap > 0 => Some(*gap),
            _ => None,
        }
    }
}

/// Gap per tracked quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapReport {
    gaps: BTreeMap<Quantity, Gap>,
}

impl GapReport {
    pub fn get(&self, quantity: Quantity) -> Option<Gap> {
        self.gaps.get(&quantity).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Quantity, Gap)> + '_ {
        self.gaps.iter().map(|(q, g)| (*q, *g))
    }

    pub fn len(&self) -> usize {
        self.gaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }

    /// True when no quantity has a fresh observation.
    pub fn all_unknown(&self) -> bool {
        self.gaps.values().all(|g| matches!(g, Gap::Unknown))
    }
}

impl FromIterator<(Quantity, Gap)> for GapReport {
    fn from_iter<I: IntoIterator<Item = (Quantity, Gap)>>(iter: I) -> Self {
        Self {
            gaps: iter.into_iter().collect(),
        }
    }
}

/// Compute gaps for every quantity that has a goal.
///
/// An observation counts only if it is no older than `freshness` at `now`;
/// otherwise the gap is [`Gap::Unknown`], never a full deficit. Gaps are
/// floored at zero. A window reaching past the earliest representable
/// instant accepts every observation.
pub fn compute_gaps(
    latest: &LatestMetrics,
    goals: &Goals,
    now: DateTime<Utc>,
    freshness: Duration,
) -> GapReport {
    let cutoff = now
        .checked_sub_signed(freshness)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    goals
        .iter()
        .map(|(quantity, goal)| {
            let gap = match latest.get(&quantity) {
                Some(obs) if obs.observed_at >= cutoff => {
                    Gap::Known((i64::from(goal) - obs.value).max(0) as u64)
                }
                _ => Gap::Unknown,
            };
            (quantity, gap)
        })
        .collect()
}
