//! Tracked health quantities and per-quantity goals.

use serde::{Deserialize, Serialize};

/// A health quantity that can carry a daily goal.
///
/// Declaration order is the default tie-break priority used by the
/// content selector: steps, then water, then sleep, then the diet goals.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Daily step count.
    Steps,
    /// Water intake in milliliters.
    Water,
    /// Sleep duration in minutes.
    Sleep,
    /// Energy intake in kcal.
    Calories,
    /// Protein intake in grams.
    Protein,
    /// Fiber intake in grams.
    Fiber,
}

impl Quantity {
    /// Every quantity, in default priority order.
    pub const ALL: [Quantity; 6] = [
        Quantity::Steps,
        Quantity::Water,
        Quantity::Sleep,
        Quantity::Calories,
        Quantity::Protein,
        Quantity::Fiber,
    ];

    /// Stable identifier used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Quantity::Steps => "steps",
            Quantity::Water => "water",
            Quantity::Sleep => "sleep",
            Quantity::Calories => "calories",
            Quantity::Protein => "protein",
            Quantity::Fiber => "fiber",
        }
    }

    /// Parse a quantity name, accepting the storage column spellings too.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "steps" => Some(Quantity::Steps),
            "water" | "water_ml" => Some(Quantity::Water),
            "sleep" | "sleep_minutes" => Some(Quantity::Sleep),
            "calories" | "kcal" => Some(Quantity::Calories),
            "protein" | "protein_g" => Some(Quantity::Protein),
            "fiber" | "fiber_g" => Some(Quantity::Fiber),
            _ => None,
        }
    }

    /// Unit the goal and observations are expressed in.
    pub fn unit(&self) -> &'static str {
        match self {
            Quantity::Steps => "steps",
            Quantity::Water => "ml",
            Quantity::Sleep => "minutes",
            Quantity::Calories => "kcal",
            Quantity::Protein | Quantity::Fiber => "g",
        }
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default daily step goal.
pub const DEFAULT_STEPS_GOAL: u32 = 8000;
/// Default daily water goal in ml.
pub const DEFAULT_WATER_GOAL_ML: u32 = 2500;
/// Default nightly sleep goal in minutes.
pub const DEFAULT_SLEEP_GOAL_MINUTES: u32 = 420;

/// Numeric daily goals. `None` means the user tracks no goal for that quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goals {
    pub steps: Option<u32>,
    pub water_ml: Option<u32>,
    pub sleep_minutes: Option<u32>,
    pub calories: Option<u32>,
    pub protein_g: Option<u32>,
    pub fiber_g: Option<u32>,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            steps: Some(DEFAULT_STEPS_GOAL),
            water_ml: Some(DEFAULT_WATER_GOAL_ML),
            sleep_minutes: Some(DEFAULT_SLEEP_GOAL_MINUTES),
            calories: None,
            protein_g: None,
            fiber_g: None,
        }
    }
}

impl Goals {
    /// Goals with nothing tracked.
    pub fn none() -> Self {
        Self {
            steps: None,
            water_ml: None,
            sleep_minutes: None,
            calories: None,
            protein_g: None,
            fiber_g: None,
        }
    }

    /// Goal for a quantity, if tracked.
    pub fn get(&self, quantity: Quantity) -> Option<u32> {
        match quantity {
            Quantity::Steps => self.steps,
            Quantity::Water => self.water_ml,
            Quantity::Sleep => self.sleep_minutes,
            Quantity::Calories => self.calories,
            Quantity::Protein => self.protein_g,
            Quantity::Fiber => self.fiber_g,
        }
    }

    /// Set the goal for a quantity.
    pub fn set(&mut self, quantity: Quantity, goal: Option<u32>) {
        let slot = match quantity {
            Quantity::Steps => &mut self.steps,
            Quantity::Water => &mut self.water_ml,
            Quantity::Sleep => &mut self.sleep_minutes,
            Quantity::Calories => &mut self.calories,
            Quantity::Protein => &mut self.protein_g,
            Quantity::Fiber => &mut self.fiber_g,
        };
        *slot = goal;
    }

    /// Tracked quantities and their goals, in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (Quantity, u32)> + '_ {
        Quantity::ALL
            .into_iter()
            .filter_map(|q| self.get(q).map(|goal| (q, goal)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_parse() {
        assert_eq!(Quantity::parse("steps"), Some(Quantity::Steps));
        assert_eq!(Quantity::parse("water_ml"), Some(Quantity::Water));
        assert_eq!(Quantity::parse(" Sleep "), Some(Quantity::Sleep));
        assert_eq!(Quantity::parse("kcal"), Some(Quantity::Calories));
        assert_eq!(Quantity::parse("weight"), None);
    }

    #[test]
    fn test_quantity_roundtrips_through_as_str() {
        for q in Quantity::ALL {
            assert_eq!(Quantity::parse(q.as_str()), Some(q));
        }
    }

    #[test]
    fn test_default_goals() {
        let goals = Goals::default();
        assert_eq!(goals.get(Quantity::Steps), Some(8000));
        assert_eq!(goals.get(Quantity::Water), Some(2500));
        assert_eq!(goals.get(Quantity::Sleep), Some(420));
        assert_eq!(goals.get(Quantity::Calories), None);
        assert_eq!(goals.iter().count(), 3);
    }

    #[test]
    fn test_goals_set() {
        let mut goals = Goals::none();
        goals.set(Quantity::Protein, Some(75));
        assert_eq!(goals.iter().collect::<Vec<_>>(), vec![(Quantity::Protein, 75)]);
    }
}
