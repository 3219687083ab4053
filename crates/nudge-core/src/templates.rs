//! Deterministic nudge templates, one per target and tone.

use crate::content::NudgeTarget;
use crate::preferences::Tone;
use crate::quantity::Quantity;

/// Milliliters in one glass of water.
const GLASS_ML: u64 = 250;

/// Render the fallback message for a target. Never empty.
pub fn render(target: &NudgeTarget, tone: Tone) -> String {
    match target {
        NudgeTarget::Quantity {
            quantity,
            gap,
            goal,
        } => render_quantity(*quantity, *gap, *goal, tone),
        NudgeTarget::CheckIn => check_in(tone).to_string(),
    }
}

fn render_quantity(quantity: Quantity, gap: u64, goal: u32, tone: Tone) -> String {
    match (quantity, tone) {
        (Quantity::Steps, Tone::Gentle) => format!(
            "🚶 You're {} steps away from your {}-step goal. A gentle 10-minute walk would help.",
            gap, goal
        ),
        (Quantity::Steps, Tone::Coachy) => format!(
            "🚶 {} steps to go to hit {}. Get up and take a brisk walk now!",
            gap, goal
        ),
        (Quantity::Steps, Tone::Fun) => format!(
            "🚶 Your shoes miss you! Only {} steps left until {}. Tiny steps add up.",
            gap, goal
        ),
        (Quantity::Water, tone) => {
            let glasses = gap.div_ceil(GLASS_ML).max(1);
            let glass_word = if glasses == 1 { "glass" } else { "glasses" };
            match tone {
                Tone::Gentle => format!(
                    "💧 Quick sip? You're about {} {} ({} ml) from your {} ml water goal.",
                    glasses, glass_word, gap, goal
                ),
                Tone::Coachy => format!(
                    "💧 {} ml to go on hydration to hit {} ml. Drink a glass right now.",
                    gap, goal
                ),
                Tone::Fun => format!(
                    "💧 Your inner plant is thirsty: {} more {} to reach {} ml!",
                    glasses, glass_word, goal
                ),
            }
        }
        (Quantity::Sleep, tone) => {
            let short = format_minutes(gap);
            let target = format_minutes(u64::from(goal));
            match tone {
                Tone::Gentle => format!(
                    "🌙 Sleep came up {} short of your {} goal last night. Try winding down 30 minutes earlier tonight.",
                    short, target
                ),
                Tone::Coachy => format!(
                    "🌙 You missed your {} sleep goal by {}. Screens off early tonight.",
                    target, short
                ),
                Tone::Fun => format!(
                    "🌙 Your pillow filed a complaint: {} of your {} sleep went missing. Early night?",
                    short, target
                ),
            }
        }
        (Quantity::Calories, Tone::Gentle) => format!(
            "🥗 You're about {} kcal under today's {} kcal target. A balanced snack could help.",
            gap, goal
        ),
        (Quantity::Calories, Tone::Coachy) => format!(
            "🥗 {} kcal short of {} kcal. Fuel up with a protein-rich mini-meal.",
            gap, goal
        ),
        (Quantity::Calories, Tone::Fun) => format!(
            "🥗 Snack o'clock! {} of your {} kcal are still on the menu today.",
            gap, goal
        ),
        (Quantity::Protein, _) | (Quantity::Fiber, _) => {
            let what = quantity.as_str();
            match tone {
                Tone::Gentle => format!(
                    "🥜 {} g of {} left toward your {} g. Yogurt, beans or nuts are easy wins.",
                    gap, what, goal
                ),
                Tone::Coachy => format!(
                    "🥜 {} g {} still to hit your {} g target. Plan it into your next meal.",
                    gap, what, goal
                ),
                Tone::Fun => format!(
                    "🥜 {} g of {} are waiting to be eaten before you reach {} g. Go get them!",
                    gap, what, goal
                ),
            }
        }
    }
}

fn check_in(tone: Tone) -> &'static str {
    match tone {
        Tone::Gentle => "✨ How are you feeling right now? One tiny healthy choice is plenty.",
        Tone::Coachy => "✨ Quick check-in: log your steps, water and sleep so we can keep you on track.",
        Tone::Fun => "✨ Ping! Your friendly health sidekick says hi. How's the day going?",
    }
}

fn format_minutes(minutes: u64) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{} min", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}min", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_target_and_tone_renders_text() {
        let tones = [Tone::Gentle, Tone::Coachy, Tone::Fun];
        for tone in tones {
            assert!(!render(&NudgeTarget::CheckIn, tone).is_empty());
            for quantity in Quantity::ALL {
                let target = NudgeTarget::Quantity {
                    quantity,
                    gap: 1,
                    goal: 10,
                };
                assert!(!render(&target, tone).trim().is_empty());
            }
        }
    }

    #[test]
    fn test_every_quantity_template_names_its_goal() {
        for tone in [Tone::Gentle, Tone::Coachy, Tone::Fun] {
            for quantity in Quantity::ALL {
                let goal = if quantity == Quantity::Sleep { 480 } else { 2345 };
                let target = NudgeTarget::Quantity {
                    quantity,
                    gap: 90,
                    goal,
                };
                let expected = if quantity == Quantity::Sleep {
                    "8h".to_string()
                } else {
                    goal.to_string()
                };
                let text = render(&target, tone);
                assert!(
                    text.contains(&expected),
                    "{:?}/{:?} should name the goal: {}",
                    quantity,
                    tone,
                    text
                );
            }
        }
    }

    #[test]
    fn test_sleep_template_shows_shortfall_and_goal() {
        let target = NudgeTarget::Quantity {
            quantity: Quantity::Sleep,
            gap: 95,
            goal: 420,
        };
        let text = render(&target, Tone::Coachy);
        assert!(text.contains("7h sleep goal"));
        assert!(text.contains("1h 35min"));
    }

    #[test]
    fn test_steps_template_mentions_gap_and_goal() {
        let target = NudgeTarget::Quantity {
            quantity: Quantity::Steps,
            gap: 3000,
            goal: 8000,
        };
        let text = render(&target, Tone::Gentle);
        assert!(text.contains("3000 steps"));
        assert!(text.contains("8000-step"));
    }

    #[test]
    fn test_water_rounds_up_to_glasses() {
        let target = NudgeTarget::Quantity {
            quantity: Quantity::Water,
            gap: 600,
            goal: 2500,
        };
        assert!(render(&target, Tone::Gentle).contains("3 glasses"));

        let one = NudgeTarget::Quantity {
            quantity: Quantity::Water,
            gap: 100,
            goal: 2500,
        };
        assert!(render(&one, Tone::Gentle).contains("1 glass "));
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(45), "45 min");
        assert_eq!(format_minutes(120), "2h");
        assert_eq!(format_minutes(95), "1h 35min");
    }
}
