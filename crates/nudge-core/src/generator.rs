//! Text generation seam for nudge wording.

use async_trait::async_trait;
use serde::Serialize;

use crate::content::NudgeTarget;
use crate::error::GenerationError;
use crate::gap::GapReport;
use crate::preferences::Tone;

/// Everything a generator may use to phrase a nudge.
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub target: NudgeTarget,
    pub tone: Tone,
    pub gaps: GapReport,
    /// The deterministic template text for the same target and tone.
    pub template: String,
}

impl PromptContext {
    /// Render the context as a plain-language request for a model.
    pub fn to_prompt(&self) -> String {
        let mut prompt = String::new();

        match &self.target {
            NudgeTarget::Quantity {
                quantity,
                gap,
                goal,
            } => {
                prompt.push_str(&format!(
                    "Write one short {} nudge about {}: the user is {} {} short of a daily goal of {} {}.",
                    self.tone.as_str(),
                    quantity,
                    gap,
                    quantity.unit(),
                    goal,
                    quantity.unit()
                ));
            }
            NudgeTarget::CheckIn => {
                prompt.push_str(&format!(
                    "Write one short {} check-in message encouraging a small healthy action.",
                    self.tone.as_str()
                ));
            }
        }

        let known: Vec<String> = self
            .gaps
            .iter()
            .filter_map(|(q, g)| g.deficit().map(|d| format!("{} {} {}", q, d, q.unit())))
            .collect();
        if !known.is_empty() {
            prompt.push_str(&format!(" Other open gaps: {}.", known.join(", ")));
        }

        prompt.push_str(&format!(
            " Keep it under 200 characters. Example of the expected style: \"{}\"",
            self.template
        ));
        prompt
    }
}

/// An external service that phrases nudges.
///
/// Failures never block a dispatch; callers fall back to templates.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce the message text.
    async fn generate(&self, context: &PromptContext) -> Result<String, GenerationError>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gap::Gap;
    use crate::quantity::Quantity;

    #[test]
    fn test_prompt_mentions_target_and_template() {
        let gaps: GapReport = [(Quantity::Steps, Gap::Known(3000)), (Quantity::Water, Gap::Known(500))]
            .into_iter()
            .collect();
        let context = PromptContext {
            target: NudgeTarget::Quantity {
                quantity: Quantity::Steps,
                gap: 3000,
                goal: 8000,
            },
            tone: Tone::Coachy,
            gaps,
            template: "Walk!".to_string(),
        };

        let prompt = context.to_prompt();
        assert!(prompt.contains("coachy nudge about steps"));
        assert!(prompt.contains("3000 steps short"));
        assert!(prompt.contains("water 500 ml"));
        assert!(prompt.contains("\"Walk!\""));
    }

    #[test]
    fn test_prompt_for_check_in() {
        let context = PromptContext {
            target: NudgeTarget::CheckIn,
            tone: Tone::Fun,
            gaps: GapReport::default(),
            template: "How are you?".to_string(),
        };

        let prompt = context.to_prompt();
        assert!(prompt.contains("fun check-in"));
        assert!(!prompt.contains("Other open gaps"));
    }
}
