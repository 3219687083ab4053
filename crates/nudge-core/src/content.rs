//! Content selection: which gap to nudge about, and the words to use.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::gap::GapReport;
use crate::generator::{PromptContext, TextGenerator};
use crate::preferences::Tone;
use crate::quantity::{Goals, Quantity};
use crate::templates;

/// Default time allowed for a generator before falling back to templates.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(8);

/// What a nudge is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NudgeTarget {
    /// A specific goal with a known positive gap.
    Quantity {
        quantity: Quantity,
        gap: u64,
        goal: u32,
    },
    /// Generic encouragement when no known gap is open.
    CheckIn,
}

impl NudgeTarget {
    /// Label stored with dispatch log entries.
    pub fn label(&self) -> &'static str {
        match self {
            NudgeTarget::Quantity { quantity, .. } => quantity.as_str(),
            NudgeTarget::CheckIn => "check_in",
        }
    }
}

/// Where the message text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Generated,
    Template,
}

/// A selected nudge message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NudgeContent {
    pub text: String,
    pub target: NudgeTarget,
    pub source: ContentSource,
}

/// Pick the quantity with the largest known positive gap.
///
/// Ties go to whichever quantity appears first in `priority`; quantities
/// missing from `priority` rank after it in declaration order. With no
/// positive known gap the target is a check-in.
pub fn select_target(gaps: &GapReport, goals: &Goals, priority: &[Quantity]) -> NudgeTarget {
    let ordered = priority
        .iter()
        .copied()
        .chain(Quantity::ALL.into_iter().filter(|q| !priority.contains(q)));

    let mut best: Option<(Quantity, u64, u32)> = None;
    for quantity in ordered {
        let (Some(gap), Some(goal)) = (
            gaps.get(quantity).and_then(|g| g.deficit()),
            goals.get(quantity),
        ) else {
            continue;
        };
        if best.map_or(true, |(_, best_gap, _)| gap > best_gap) {
            best = Some((quantity, gap, goal));
        }
    }

    match best {
        Some((quantity, gap, goal)) => NudgeTarget::Quantity {
            quantity,
            gap,
            goal,
        },
        None => NudgeTarget::CheckIn,
    }
}

/// Chooses a target and produces its message.
///
/// A configured generator is tried first under a timeout; any error, timeout
/// or blank answer falls back to the deterministic template.
#[derive(Clone)]
pub struct ContentSelector {
    priority: Vec<Quantity>,
    generator: Option<Arc<dyn TextGenerator>>,
    generation_timeout: Duration,
}

impl Default for ContentSelector {
    fn default() -> Self {
        Self::new(Quantity::ALL.to_vec())
    }
}

impl ContentSelector {
    /// Template-only selector with the given tie-break priority.
    pub fn new(priority: Vec<Quantity>) -> Self {
        Self {
            priority,
            generator: None,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    /// Try `generator` before templates, allowing it `generation_timeout`.
    pub fn with_generator(
        mut self,
        generator: Arc<dyn TextGenerator>,
        generation_timeout: Duration,
    ) -> Self {
        self.generator = Some(generator);
        self.generation_timeout = generation_timeout;
        self
    }

    pub fn priority(&self) -> &[Quantity] {
        &self.priority
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Select the target and produce a non-empty message for it.
    pub async fn select(&self, gaps: &GapReport, goals: &Goals, tone: Tone) -> NudgeContent {
        let target = select_target(gaps, goals, &self.priority);
        let template = templates::render(&target, tone);

        let Some(generator) = &self.generator else {
            return NudgeContent {
                text: template,
                target,
                source: ContentSource::Template,
            };
        };

        let context = PromptContext {
            target,
            tone,
            gaps: gaps.clone(),
            template: template.clone(),
        };

        match self.generate(generator.as_ref(), &context).await {
            Ok(text) => {
                debug!(generator = generator.name(), target = target.label(), "Using generated nudge text");
                NudgeContent {
                    text,
                    target,
                    source: ContentSource::Generated,
                }
            }
            Err(err) => {
                warn!(
                    generator = generator.name(),
                    target = target.label(),
                    "Text generation failed, using template: {}",
                    err
                );
                NudgeContent {
                    text: template,
                    target,
                    source: ContentSource::Template,
                }
            }
        }
    }

    async fn generate(
        &self,
        generator: &dyn TextGenerator,
        context: &PromptContext,
    ) -> Result<String, GenerationError> {
        let text = timeout(self.generation_timeout, generator.generate(context))
            .await
            .map_err(|_| GenerationError::Timeout)??;

        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gap::Gap;
    use async_trait::async_trait;

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _context: &PromptContext) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "FixedGenerator"
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _context: &PromptContext) -> Result<String, GenerationError> {
            Err(GenerationError::Unavailable("down for maintenance".to_string()))
        }

        fn name(&self) -> &str {
            "FailingGenerator"
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        async fn generate(&self, _context: &PromptContext) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }

        fn name(&self) -> &str {
            "SlowGenerator"
        }
    }

    fn report(entries: &[(Quantity, Gap)]) -> GapReport {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_largest_gap_wins() {
        let gaps = report(&[
            (Quantity::Steps, Gap::Known(3000)),
            (Quantity::Water, Gap::Known(3500)),
            (Quantity::Sleep, Gap::Unknown),
        ]);
        let target = select_target(&gaps, &Goals::default(), &Quantity::ALL);
        assert_eq!(
            target,
            NudgeTarget::Quantity {
                quantity: Quantity::Water,
                gap: 3500,
                goal: 2500,
            }
        );
    }

    #[test]
    fn test_ties_follow_priority() {
        let gaps = report(&[
            (Quantity::Steps, Gap::Known(100)),
            (Quantity::Water, Gap::Known(100)),
            (Quantity::Sleep, Gap::Known(100)),
        ]);
        let target = select_target(&gaps, &Goals::default(), &Quantity::ALL);
        assert_eq!(target.label(), "steps");

        let sleep_first = [Quantity::Sleep, Quantity::Water];
        let target = select_target(&gaps, &Goals::default(), &sleep_first);
        assert_eq!(target.label(), "sleep");
    }

    #[test]
    fn test_all_zero_or_unknown_is_check_in() {
        let gaps = report(&[
            (Quantity::Steps, Gap::Known(0)),
            (Quantity::Water, Gap::Unknown),
        ]);
        assert_eq!(
            select_target(&gaps, &Goals::default(), &Quantity::ALL),
            NudgeTarget::CheckIn
        );
        assert_eq!(
            select_target(&GapReport::default(), &Goals::default(), &Quantity::ALL),
            NudgeTarget::CheckIn
        );
    }

    #[tokio::test]
    async fn test_template_only_selector() {
        let selector = ContentSelector::default();
        let gaps = report(&[(Quantity::Steps, Gap::Known(3000))]);

        let content = selector.select(&gaps, &Goals::default(), Tone::Gentle).await;
        assert_eq!(content.source, ContentSource::Template);
        assert_eq!(content.target.label(), "steps");
        assert!(content.text.contains("3000"));
    }

    #[tokio::test]
    async fn test_generated_text_used_when_available() {
        let selector = ContentSelector::default()
            .with_generator(Arc::new(FixedGenerator("  Time for a walk!  ")), Duration::from_secs(1));
        let gaps = report(&[(Quantity::Steps, Gap::Known(3000))]);

        let content = selector.select(&gaps, &Goals::default(), Tone::Fun).await;
        assert_eq!(content.source, ContentSource::Generated);
        assert_eq!(content.text, "Time for a walk!");
    }

    #[tokio::test]
    async fn test_generator_failure_falls_back() {
        let selector = ContentSelector::default()
            .with_generator(Arc::new(FailingGenerator), Duration::from_secs(1));

        let content = selector
            .select(&GapReport::default(), &Goals::default(), Tone::Gentle)
            .await;
        assert_eq!(content.source, ContentSource::Template);
        assert_eq!(content.target, NudgeTarget::CheckIn);
        assert!(!content.text.is_empty());
    }

    #[tokio::test]
    async fn test_blank_generation_falls_back() {
        let selector = ContentSelector::default()
            .with_generator(Arc::new(FixedGenerator("   ")), Duration::from_secs(1));

        let content = selector
            .select(&GapReport::default(), &Goals::default(), Tone::Coachy)
            .await;
        assert_eq!(content.source, ContentSource::Template);
        assert!(!content.text.trim().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generator_timeout_falls_back() {
        let selector = ContentSelector::default()
            .with_generator(Arc::new(SlowGenerator), Duration::from_secs(2));
        let gaps = report(&[(Quantity::Sleep, Gap::Known(60))]);

        let content = selector.select(&gaps, &Goals::default(), Tone::Gentle).await;
        assert_eq!(content.source, ContentSource::Template);
        assert!(content.text.contains("1h"));
    }
}
