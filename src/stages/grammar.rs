//! Grammar checker stage

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::pipeline::{ArtifactKey, CheckType, GrammarAnalysis, Stage, StageId, StateRecord};
use crate::provider::{GenerationRequest, TextGenerator};
use crate::Result;

fn instruction(check: CheckType) -> &'static str {
    match check {
        CheckType::Grammar => "Check for grammatical errors and provide corrections.",
        CheckType::Style => {
            "Analyze writing style and suggest improvements for clarity and impact."
        }
        CheckType::Tone => "Evaluate the tone and suggest adjustments for the intended audience.",
        CheckType::All => "Provide a comprehensive analysis of grammar, style, and tone.",
    }
}

/// Reviews text for grammar, style or tone
pub struct GrammarChecker {
    text: Arc<dyn TextGenerator>,
}

impl GrammarChecker {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }
}

#[async_trait]
impl Stage for GrammarChecker {
    fn id(&self) -> StageId {
        StageId::GrammarChecker
    }

    fn writes(&self) -> &'static [ArtifactKey] {
        &[ArtifactKey::GrammarAnalysis]
    }

    async fn apply(&self, mut state: StateRecord) -> Result<StateRecord> {
        let input = state.last_user_text().to_string();
        let check = state
            .parameters
            .grammar()
            .map(|p| p.check_type)
            .unwrap_or_default();

        if input.trim().is_empty() {
            state.degrade(
                self.id(),
                "Please provide some text to check, e.g. --tone Their going to the store.",
                "empty input",
            );
            return Ok(state);
        }

        let prompt = format!(
            "Analyze this text and {}\n\
             Text: {}\n\n\
             Provide:\n\
             1. Identified issues\n\
             2. Suggested corrections\n\
             3. Overall improvement recommendations\n\
             4. Revised version of the text",
            instruction(check),
            input
        );

        match self.text.generate(GenerationRequest::new(prompt, 500)).await {
            Ok(analysis) => {
                state.say(analysis.clone());
                state.artifacts.grammar_analysis = Some(GrammarAnalysis {
                    original_text: input,
                    analysis,
                    check_type: check.name().to_string(),
                });
            }
            Err(e) => {
                warn!("Grammar check failed: {}", e);
                state.degrade(
                    self.id(),
                    "Sorry, I encountered an error while checking the text. Please try again.",
                    &e.to_string(),
                );
            }
        }
        Ok(state)
    }
}
