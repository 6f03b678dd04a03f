//! Summarizer stage: short, medium and long variants

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::pipeline::{ArtifactKey, Stage, StageId, StateRecord, SummaryLength, SummaryVariants};
use crate::provider::{GenerationRequest, TextGenerator};
use crate::Result;

/// Inputs with fewer non-whitespace characters are not summarized
const MIN_CHARS: usize = 10;

pub const TOO_SHORT: &str = "The provided text is too short to summarize meaningfully.";

/// Produces short, medium and long summaries in one pass
pub struct Summarizer {
    text: Arc<dyn TextGenerator>,
}

impl Summarizer {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }

    async fn summarize(&self, input: &str, length: SummaryLength) -> Result<String> {
        let (max_tokens, manner) = match length {
            SummaryLength::Short => (100, "very concise"),
            SummaryLength::Medium => (200, "moderately detailed"),
            SummaryLength::Long => (300, "comprehensive"),
        };
        let prompt = format!(
            "Create a {length} summary of this text: {input}\n\
             Focus on the most important points and maintain coherence.\n\
             For a {length} summary, be {manner}."
        );
        self.text
            .generate(GenerationRequest::new(prompt, max_tokens))
            .await
    }

    async fn variants(&self, input: &str) -> Result<SummaryVariants> {
        Ok(SummaryVariants {
            short: self.summarize(input, SummaryLength::Short).await?,
            medium: self.summarize(input, SummaryLength::Medium).await?,
            long: self.summarize(input, SummaryLength::Long).await?,
        })
    }
}

#[async_trait]
impl Stage for Summarizer {
    fn id(&self) -> StageId {
        StageId::Summarizer
    }

    fn writes(&self) -> &'static [ArtifactKey] {
        &[ArtifactKey::Summaries]
    }

    async fn apply(&self, mut state: StateRecord) -> Result<StateRecord> {
        let input = state.last_user_text().to_string();
        let significant = input.chars().filter(|c| !c.is_whitespace()).count();
        if significant < MIN_CHARS {
            debug!("Input has {} significant characters, not summarizing", significant);
            state.degrade(self.id(), TOO_SHORT, "input too short");
            return Ok(state);
        }

        match self.variants(&input).await {
            Ok(variants) => {
                state.say(format!(
                    "Here's a summary:\n\n{}\n\n(Type 'short' or 'long' to see other summary lengths)",
                    variants.medium
                ));
                state.artifacts.summaries = Some(variants);
            }
            Err(e) => {
                warn!("Summarization failed: {}", e);
                state.degrade(
                    self.id(),
                    "I encountered an error while creating the summary. Please try again.",
                    &e.to_string(),
                );
            }
        }
        Ok(state)
    }
}
