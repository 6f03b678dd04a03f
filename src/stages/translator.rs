//! Translator stage
//!
//! Detects the source language first and skips the translation when the text
//! is already in the target language.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::pipeline::{ArtifactKey, Stage, StageId, StateRecord, TranslationRecord};
use crate::provider::{GenerationRequest, TextGenerator};
use crate::Result;

pub const DEFAULT_TARGET: &str = "English";

/// Detects the source language and translates into the target
pub struct Translator {
    text: Arc<dyn TextGenerator>,
}

enum Translation {
    AlreadyInTarget,
    Done(TranslationRecord),
}

impl Translator {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }

    async fn translate(&self, input: &str, target: &str) -> Result<Translation> {
        let source = self
            .text
            .generate(
                GenerationRequest::new(format!("Detect the language of this text: {}", input), 50)
                    .temperature(0.3),
            )
            .await?;
        debug!("Detected source language: {}", source);

        if !source.is_empty() && target.to_lowercase().contains(&source.to_lowercase()) {
            return Ok(Translation::AlreadyInTarget);
        }

        let prompt = format!(
            "Translate this text from {source} to {target}:\n\
             Original: {input}\n\n\
             Provide:\n\
             1. Translation\n\
             2. Any cultural context or notes\n\
             3. Alternative expressions if applicable"
        );
        let translated = self.text.generate(GenerationRequest::new(prompt, 500)).await?;

        Ok(Translation::Done(TranslationRecord {
            source_language: source,
            target_language: target.to_string(),
            original_text: input.to_string(),
            translated_text: translated,
        }))
    }
}

#[async_trait]
impl Stage for Translator {
    fn id(&self) -> StageId {
        StageId::Translator
    }

    fn writes(&self) -> &'static [ArtifactKey] {
        &[ArtifactKey::Translation]
    }

    async fn apply(&self, mut state: StateRecord) -> Result<StateRecord> {
        let input = state.last_user_text().to_string();
        let target = state
            .parameters
            .translation()
            .and_then(|p| p.target_language.clone())
            .unwrap_or_else(|| DEFAULT_TARGET.to_string());

        if input.trim().is_empty() {
            state.degrade(
                self.id(),
                "Please provide some text to translate, e.g. Hello, how are you? | Spanish",
                "empty input",
            );
            return Ok(state);
        }

        match self.translate(&input, &target).await {
            Ok(Translation::AlreadyInTarget) => {
                state.say(format!("The text is already in {}.", target));
            }
            Ok(Translation::Done(record)) => {
                state.say(format!(
                    "Translation ({} → {}):\n\n{}",
                    record.source_language, record.target_language, record.translated_text
                ));
                state.artifacts.translation = Some(record);
            }
            Err(e) => {
                warn!("Translation failed: {}", e);
                state.degrade(
                    self.id(),
                    "Sorry, I encountered an error while translating. Please try again.",
                    &e.to_string(),
                );
            }
        }
        Ok(state)
    }
}
