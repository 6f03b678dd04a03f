//! Stage trait and stage identifiers

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use super::state::{ArtifactKey, StateRecord};
use crate::Result;

/// Identifies a stage within a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Researcher,
    Analyzer,
    Writer,
    PromptEnhancer,
    ImageGenerator,
    Summarizer,
    CodeExplainer,
    Translator,
    GrammarChecker,
    /// Terminal pass-through stage shared by every workflow
    Output,
    /// Stage defined outside this crate
    Custom(&'static str),
}

impl StageId {
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Researcher => "researcher",
            StageId::Analyzer => "analyzer",
            StageId::Writer => "writer",
            StageId::PromptEnhancer => "prompt_enhancer",
            StageId::ImageGenerator => "image_generator",
            StageId::Summarizer => "summarizer",
            StageId::CodeExplainer => "code_explainer",
            StageId::Translator => "translator",
            StageId::GrammarChecker => "grammar_checker",
            StageId::Output => "output",
            StageId::Custom(name) => name,
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One unit of work in a pipeline
///
/// A stage receives the state by value and hands it back. Problems the user
/// can act on (provider errors, unusable input) should be reported with
/// [`StateRecord::degrade`] and a normal return, so later stages still run.
/// Returning `Err` aborts the rest of the pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage identifier, unique within a pipeline
    fn id(&self) -> StageId;

    /// Artifacts this stage consumes; each must be written by an earlier stage
    fn reads(&self) -> &'static [ArtifactKey] {
        &[]
    }

    /// Artifacts this stage produces
    fn writes(&self) -> &'static [ArtifactKey] {
        &[]
    }

    /// Run the stage
    async fn apply(&self, state: StateRecord) -> Result<StateRecord>;
}
