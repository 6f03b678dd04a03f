//! Typed stage pipelines
//!
//! A pipeline is an ordered list of [`Stage`]s that each take a
//! [`StateRecord`] and hand back an updated one. Definitions are validated
//! when built, and executed with [`PipelineDefinition::run`].

mod definition;
mod error;
mod executor;
mod params;
mod stage;
mod state;

pub use definition::{PipelineBuilder, PipelineDefinition};
pub use error::PipelineError;
pub use params::{
    CheckType, GrammarParams, ImageParams, Parameters, SummaryParams, TranslationParams,
    DEFAULT_IMAGE_SIZE, MAX_IMAGE_SIZE, MAX_SAMPLES,
};
pub use stage::{Stage, StageId};
pub use state::{
    ArtifactKey, Artifacts, GrammarAnalysis, ImageArtifact, Message, Role, StageOutcome,
    StageTrace, StateRecord, SummaryLength, SummaryVariants, TaskStatus, TranslationRecord,
};
