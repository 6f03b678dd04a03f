//! Pipeline error types

use thiserror::Error;

use super::stage::StageId;
use super::state::{ArtifactKey, StateRecord};
use crate::workflow::WorkflowKind;

/// Errors from building or running a pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage returned an error; the remaining stages were not run
    #[error("stage '{stage}' failed: {cause}")]
    Stage {
        stage: StageId,
        #[source]
        cause: Box<crate::Error>,
        /// State as it was when the failing stage was entered
        state: Box<StateRecord>,
    },

    /// The terminal stage is not part of the definition
    #[error("{kind} pipeline is incomplete: terminal stage '{terminal}' is not defined")]
    IncompleteDefinition {
        kind: WorkflowKind,
        terminal: StageId,
    },

    /// Two stages share a name
    #[error("{kind} pipeline defines stage '{stage}' twice")]
    DuplicateStage { kind: WorkflowKind, stage: StageId },

    /// Two stages claim the same artifact
    #[error("{kind} pipeline: artifact '{artifact}' is written by both '{first}' and '{second}'")]
    DuplicateArtifact {
        kind: WorkflowKind,
        artifact: ArtifactKey,
        first: StageId,
        second: StageId,
    },

    /// A stage reads an artifact nothing before it writes
    #[error("{kind} pipeline: stage '{stage}' reads '{artifact}' which no earlier stage writes")]
    UnresolvedRead {
        kind: WorkflowKind,
        stage: StageId,
        artifact: ArtifactKey,
    },

    /// A stage dropped or rewrote earlier messages
    #[error("stage '{stage}' rewrote conversation history")]
    HistoryRewritten { stage: StageId },
}

impl PipelineError {
    /// Stage the error is attributed to, if any
    pub fn stage(&self) -> Option<StageId> {
        match self {
            PipelineError::Stage { stage, .. }
            | PipelineError::DuplicateStage { stage, .. }
            | PipelineError::UnresolvedRead { stage, .. }
            | PipelineError::HistoryRewritten { stage } => Some(*stage),
            PipelineError::IncompleteDefinition { terminal, .. } => Some(*terminal),
            PipelineError::DuplicateArtifact { second, .. } => Some(*second),
        }
    }
}
