//! Pipeline definitions and their validating builder

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::error::PipelineError;
use super::stage::{Stage, StageId};
use super::state::ArtifactKey;
use crate::workflow::WorkflowKind;

/// An ordered, validated list of stages for one workflow
///
/// Definitions are immutable once built and can be shared across turns.
pub struct PipelineDefinition {
    pub(crate) kind: WorkflowKind,
    pub(crate) stages: Vec<Arc<dyn Stage>>,
    pub(crate) terminal: StageId,
}

impl PipelineDefinition {
    pub fn builder(kind: WorkflowKind) -> PipelineBuilder {
        PipelineBuilder::new(kind)
    }

    pub fn kind(&self) -> WorkflowKind {
        self.kind
    }

    pub fn terminal(&self) -> StageId {
        self.terminal
    }

    /// Stage ids in execution order
    pub fn stage_ids(&self) -> Vec<StageId> {
        self.stages.iter().map(|s| s.id()).collect()
    }
}

impl std::fmt::Debug for PipelineDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineDefinition")
            .field("kind", &self.kind)
            .field("stages", &self.stage_ids())
            .field("terminal", &self.terminal)
            .finish()
    }
}

/// Builder for [`PipelineDefinition`]
///
/// `build` rejects duplicate stage ids, two writers for one artifact, reads of
/// artifacts that no earlier stage writes, and a terminal that is not among
/// the stages.
pub struct PipelineBuilder {
    kind: WorkflowKind,
    stages: Vec<Arc<dyn Stage>>,
    terminal: StageId,
}

impl PipelineBuilder {
    pub fn new(kind: WorkflowKind) -> Self {
        Self {
            kind,
            stages: Vec::new(),
            terminal: StageId::Output,
        }
    }

    /// Append a stage
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Append an already shared stage
    pub fn shared_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Override the terminal stage (defaults to [`StageId::Output`])
    pub fn terminal(mut self, terminal: StageId) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn build(self) -> Result<PipelineDefinition, PipelineError> {
        let kind = self.kind;
        let mut seen = HashSet::new();
        let mut writers: HashMap<ArtifactKey, StageId> = HashMap::new();

        for stage in &self.stages {
            let id = stage.id();
            if !seen.insert(id) {
                return Err(PipelineError::DuplicateStage { kind, stage: id });
            }

            for &artifact in stage.reads() {
                if !writers.contains_key(&artifact) {
                    return Err(PipelineError::UnresolvedRead {
                        kind,
                        stage: id,
                        artifact,
                    });
                }
            }

            for &artifact in stage.writes() {
                if let Some(&first) = writers.get(&artifact) {
                    return Err(PipelineError::DuplicateArtifact {
                        kind,
                        artifact,
                        first,
                        second: id,
                    });
                }
                writers.insert(artifact, id);
            }
        }

        if !seen.contains(&self.terminal) {
            return Err(PipelineError::IncompleteDefinition {
                kind,
                terminal: self.terminal,
            });
        }

        Ok(PipelineDefinition {
            kind,
            stages: self.stages,
            terminal: self.terminal,
        })
    }
}
