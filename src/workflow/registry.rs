//! Pipeline definitions for every workflow, built once at startup

use std::collections::HashMap;

use tracing::debug;

use super::kind::WorkflowKind;
use crate::pipeline::{PipelineDefinition, PipelineError};
use crate::stages::{
    Analyzer, CodeExplainer, GrammarChecker, ImageCreator, OutputStage, PromptEnhancer,
    Researcher, StageDeps, Summarizer, Translator, Writer,
};

/// Build the pipeline for one workflow
pub fn build_pipeline(
    kind: WorkflowKind,
    deps: &StageDeps,
) -> Result<PipelineDefinition, PipelineError> {
    let builder = PipelineDefinition::builder(kind);
    let builder = match kind {
        WorkflowKind::Research => builder
            .stage(Researcher::new(deps.text.clone()))
            .stage(Analyzer::new(deps.text.clone()))
            .stage(Writer::new(deps.text.clone())),
        WorkflowKind::Image => builder
            .stage(PromptEnhancer::new(
                deps.text.clone(),
                deps.console.clone(),
                deps.refinement_attempts,
            ))
            .stage(ImageCreator::new(deps.image.clone(), deps.images.clone())),
        WorkflowKind::Summary => builder.stage(Summarizer::new(deps.text.clone())),
        WorkflowKind::Code => builder.stage(CodeExplainer::new(deps.text.clone())),
        WorkflowKind::Translation => builder.stage(Translator::new(deps.text.clone())),
        WorkflowKind::Grammar => builder.stage(GrammarChecker::new(deps.text.clone())),
    };
    builder.stage(OutputStage).build()
}

/// Validated pipelines keyed by workflow
pub struct WorkflowRegistry {
    pipelines: HashMap<WorkflowKind, PipelineDefinition>,
}

impl WorkflowRegistry {
    /// Build every workflow's pipeline; any invalid definition is fatal
    pub fn build(deps: &StageDeps) -> Result<Self, PipelineError> {
        let mut pipelines = HashMap::new();
        for kind in WorkflowKind::ALL {
            let definition = build_pipeline(kind, deps)?;
            debug!("Built {} pipeline: {:?}", kind, definition.stage_ids());
            pipelines.insert(kind, definition);
        }
        Ok(Self { pipelines })
    }

    pub fn get(&self, kind: WorkflowKind) -> Option<&PipelineDefinition> {
        self.pipelines.get(&kind)
    }

    /// Definitions in menu order
    pub fn iter(&self) -> impl Iterator<Item = &PipelineDefinition> {
        WorkflowKind::ALL
            .into_iter()
            .filter_map(|kind| self.pipelines.get(&kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::images::ImageStore;
    use crate::interactive::ScriptedPrompter;
    use crate::pipeline::StageId;
    use crate::provider::{EchoGenerator, UnavailableImageGenerator};

    fn offline_deps() -> StageDeps {
        StageDeps {
            text: Arc::new(EchoGenerator),
            image: Arc::new(UnavailableImageGenerator),
            images: Arc::new(ImageStore::new(std::env::temp_dir().join("conduit-test-images"))),
            console: Arc::new(ScriptedPrompter::default()),
            refinement_attempts: 3,
        }
    }

    #[test]
    fn test_every_workflow_builds() {
        let registry = WorkflowRegistry::build(&offline_deps()).unwrap();
        assert_eq!(registry.iter().count(), WorkflowKind::ALL.len());

        let research = registry.get(WorkflowKind::Research).unwrap();
        assert_eq!(
            research.stage_ids(),
            vec![
                StageId::Researcher,
                StageId::Analyzer,
                StageId::Writer,
                StageId::Output
            ]
        );

        let image = registry.get(WorkflowKind::Image).unwrap();
        assert_eq!(
            image.stage_ids(),
            vec![StageId::PromptEnhancer, StageId::ImageGenerator, StageId::Output]
        );

        for kind in [
            WorkflowKind::Summary,
            WorkflowKind::Code,
            WorkflowKind::Translation,
            WorkflowKind::Grammar,
        ] {
            let definition = registry.get(kind).unwrap();
            assert_eq!(definition.stage_ids().len(), 2);
            assert_eq!(definition.terminal(), StageId::Output);
        }
    }
}
