//! Research workflow: researcher → analyzer → writer

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::pipeline::{ArtifactKey, Stage, StageId, StateRecord};
use crate::provider::{GenerationRequest, TextGenerator};
use crate::Result;

const MAX_TOKENS: u32 = 300;

/// Gathers key facts about the user's question
pub struct Researcher {
    text: Arc<dyn TextGenerator>,
}

impl Researcher {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }
}

#[async_trait]
impl Stage for Researcher {
    fn id(&self) -> StageId {
        StageId::Researcher
    }

    fn writes(&self) -> &'static [ArtifactKey] {
        &[ArtifactKey::ResearchFindings]
    }

    async fn apply(&self, mut state: StateRecord) -> Result<StateRecord> {
        let prompt = format!(
            "As a research agent, gather and summarize key information about: {}\n\
             Focus on collecting factual information and important details.",
            state.last_user_text()
        );

        match self.text.generate(GenerationRequest::new(prompt, MAX_TOKENS)).await {
            Ok(findings) => state.artifacts.research_findings = Some(findings),
            Err(e) => {
                warn!("Research failed: {}", e);
                state.degrade(
                    self.id(),
                    "I couldn't gather research on that topic, so this answer may be incomplete.",
                    &e.to_string(),
                );
            }
        }
        Ok(state)
    }
}

/// Draws conclusions from the research findings
pub struct Analyzer {
    text: Arc<dyn TextGenerator>,
}

impl Analyzer {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }
}

#[async_trait]
impl Stage for Analyzer {
    fn id(&self) -> StageId {
        StageId::Analyzer
    }

    fn reads(&self) -> &'static [ArtifactKey] {
        &[ArtifactKey::ResearchFindings]
    }

    fn writes(&self) -> &'static [ArtifactKey] {
        &[ArtifactKey::Analysis]
    }

    async fn apply(&self, mut state: StateRecord) -> Result<StateRecord> {
        let Some(findings) = state.artifacts.research_findings.as_deref() else {
            debug!("No research findings, skipping analysis");
            return Ok(state);
        };

        let prompt = format!(
            "As an analytical agent, analyze this research: {}\n\
             Identify patterns, implications, and draw meaningful conclusions.",
            findings
        );

        match self.text.generate(GenerationRequest::new(prompt, MAX_TOKENS)).await {
            Ok(analysis) => state.artifacts.analysis = Some(analysis),
            Err(e) => {
                warn!("Analysis failed: {}", e);
                state.degrade(
                    self.id(),
                    "I couldn't analyze the research, so the answer is based on the raw findings.",
                    &e.to_string(),
                );
            }
        }
        Ok(state)
    }
}

/// Composes the final answer from findings and analysis
pub struct Writer {
    text: Arc<dyn TextGenerator>,
}

impl Writer {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }
}

#[async_trait]
impl Stage for Writer {
    fn id(&self) -> StageId {
        StageId::Writer
    }

    fn reads(&self) -> &'static [ArtifactKey] {
        &[ArtifactKey::ResearchFindings, ArtifactKey::Analysis]
    }

    async fn apply(&self, mut state: StateRecord) -> Result<StateRecord> {
        let artifacts = &state.artifacts;
        let prompt = format!(
            "As a writing agent, create a well-structured response to: {}\n\
             Research: {}\n\
             Analysis: {}\n\
             Make it engaging and easy to understand.",
            state.last_user_text(),
            artifacts.research_findings.as_deref().unwrap_or("None"),
            artifacts.analysis.as_deref().unwrap_or("None"),
        );

        match self.text.generate(GenerationRequest::new(prompt, MAX_TOKENS)).await {
            Ok(answer) => state.say(answer),
            Err(e) => {
                warn!("Writing failed: {}", e);
                state.degrade(
                    self.id(),
                    "Sorry, I couldn't put together a response. Please try again.",
                    &e.to_string(),
                );
            }
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Parameters, Role, TaskStatus};
    use crate::stages::testing::FakeText;
    use crate::workflow::WorkflowKind;

    fn state() -> StateRecord {
        StateRecord::new(WorkflowKind::Research, &[], "coral reefs", Parameters::None)
    }

    #[tokio::test]
    async fn test_research_chain_fills_artifacts() {
        let text = Arc::new(FakeText::new(|req| {
            Ok(if req.prompt.starts_with("As a research agent") {
                "reefs are dying".to_string()
            } else if req.prompt.starts_with("As an analytical agent") {
                "warming is the cause".to_string()
            } else {
                "Final answer".to_string()
            })
        }));

        let state = Researcher::new(text.clone()).apply(state()).await.unwrap();
        let state = Analyzer::new(text.clone()).apply(state).await.unwrap();
        let state = Writer::new(text.clone()).apply(state).await.unwrap();

        assert_eq!(state.artifacts.research_findings.as_deref(), Some("reefs are dying"));
        assert_eq!(state.artifacts.analysis.as_deref(), Some("warming is the cause"));
        assert_eq!(state.messages.last().unwrap().content, "Final answer");
        assert_eq!(state.messages.last().unwrap().role, Role::Assistant);

        let requests = text.requests();
        assert!(requests.iter().all(|r| r.max_tokens == 300));
        assert!(requests[0].prompt.contains("coral reefs"));
        assert!(requests[2].prompt.contains("Research: reefs are dying"));
        assert!(requests[2].prompt.contains("Analysis: warming is the cause"));
    }

    #[tokio::test]
    async fn test_failed_research_degrades_and_writer_still_answers() {
        let failing = Arc::new(FakeText::failing());
        let writer_text = Arc::new(FakeText::constant("best effort"));

        let state = Researcher::new(failing.clone()).apply(state()).await.unwrap();
        assert_eq!(state.task_status, TaskStatus::Failed);
        assert!(state.degraded(StageId::Researcher));

        let state = Analyzer::new(failing.clone()).apply(state).await.unwrap();
        assert!(state.artifacts.analysis.is_none());
        assert_eq!(failing.requests().len(), 1);

        let state = Writer::new(writer_text.clone()).apply(state).await.unwrap();
        assert_eq!(state.messages.last().unwrap().content, "best effort");
        assert!(writer_text.requests()[0].prompt.contains("Research: None"));
    }
}
