//! The state record threaded through a pipeline run
//!
//! One `StateRecord` exists per turn. It carries:
//! - The conversation so far plus the new user message
//! - The turn's extracted parameters (read-only for stages)
//! - Artifacts written by stages for their successors
//! - A trace of which stages ran and how they ended

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::params::Parameters;
use super::stage::StageId;
use crate::workflow::WorkflowKind;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single conversation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Overall status of the turn's task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet started
    Pending,
    /// Pipeline is running
    InProgress,
    /// Terminal stage reached without degradation
    Done,
    /// At least one stage degraded
    Failed,
}

/// How a stage ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// Stage did its work
    Completed,
    /// Stage hit a recoverable problem and explained it to the user
    Degraded,
}

/// Trace entry for one executed stage
#[derive(Debug, Clone, Serialize)]
pub struct StageTrace {
    pub stage: StageId,
    pub outcome: StageOutcome,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Reason when degraded
    pub note: Option<String>,
}

/// Keys addressing the artifacts a stage may produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKey {
    ResearchFindings,
    Analysis,
    EnhancedPrompt,
    GeneratedImages,
    Summaries,
    CodeExplanation,
    Translation,
    GrammarAnalysis,
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKey::ResearchFindings => "research_findings",
            ArtifactKey::Analysis => "analysis",
            ArtifactKey::EnhancedPrompt => "enhanced_prompt",
            ArtifactKey::GeneratedImages => "generated_images",
            ArtifactKey::Summaries => "summaries",
            ArtifactKey::CodeExplanation => "code_explanation",
            ArtifactKey::Translation => "translation",
            ArtifactKey::GrammarAnalysis => "grammar_analysis",
        };
        f.write_str(name)
    }
}

/// Requested or produced summary length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
}

impl SummaryLength {
    pub fn name(&self) -> &'static str {
        match self {
            SummaryLength::Short => "short",
            SummaryLength::Medium => "medium",
            SummaryLength::Long => "long",
        }
    }
}

impl fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The three summary variants produced in one pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryVariants {
    pub short: String,
    pub medium: String,
    pub long: String,
}

impl SummaryVariants {
    pub fn get(&self, length: SummaryLength) -> &str {
        match length {
            SummaryLength::Short => &self.short,
            SummaryLength::Medium => &self.medium,
            SummaryLength::Long => &self.long,
        }
    }
}

/// Images written by the image generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageArtifact {
    /// One path per generated sample
    pub paths: Vec<String>,
    /// Prompt the images were generated from
    pub prompt: String,
}

/// Result of a translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub source_language: String,
    pub target_language: String,
    pub original_text: String,
    pub translated_text: String,
}

/// Result of a grammar check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarAnalysis {
    pub original_text: String,
    pub analysis: String,
    pub check_type: String,
}

/// Typed artifact slots, one per [`ArtifactKey`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    pub research_findings: Option<String>,
    pub analysis: Option<String>,
    pub enhanced_prompt: Option<String>,
    pub images: Option<ImageArtifact>,
    pub summaries: Option<SummaryVariants>,
    pub code_explanation: Option<String>,
    pub translation: Option<TranslationRecord>,
    pub grammar_analysis: Option<GrammarAnalysis>,
}

impl Artifacts {
    /// Check whether an artifact has been written
    pub fn has(&self, key: ArtifactKey) -> bool {
        match key {
            ArtifactKey::ResearchFindings => self.research_findings.is_some(),
            ArtifactKey::Analysis => self.analysis.is_some(),
            ArtifactKey::EnhancedPrompt => self.enhanced_prompt.is_some(),
            ArtifactKey::GeneratedImages => self.images.is_some(),
            ArtifactKey::Summaries => self.summaries.is_some(),
            ArtifactKey::CodeExplanation => self.code_explanation.is_some(),
            ArtifactKey::Translation => self.translation.is_some(),
            ArtifactKey::GrammarAnalysis => self.grammar_analysis.is_some(),
        }
    }
}

/// State threaded through a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct StateRecord {
    /// Unique id for this turn
    pub run_id: String,
    /// Full conversation including the new user message
    pub messages: Vec<Message>,
    /// Workflow that owns this record
    pub workflow_kind: WorkflowKind,
    /// Overall task status
    pub task_status: TaskStatus,
    /// Turn parameters from the extractor
    pub parameters: Parameters,
    /// Stage outputs
    pub artifacts: Artifacts,
    /// Executed stages, in order
    pub trace: Vec<StageTrace>,
}

impl StateRecord {
    /// Build the initial state for a turn
    pub fn new(
        workflow_kind: WorkflowKind,
        history: &[Message],
        user_text: impl Into<String>,
        parameters: Parameters,
    ) -> Self {
        let mut messages = history.to_vec();
        messages.push(Message::user(user_text));

        Self {
            run_id: Uuid::new_v4().to_string(),
            messages,
            workflow_kind,
            task_status: TaskStatus::InProgress,
            parameters,
            artifacts: Artifacts::default(),
            trace: Vec::new(),
        }
    }

    /// Content of the most recent user message
    pub fn last_user_text(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    /// Append an assistant message
    pub fn say(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Mutable access to the last message if it came from the assistant
    pub fn last_assistant_mut(&mut self) -> Option<&mut Message> {
        self.messages
            .last_mut()
            .filter(|m| m.role == Role::Assistant)
    }

    /// Explain a recoverable problem to the user and mark the task failed
    pub fn degrade(&mut self, stage: StageId, user_message: impl Into<String>, note: &str) {
        self.say(user_message);
        self.task_status = TaskStatus::Failed;
        self.trace.push(StageTrace {
            stage,
            outcome: StageOutcome::Degraded,
            started_at: Utc::now(),
            completed_at: Utc::now(),
            note: Some(note.to_string()),
        });
    }

    /// Whether a stage already recorded a degradation this run
    pub fn degraded(&self, stage: StageId) -> bool {
        self.trace
            .iter()
            .any(|t| t.stage == stage && t.outcome == StageOutcome::Degraded)
    }

    /// Summary line for logging
    pub fn summary(&self) -> String {
        let stages: Vec<String> = self
            .trace
            .iter()
            .map(|t| match t.outcome {
                StageOutcome::Completed => t.stage.to_string(),
                StageOutcome::Degraded => format!("{}(degraded)", t.stage),
            })
            .collect();
        format!(
            "{} run {}: {:?} [{}]",
            self.workflow_kind,
            self.run_id,
            self.task_status,
            stages.join(" → ")
        )
    }
}
