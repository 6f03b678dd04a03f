//! Conduit: an interactive multi-workflow assistant
//!
//! The user picks a task workflow (research, image generation, summarizing,
//! code explanation, translation, grammar checking) and then exchanges turns
//! with it. Every turn runs one typed stage pipeline:
//!
//! ```text
//! raw input
//!     │
//!     ▼
//! ┌──────────────┐   clean text + typed parameters
//! │  extractor   │──────────────────────────────┐
//! └──────────────┘                              ▼
//!                               ┌──────────────────────────────┐
//!  conversation store ─────────▶│ StateRecord                  │
//!                               │  stage → stage → … → output  │
//!                               └──────────────┬───────────────┘
//!                                              ▼
//!                                 post-processor → store → render
//! ```
//!
//! Stages talk to the outside world only through the [`provider`] traits, the
//! [`images::ImageStore`] and the [`interactive::Prompter`] console.

pub mod config;
pub mod conversation;
pub mod extract;
pub mod images;
pub mod interactive;
pub mod pipeline;
pub mod postprocess;
pub mod provider;
pub mod stages;
pub mod workflow;

// Re-exports for convenience
pub use config::Config;
pub use conversation::ConversationStore;
pub use interactive::{Session, SessionState, TurnOutcome};
pub use pipeline::{PipelineDefinition, PipelineError, Stage, StageId, StateRecord};
pub use workflow::{WorkflowKind, WorkflowRegistry};

/// Crate-level error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Console error: {0}")]
    Console(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
