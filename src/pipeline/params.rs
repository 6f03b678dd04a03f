//! Per-workflow turn parameters
//!
//! Parameters are produced once per turn by the extractor and never written by
//! stages. Only the variant matching the active workflow is ever populated.

use serde::Serialize;

use super::state::SummaryLength;

/// Default image edge length in pixels
pub const DEFAULT_IMAGE_SIZE: u32 = 512;
/// Largest accepted image edge length
pub const MAX_IMAGE_SIZE: u32 = 1024;
/// Largest accepted sample count
pub const MAX_SAMPLES: u32 = 4;

/// Image generation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageParams {
    /// Style preference (`style:<word>`)
    pub style: Option<String>,
    /// Number of images to generate, 1..=4
    pub samples: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            style: None,
            samples: 1,
            width: DEFAULT_IMAGE_SIZE,
            height: DEFAULT_IMAGE_SIZE,
        }
    }
}

/// Summarizer parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryParams {
    /// Length the user asked to see, if any
    pub length: Option<SummaryLength>,
}

/// Translation parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranslationParams {
    pub target_language: Option<String>,
}

/// Which aspect of the text the grammar checker looks at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Grammar,
    Style,
    Tone,
    #[default]
    All,
}

impl CheckType {
    pub fn name(&self) -> &'static str {
        match self {
            CheckType::Grammar => "grammar",
            CheckType::Style => "style",
            CheckType::Tone => "tone",
            CheckType::All => "all",
        }
    }
}

/// Grammar checker parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GrammarParams {
    pub check_type: CheckType,
}

/// Turn parameters, tagged by workflow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "workflow", rename_all = "snake_case")]
pub enum Parameters {
    /// Workflow takes no parameters
    #[default]
    None,
    Image(ImageParams),
    Summary(SummaryParams),
    Translation(TranslationParams),
    Grammar(GrammarParams),
}

impl Parameters {
    pub fn image(&self) -> Option<&ImageParams> {
        match self {
            Parameters::Image(p) => Some(p),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<&SummaryParams> {
        match self {
            Parameters::Summary(p) => Some(p),
            _ => None,
        }
    }

    pub fn translation(&self) -> Option<&TranslationParams> {
        match self {
            Parameters::Translation(p) => Some(p),
            _ => None,
        }
    }

    pub fn grammar(&self) -> Option<&GrammarParams> {
        match self {
            Parameters::Grammar(p) => Some(p),
            _ => None,
        }
    }
}
