//! Workflow kinds offered in the menu

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The task workflows a session can activate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Research,
    Image,
    Summary,
    Code,
    Translation,
    Grammar,
}

impl WorkflowKind {
    /// All kinds, in menu order
    pub const ALL: [WorkflowKind; 6] = [
        WorkflowKind::Research,
        WorkflowKind::Image,
        WorkflowKind::Summary,
        WorkflowKind::Code,
        WorkflowKind::Translation,
        WorkflowKind::Grammar,
    ];

    /// Menu number of the "exit" entry
    pub const EXIT_CHOICE: usize = Self::ALL.len() + 1;

    pub fn name(&self) -> &'static str {
        match self {
            WorkflowKind::Research => "research",
            WorkflowKind::Image => "image",
            WorkflowKind::Summary => "summary",
            WorkflowKind::Code => "code",
            WorkflowKind::Translation => "translation",
            WorkflowKind::Grammar => "grammar",
        }
    }

    /// Title shown in the menu
    pub fn title(&self) -> &'static str {
        match self {
            WorkflowKind::Research => "Research Assistant",
            WorkflowKind::Image => "Image Generator",
            WorkflowKind::Summary => "Text Summarizer",
            WorkflowKind::Code => "Code Explainer",
            WorkflowKind::Translation => "Translator",
            WorkflowKind::Grammar => "Grammar Checker",
        }
    }

    /// 1-based menu number
    pub fn menu_number(&self) -> usize {
        Self::ALL
            .iter()
            .position(|k| k == self)
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Kind for a 1-based menu number
    pub fn from_menu_number(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i)).copied()
    }

    /// Usage hints printed when the workflow is activated
    pub fn tips(&self) -> &'static [&'static str] {
        match self {
            WorkflowKind::Research => &["Ask a question and the assistant will research, analyze and write up an answer."],
            WorkflowKind::Image => &[
                "Use 'style:TYPE' to set a style (e.g. style:watercolor)",
                "Use 'samples:N' for multiple images (max 4)",
                "Use 'size:WxH' to set dimensions (e.g. size:768x512, max 1024)",
            ],
            WorkflowKind::Summary => &[
                "Paste the text you want summarized.",
                "Type 'short' or 'long' after the text to see different lengths",
            ],
            WorkflowKind::Code => &["Paste code, optionally in ``` fenced blocks, to get an explanation."],
            WorkflowKind::Translation => &[
                "Format: text to translate | target language",
                "Example: Hello, how are you? | Spanish",
            ],
            WorkflowKind::Grammar => &[
                "--grammar: Grammar only",
                "--style: Writing style",
                "--tone: Tone analysis",
                "No flag runs all checks.",
            ],
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorkflowKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        if let Ok(n) = lowered.parse::<usize>() {
            return Self::from_menu_number(n)
                .ok_or_else(|| Error::Config(format!("No workflow numbered {}", n)));
        }

        match lowered.as_str() {
            "research" => Ok(WorkflowKind::Research),
            "image" | "images" => Ok(WorkflowKind::Image),
            "summary" | "summarizer" | "summarize" => Ok(WorkflowKind::Summary),
            "code" | "code_explainer" => Ok(WorkflowKind::Code),
            "translation" | "translator" | "translate" => Ok(WorkflowKind::Translation),
            "grammar" | "grammar_checker" => Ok(WorkflowKind::Grammar),
            _ => Err(Error::Config(format!("Unknown workflow: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_numbers_round_trip() {
        for kind in WorkflowKind::ALL {
            assert_eq!(WorkflowKind::from_menu_number(kind.menu_number()), Some(kind));
        }
        assert_eq!(WorkflowKind::from_menu_number(0), None);
        assert_eq!(WorkflowKind::from_menu_number(WorkflowKind::EXIT_CHOICE), None);
        assert_eq!(WorkflowKind::EXIT_CHOICE, 7);
    }

    #[test]
    fn test_parse_names_and_numbers() {
        assert_eq!("Translator".parse::<WorkflowKind>().unwrap(), WorkflowKind::Translation);
        assert_eq!("2".parse::<WorkflowKind>().unwrap(), WorkflowKind::Image);
        assert!("playlist".parse::<WorkflowKind>().is_err());
        assert!("9".parse::<WorkflowKind>().is_err());
    }
}
