//! Code explainer stage

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::pipeline::{ArtifactKey, Stage, StageId, StateRecord};
use crate::provider::{GenerationRequest, TextGenerator};
use crate::Result;

const MAX_TOKENS: u32 = 500;

static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:\w+)?\n(.*?)```").expect("Invalid code block regex"));

// Checked in order; the first hint found decides
const LANGUAGE_HINTS: &[(&str, &str)] = &[
    ("def ", "Python"),
    ("function ", "JavaScript"),
    ("class ", "Object-Oriented Code"),
    ("import ", "Python"),
    ("console.", "JavaScript"),
    ("print", "Python"),
    ("var ", "JavaScript"),
    ("let ", "JavaScript"),
    ("const ", "JavaScript"),
];

/// Fenced code blocks in `input`, or the whole input when there are none
pub fn extract_code_blocks(input: &str) -> Vec<&str> {
    let blocks: Vec<&str> = CODE_BLOCK
        .captures_iter(input)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    if blocks.is_empty() {
        vec![input]
    } else {
        blocks
    }
}

/// Best-effort language guess from keyword hints
pub fn detect_language(code: &str) -> &'static str {
    LANGUAGE_HINTS
        .iter()
        .find(|(hint, _)| code.contains(hint))
        .map(|(_, language)| *language)
        .unwrap_or("Code")
}

/// Explains each code block in the user's message
pub struct CodeExplainer {
    text: Arc<dyn TextGenerator>,
}

impl CodeExplainer {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }

    async fn explain(&self, input: &str) -> Result<String> {
        let mut explanations = Vec::new();
        for block in extract_code_blocks(input) {
            let language = detect_language(block);
            debug!("Explaining {} block ({} bytes)", language, block.len());

            let prompt = format!(
                "Analyze this {language} code and provide:\n\
                 1. A high-level overview of what the code does\n\
                 2. Key components and their purposes\n\
                 3. Potential improvements or best practices\n\
                 4. Any security considerations\n\n\
                 Code:\n{block}"
            );
            explanations.push(
                self.text
                    .generate(GenerationRequest::new(prompt, MAX_TOKENS))
                    .await?,
            );
        }
        Ok(explanations.join("\n\n"))
    }
}

#[async_trait]
impl Stage for CodeExplainer {
    fn id(&self) -> StageId {
        StageId::CodeExplainer
    }

    fn writes(&self) -> &'static [ArtifactKey] {
        &[ArtifactKey::CodeExplanation]
    }

    async fn apply(&self, mut state: StateRecord) -> Result<StateRecord> {
        let input = state.last_user_text().to_string();

        match self.explain(&input).await {
            Ok(explanation) => {
                state.say(explanation.clone());
                state.artifacts.code_explanation = Some(explanation);
            }
            Err(e) => {
                warn!("Code explanation failed: {}", e);
                state.degrade(
                    self.id(),
                    format!("I encountered an error while analyzing the code: {}", e),
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
    use crate::pipeline::Parameters;
    use crate::stages::testing::FakeText;
    use crate::workflow::WorkflowKind;

    #[test]
    fn test_extract_blocks() {
        let input = "look:\n```python\nprint(1)\n```\nand\n```\nlet x = 2;\n```";
        assert_eq!(extract_code_blocks(input), vec!["print(1)\n", "let x = 2;\n"]);
        assert_eq!(extract_code_blocks("x = 1"), vec!["x = 1"]);
    }

    #[test]
    fn test_detect_language_order() {
        assert_eq!(detect_language("def f():\n  print(1)"), "Python");
        assert_eq!(detect_language("class A { function b() {} }"), "JavaScript");
        assert_eq!(detect_language("class Foo:"), "Object-Oriented Code");
        assert_eq!(detect_language("const x = 1;"), "JavaScript");
        assert_eq!(detect_language("SELECT * FROM t;"), "Code");
    }

    #[tokio::test]
    async fn test_explains_each_block() {
        let text = Arc::new(FakeText::new(|req| {
            Ok(if req.prompt.contains("Python") {
                "python explanation".to_string()
            } else {
                "js explanation".to_string()
            })
        }));
        let input = "```py\nprint('a')\n```\n```js\nconsole.log('b')\n```";
        let state = StateRecord::new(WorkflowKind::Code, &[], input, Parameters::None);

        let state = CodeExplainer::new(text.clone()).apply(state).await.unwrap();
        assert_eq!(
            state.artifacts.code_explanation.as_deref(),
            Some("python explanation\n\njs explanation")
        );
        assert_eq!(text.requests().len(), 2);
        assert!(text.requests().iter().all(|r| r.max_tokens == 500));
    }
}
