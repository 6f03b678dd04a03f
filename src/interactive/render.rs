//! Chat redisplay after each turn

use std::io::Write;

use crate::pipeline::{Message, Role, StateRecord};
use crate::workflow::WorkflowKind;

/// Shows the conversation once a turn has finished
pub trait Renderer: Send + Sync {
    fn render(&self, messages: &[Message], state: &StateRecord);
}

/// Clears the terminal and prints the whole chat
pub struct TerminalRenderer {
    clear_screen: bool,
}

impl TerminalRenderer {
    pub fn new(clear_screen: bool) -> Self {
        Self { clear_screen }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, messages: &[Message], state: &StateRecord) {
        let mut out = std::io::stdout().lock();
        if self.clear_screen {
            let _ = write!(out, "\x1b[2J\x1b[H");
        }
        let _ = writeln!(out, "{}", format_chat(messages, state));
        let _ = out.flush();
    }
}

fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    }
}

/// Plain-text rendering of the chat
///
/// Earlier messages are listed as they are. The latest exchange (from the
/// last user message on) also shows the workflow's intermediate artifacts
/// before the final response.
pub fn format_chat(messages: &[Message], state: &StateRecord) -> String {
    let mut out = String::from("\n=== Chat History ===\n-------------------\n");

    let latest = messages
        .iter()
        .rposition(|m| m.role == Role::User)
        .unwrap_or(0);
    let (earlier, exchange) = messages.split_at(latest);

    for message in earlier {
        out.push_str(&format!("\n{}:\n{}\n", speaker(message.role), message.content));
    }

    let final_index = exchange.iter().rposition(|m| m.role == Role::Assistant);
    for (i, message) in exchange.iter().enumerate() {
        if Some(i) != final_index {
            out.push_str(&format!("\n{}:\n{}\n", speaker(message.role), message.content));
            continue;
        }

        push_panels(&mut out, state);
        out.push_str(&format!("\nFinal Response:\n{}\n", message.content));
    }

    out.push_str("\n-------------------");
    out
}

fn push_panels(out: &mut String, state: &StateRecord) {
    let artifacts = &state.artifacts;
    match state.workflow_kind {
        WorkflowKind::Research => {
            if let Some(findings) = &artifacts.research_findings {
                out.push_str(&format!("\nResearch Findings:\n{}\n", findings));
            }
            if let Some(analysis) = &artifacts.analysis {
                out.push_str(&format!("\nAnalysis:\n{}\n", analysis));
            }
        }
        WorkflowKind::Image => {
            if let Some(prompt) = &artifacts.enhanced_prompt {
                out.push_str(&format!("\nEnhanced Prompt:\n{}\n", prompt));
            }
            if let Some(images) = &artifacts.images {
                out.push_str("\nImage Generated:\n");
                for path in &images.paths {
                    out.push_str(&format!("Saved to: {}\n", path));
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Parameters;

    #[test]
    fn test_research_panels_before_final_response() {
        let history = vec![Message::user("first"), Message::assistant("first answer")];
        let mut state = StateRecord::new(WorkflowKind::Research, &history, "tides?", Parameters::None);
        state.artifacts.research_findings = Some("moon".to_string());
        state.artifacts.analysis = Some("gravity".to_string());
        state.say("Tides come from the moon.");

        let text = format_chat(&state.messages, &state);
        let findings = text.find("Research Findings:\nmoon").unwrap();
        let analysis = text.find("Analysis:\ngravity").unwrap();
        let answer = text.find("Final Response:\nTides come from the moon.").unwrap();
        assert!(text.find("You:\nfirst").unwrap() < findings);
        assert!(findings < analysis && analysis < answer);
        assert!(text.contains("Assistant:\nfirst answer"));
    }

    #[test]
    fn test_intermediate_messages_precede_final() {
        let mut state = StateRecord::new(WorkflowKind::Image, &[], "cat", Parameters::None);
        state.say("You rejected the suggested prompt 3 times, so I used the last one.");
        state.say("Image generated and saved as: out/image_1.png");

        let text = format_chat(&state.messages, &state);
        let note = text.find("Assistant:\nYou rejected").unwrap();
        let last = text.find("Final Response:\nImage generated").unwrap();
        assert!(note < last);
    }
}
