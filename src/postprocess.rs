//! Workflow-specific rewriting of the final message

use tracing::debug;

use crate::pipeline::{Parameters, StateRecord};
use crate::workflow::WorkflowKind;

/// Apply post-run adjustments to a finished state
///
/// Only the summarizer has one: when the turn asked for a specific length and
/// summaries were produced, the closing message shows that variant instead.
pub fn finalize(kind: WorkflowKind, mut state: StateRecord, parameters: &Parameters) -> StateRecord {
    if kind != WorkflowKind::Summary {
        return state;
    }

    let Some(length) = parameters.summary().and_then(|p| p.length) else {
        return state;
    };
    let Some(text) = state
        .artifacts
        .summaries
        .as_ref()
        .map(|s| s.get(length).to_string())
    else {
        return state;
    };

    if let Some(message) = state.last_assistant_mut() {
        debug!("Showing {} summary", length);
        message.content = format!("Here's the {} summary:\n\n{}", length, text);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{SummaryLength, SummaryParams, SummaryVariants};

    fn summarized(hint: Option<SummaryLength>) -> (StateRecord, Parameters) {
        let params = Parameters::Summary(SummaryParams { length: hint });
        let mut state = StateRecord::new(WorkflowKind::Summary, &[], "long text", params.clone());
        state.artifacts.summaries = Some(SummaryVariants {
            short: "S".to_string(),
            medium: "M".to_string(),
            long: "L".to_string(),
        });
        state.say("Here's a summary:\n\nM");
        (state, params)
    }

    #[test]
    fn test_rewrites_with_requested_length() {
        let (state, params) = summarized(Some(SummaryLength::Long));
        let state = finalize(WorkflowKind::Summary, state, &params);
        assert_eq!(
            state.messages.last().unwrap().content,
            "Here's the long summary:\n\nL"
        );
        assert_eq!(state.messages.len(), 2);
    }

    #[test]
    fn test_no_hint_leaves_message() {
        let (state, params) = summarized(None);
        let state = finalize(WorkflowKind::Summary, state, &params);
        assert_eq!(state.messages.last().unwrap().content, "Here's a summary:\n\nM");
    }

    #[test]
    fn test_missing_artifact_leaves_message() {
        let params = Parameters::Summary(SummaryParams {
            length: Some(SummaryLength::Short),
        });
        let mut state = StateRecord::new(WorkflowKind::Summary, &[], "hi", params.clone());
        state.say("The provided text is too short to summarize meaningfully.");

        let state = finalize(WorkflowKind::Summary, state, &params);
        assert_eq!(
            state.messages.last().unwrap().content,
            "The provided text is too short to summarize meaningfully."
        );
    }

    #[test]
    fn test_other_workflows_untouched() {
        let mut state = StateRecord::new(WorkflowKind::Code, &[], "x = 1", Parameters::None);
        state.say("assigns one");
        let state = finalize(WorkflowKind::Code, state, &Parameters::None);
        assert_eq!(state.messages.last().unwrap().content, "assigns one");
    }
}
