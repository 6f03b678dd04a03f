//! Menu choices and reserved words
//!
//! `quit`, `exit` and `clear` are recognized case-insensitively on every
//! turn, whatever workflow is active.

use crate::workflow::WorkflowKind;

/// Control actions available during a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Clear the conversation and stay in the workflow
    Clear,
    /// Leave the workflow and return to the menu
    Exit,
}

impl ControlAction {
    /// Parse a reserved word
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "clear" => Some(ControlAction::Clear),
            "quit" | "exit" => Some(ControlAction::Exit),
            _ => None,
        }
    }
}

/// Result of a menu selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    /// A workflow was activated
    Selected(WorkflowKind),
    /// The user chose to leave the program
    Exit,
    /// Unrecognized input; the menu is shown again
    Invalid,
}

impl MenuOutcome {
    /// Parse a menu choice by number or workflow name
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input == WorkflowKind::EXIT_CHOICE.to_string()
            || ControlAction::parse(input) == Some(ControlAction::Exit)
        {
            return MenuOutcome::Exit;
        }

        match input.parse::<WorkflowKind>() {
            Ok(kind) => MenuOutcome::Selected(kind),
            Err(_) => MenuOutcome::Invalid,
        }
    }
}

/// Lines of the workflow menu
pub fn menu_lines() -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "=== Select a Workflow ===".to_string(),
    ];
    for kind in WorkflowKind::ALL {
        lines.push(format!("{}. {}", kind.menu_number(), kind.title()));
    }
    lines.push(format!("{}. Exit", WorkflowKind::EXIT_CHOICE));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_words() {
        assert_eq!(ControlAction::parse(" QUIT "), Some(ControlAction::Exit));
        assert_eq!(ControlAction::parse("exit"), Some(ControlAction::Exit));
        assert_eq!(ControlAction::parse("Clear"), Some(ControlAction::Clear));
        assert_eq!(ControlAction::parse("clear the table"), None);
    }

    #[test]
    fn test_menu_choices() {
        assert_eq!(MenuOutcome::parse("1"), MenuOutcome::Selected(WorkflowKind::Research));
        assert_eq!(MenuOutcome::parse("grammar"), MenuOutcome::Selected(WorkflowKind::Grammar));
        assert_eq!(MenuOutcome::parse("7"), MenuOutcome::Exit);
        assert_eq!(MenuOutcome::parse("quit"), MenuOutcome::Exit);
        assert_eq!(MenuOutcome::parse("8"), MenuOutcome::Invalid);
        assert_eq!(MenuOutcome::parse(""), MenuOutcome::Invalid);
    }

    #[test]
    fn test_menu_lines() {
        let lines = menu_lines();
        assert!(lines.contains(&"2. Image Generator".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("7. Exit"));
    }
}
