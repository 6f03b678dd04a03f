//! Interactive session controller
//!
//! Drives the menu, the per-turn pipeline runs and the reserved words, and
//! owns the conversation store for the active workflow.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::conversation::ConversationStore;
use crate::extract::extract;
use crate::pipeline::{Message, StateRecord, TaskStatus};
use crate::postprocess::finalize;
use crate::workflow::{WorkflowKind, WorkflowRegistry};
use crate::{Error, Result};

use super::commands::{menu_lines, ControlAction, MenuOutcome};
use super::console::Prompter;
use super::render::Renderer;
use super::signals::InterruptSignal;

const MENU_PROMPT: &str = "\nEnter your choice: ";
const TURN_PROMPT: &str = "\nYou: ";

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Showing the workflow menu
    NoWorkflowSelected,
    /// Exchanging turns with a workflow
    WorkflowActive(WorkflowKind),
}

/// What a single turn did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input, nothing ran
    Skipped,
    /// History cleared, workflow still active
    Cleared,
    /// Returned to the menu
    Left,
    /// Pipeline finished with the given status
    Completed(TaskStatus),
    /// Pipeline raised an error; workflow still active
    Failed(String),
    /// Ctrl+C during the turn; returned to the menu
    Interrupted,
}

/// Raw console input, or the reason there is none
enum Input {
    Line(String),
    Eof,
    Interrupted,
}

/// Interactive session controller
pub struct Session {
    /// Pipelines for every workflow
    registry: Arc<WorkflowRegistry>,
    /// History of the active workflow
    store: ConversationStore,
    /// Current session state
    state: SessionState,
    console: Arc<dyn Prompter>,
    renderer: Box<dyn Renderer>,
    /// Raised by the signal handler
    interrupts: Arc<InterruptSignal>,
    /// Set on a double Ctrl+C
    shutdown_flag: Arc<AtomicBool>,
}

impl Session {
    pub fn new(
        registry: Arc<WorkflowRegistry>,
        console: Arc<dyn Prompter>,
        renderer: Box<dyn Renderer>,
        max_history: usize,
    ) -> Self {
        Self {
            registry,
            store: ConversationStore::new(max_history),
            state: SessionState::NoWorkflowSelected,
            console,
            renderer,
            interrupts: Arc::new(InterruptSignal::new()),
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the interrupt signal (for the signal handler)
    pub fn interrupts(&self) -> Arc<InterruptSignal> {
        self.interrupts.clone()
    }

    /// Get the shutdown flag (for the signal handler)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown_flag.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &[Message] {
        self.store.messages()
    }

    /// Run the session loop until exit, end of input or shutdown
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting interactive session");
        self.print_system("Welcome to conduit! Pick a workflow to get started.");

        loop {
            if self.shutdown_flag.load(Ordering::SeqCst) {
                info!("Shutdown requested");
                break;
            }

            match self.state {
                SessionState::NoWorkflowSelected => {
                    for line in menu_lines() {
                        self.print_system(&line);
                    }
                    match self.read_input(MENU_PROMPT).await? {
                        Input::Line(line) => {
                            if self.select(&line) == MenuOutcome::Exit {
                                self.print_system("Goodbye!");
                                break;
                            }
                        }
                        Input::Interrupted => {
                            if self.shutdown_flag.load(Ordering::SeqCst) {
                                break;
                            }
                            self.print_system("\nPress Ctrl+C again to exit");
                        }
                        Input::Eof => break,
                    }
                }
                SessionState::WorkflowActive(_) => match self.read_input(TURN_PROMPT).await? {
                    Input::Line(line) => {
                        let outcome = self.handle_turn(&line).await?;
                        debug!("Turn outcome: {:?}", outcome);
                    }
                    Input::Interrupted => {
                        self.reset();
                        self.print_system("\nReturning to workflow selection...");
                    }
                    Input::Eof => break,
                },
            }
        }

        info!("Session ended");
        Ok(())
    }

    /// Apply a menu choice
    pub fn select(&mut self, choice: &str) -> MenuOutcome {
        let outcome = MenuOutcome::parse(choice);
        match outcome {
            MenuOutcome::Selected(kind) => self.activate(kind),
            MenuOutcome::Invalid => self.print_error(&format!(
                "Invalid choice. Please select 1-{}.",
                WorkflowKind::EXIT_CHOICE
            )),
            MenuOutcome::Exit => {}
        }
        outcome
    }

    /// Enter a workflow with an empty history
    pub fn activate(&mut self, kind: WorkflowKind) {
        info!("Activated {} workflow", kind);
        self.state = SessionState::WorkflowActive(kind);
        self.store.clear();

        self.print_system(&format!("\nActivated {}", kind.title()));
        for tip in kind.tips() {
            self.print_system(&format!("  • {}", tip));
        }
        self.print_system(
            "Type 'quit' or 'exit' to return to workflow selection, 'clear' to clear history",
        );
    }

    /// Handle one line of input for the active workflow
    pub async fn handle_turn(&mut self, line: &str) -> Result<TurnOutcome> {
        let SessionState::WorkflowActive(kind) = self.state else {
            return Err(Error::Console("no workflow selected".to_string()));
        };

        let input = line.trim();
        if input.is_empty() {
            return Ok(TurnOutcome::Skipped);
        }

        if let Some(action) = ControlAction::parse(input) {
            return Ok(match action {
                ControlAction::Exit => {
                    self.reset();
                    self.print_system("Returning to workflow selection...");
                    TurnOutcome::Left
                }
                ControlAction::Clear => {
                    self.store.clear();
                    self.print_system("Conversation history cleared.");
                    TurnOutcome::Cleared
                }
            });
        }

        // An interrupt left over from the menu must not cancel this turn
        self.interrupts.clear();
        let interrupts = self.interrupts.clone();
        let result = tokio::select! {
            result = self.execute(kind, input) => Some(result),
            _ = interrupts.wait() => None,
        };

        match result {
            Some(Ok(state)) => {
                let status = state.task_status;
                debug!("Turn finished: {}", state.summary());
                self.store.replace(state.messages.clone());
                self.renderer.render(self.store.messages(), &state);
                Ok(TurnOutcome::Completed(status))
            }
            Some(Err(e)) => {
                error!("Turn failed: {}", e);
                self.print_error(&format!("An error occurred: {}", e));
                self.print_system("Please try again.");
                Ok(TurnOutcome::Failed(e.to_string()))
            }
            None => {
                warn!("Turn interrupted");
                self.reset();
                self.print_system("\nReturning to workflow selection...");
                Ok(TurnOutcome::Interrupted)
            }
        }
    }

    /// Extract, run the workflow's pipeline and post-process
    async fn execute(&self, kind: WorkflowKind, input: &str) -> Result<StateRecord> {
        let definition = self
            .registry
            .get(kind)
            .ok_or_else(|| Error::Config(format!("no pipeline registered for {}", kind)))?;

        let (text, parameters) = extract(input, kind);
        debug!("Extracted parameters: {:?}", parameters);

        let state = StateRecord::new(kind, self.store.messages(), text, parameters.clone());
        let state = definition.run(state).await?;
        Ok(finalize(kind, state, &parameters))
    }

    fn reset(&mut self) {
        self.state = SessionState::NoWorkflowSelected;
        self.store.clear();
    }

    async fn read_input(&self, prompt: &str) -> Result<Input> {
        let interrupts = self.interrupts.clone();
        tokio::select! {
            line = self.console.read_line(prompt) => Ok(match line? {
                Some(line) => Input::Line(line),
                None => Input::Eof,
            }),
            _ = interrupts.wait() => Ok(Input::Interrupted),
        }
    }

    fn print_system(&self, msg: &str) {
        self.console.say(msg);
    }

    fn print_error(&self, msg: &str) {
        self.console.say(&format!("Error: {}", msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::images::ImageStore;
    use crate::interactive::ScriptedPrompter;
    use crate::pipeline::Role;
    use crate::provider::{GenerationRequest, TextGenerator};
    use crate::stages::testing::{FakeImages, FakeText};
    use crate::stages::StageDeps;

    /// Counts renders
    struct CountingRenderer(Arc<Mutex<usize>>);

    impl Renderer for CountingRenderer {
        fn render(&self, _messages: &[Message], _state: &StateRecord) {
            *self.0.lock().unwrap() += 1;
        }
    }

    /// Never answers
    struct StalledText;

    #[async_trait]
    impl TextGenerator for StalledText {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn generate(&self, _request: GenerationRequest) -> Result<String> {
            std::future::pending().await
        }
    }

    struct Fixture {
        session: Session,
        console: Arc<ScriptedPrompter>,
        renders: Arc<Mutex<usize>>,
        _dir: tempfile::TempDir,
    }

    fn fixture(text: Arc<dyn TextGenerator>, inputs: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let console = Arc::new(ScriptedPrompter::new(inputs.iter().copied()));
        let deps = StageDeps {
            text,
            image: Arc::new(FakeImages::new()),
            images: Arc::new(ImageStore::new(dir.path())),
            console: console.clone(),
            refinement_attempts: 3,
        };
        let registry = Arc::new(WorkflowRegistry::build(&deps).unwrap());
        let renders = Arc::new(Mutex::new(0));
        let session = Session::new(
            registry,
            console.clone(),
            Box::new(CountingRenderer(renders.clone())),
            200,
        );
        Fixture {
            session,
            console,
            renders,
            _dir: dir,
        }
    }

    fn by_length() -> Arc<dyn TextGenerator> {
        Arc::new(FakeText::new(|r| {
            Ok(match r.max_tokens {
                100 => "S",
                200 => "M",
                _ => "L",
            }
            .to_string())
        }))
    }

    #[tokio::test]
    async fn test_turn_requires_workflow() {
        let mut f = fixture(by_length(), &[]);
        assert!(f.session.handle_turn("hello").await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_selection_keeps_menu() {
        let mut f = fixture(by_length(), &[]);
        assert_eq!(f.session.select("9"), MenuOutcome::Invalid);
        assert_eq!(f.session.state(), SessionState::NoWorkflowSelected);
        assert!(f
            .console
            .transcript()
            .iter()
            .any(|l| l.contains("Invalid choice")));
    }

    #[tokio::test]
    async fn test_summary_turns_and_length_hint() {
        let mut f = fixture(by_length(), &[]);
        f.session.select("3");

        let outcome = f
            .session
            .handle_turn("The quick brown fox jumps over the lazy dog")
            .await
            .unwrap();
        assert_eq!(outcome, TurnOutcome::Completed(TaskStatus::Done));
        let last = &f.session.history().last().unwrap().content;
        assert!(last.starts_with("Here's a summary:\n\nM"));

        f.session
            .handle_turn("Another fairly long passage of text long")
            .await
            .unwrap();
        let history = f.session.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[2].content, "Another fairly long passage of text");
        assert_eq!(history[3].content, "Here's the long summary:\n\nL");
        assert_eq!(*f.renders.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_translation_target_is_extracted() {
        let text = Arc::new(FakeText::new(|r| {
            Ok(if r.prompt.starts_with("Detect the language") {
                "English".to_string()
            } else {
                "Hola".to_string()
            })
        }));
        let mut f = fixture(text, &[]);
        f.session.select("translation");

        f.session.handle_turn("Hello there | Spanish").await.unwrap();
        let history = f.session.history();
        assert_eq!(history[0].content, "Hello there");
        assert_eq!(history[1].content, "Translation (English → Spanish):\n\nHola");
    }

    #[tokio::test]
    async fn test_clear_twice_keeps_workflow() {
        let mut f = fixture(by_length(), &[]);
        f.session.select("3");
        f.session
            .handle_turn("The quick brown fox jumps over the lazy dog")
            .await
            .unwrap();
        assert!(!f.session.history().is_empty());

        assert_eq!(f.session.handle_turn("clear").await.unwrap(), TurnOutcome::Cleared);
        assert_eq!(f.session.handle_turn("CLEAR").await.unwrap(), TurnOutcome::Cleared);
        assert!(f.session.history().is_empty());
        assert_eq!(
            f.session.state(),
            SessionState::WorkflowActive(WorkflowKind::Summary)
        );
    }

    #[tokio::test]
    async fn test_quit_returns_to_menu() {
        let mut f = fixture(by_length(), &[]);
        f.session.select("3");
        f.session
            .handle_turn("The quick brown fox jumps over the lazy dog")
            .await
            .unwrap();

        assert_eq!(f.session.handle_turn("Quit").await.unwrap(), TurnOutcome::Left);
        assert_eq!(f.session.state(), SessionState::NoWorkflowSelected);
        assert!(f.session.history().is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_is_skipped() {
        let mut f = fixture(by_length(), &[]);
        f.session.select("3");
        assert_eq!(f.session.handle_turn("   ").await.unwrap(), TurnOutcome::Skipped);
        assert_eq!(*f.renders.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pipeline_error_keeps_workflow_active() {
        // Image workflow asks questions; the script has no answers
        let mut f = fixture(by_length(), &[]);
        f.session.select("2");

        let outcome = f.session.handle_turn("a cat on a roof").await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Failed(_)));
        assert_eq!(
            f.session.state(),
            SessionState::WorkflowActive(WorkflowKind::Image)
        );
        assert!(f.session.history().is_empty());
        assert!(f
            .console
            .transcript()
            .iter()
            .any(|l| l.starts_with("Error: An error occurred")));
    }

    #[tokio::test]
    async fn test_interrupt_during_turn_returns_to_menu() {
        let mut f = fixture(Arc::new(StalledText), &[]);
        f.session.select("1");

        let signal = f.session.interrupts();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            signal.trigger();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            f.session.handle_turn("why is the sky blue?"),
        )
        .await
        .expect("turn was not interrupted")
        .unwrap();

        assert_eq!(outcome, TurnOutcome::Interrupted);
        assert_eq!(f.session.state(), SessionState::NoWorkflowSelected);
        assert!(f.session.history().is_empty());
    }

    #[tokio::test]
    async fn test_run_until_exit_choice() {
        let mut f = fixture(
            by_length(),
            &[
                "9",
                "3",
                "The quick brown fox jumps over the lazy dog",
                "exit",
                "7",
            ],
        );
        f.session.run().await.unwrap();

        let transcript = f.console.transcript();
        assert!(transcript.iter().any(|l| l.contains("Invalid choice")));
        assert!(transcript.iter().any(|l| l.contains("Activated Text Summarizer")));
        assert_eq!(transcript.last().map(String::as_str), Some("Goodbye!"));
        assert_eq!(*f.renders.lock().unwrap(), 1);
        assert_eq!(f.console.remaining(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_at_end_of_input() {
        let mut f = fixture(by_length(), &["4"]);
        f.session.run().await.unwrap();
        assert_eq!(
            f.session.state(),
            SessionState::WorkflowActive(WorkflowKind::Code)
        );
        assert!(f.session.history().iter().all(|m| m.role != Role::Assistant));
    }
}
