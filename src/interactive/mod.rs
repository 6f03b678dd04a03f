//! Interactive session system
//!
//! Provides the terminal front end:
//! - Workflow menu and reserved words (`quit`, `exit`, `clear`)
//! - Line console, with a scripted variant for tests
//! - Chat redisplay after each turn
//! - Signal handling (Ctrl+C interrupts the running turn)

pub mod commands;
pub mod console;
pub mod render;
pub mod session;
pub mod signals;

pub use commands::{menu_lines, ControlAction, MenuOutcome};
pub use console::{require_line, Prompter, ScriptedPrompter, StdinPrompter};
pub use render::{format_chat, Renderer, TerminalRenderer};
pub use session::{Session, SessionState, TurnOutcome};
pub use signals::{install_panic_handler, InterruptSignal, SignalHandler};
