//! Line-oriented console used by the session loop and interactive stages

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::{Error, Result};

/// Reads user lines and shows system text
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Show `prompt` and read one line; `None` at end of input
    async fn read_line(&self, prompt: &str) -> Result<Option<String>>;

    /// Show a line of system text
    fn say(&self, text: &str);
}

/// Console on the process's stdin/stdout
#[derive(Clone)]
pub struct StdinPrompter {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl StdinPrompter {
    pub fn new() -> Self {
        let reader = BufReader::new(tokio::io::stdin());
        Self {
            lines: Arc::new(Mutex::new(reader.lines())),
        }
    }
}

impl Default for StdinPrompter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompter for StdinPrompter {
    async fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        print!("{}", prompt);
        let _ = std::io::stdout().flush();

        let mut lines = self.lines.lock().await;
        lines
            .next_line()
            .await
            .map_err(|e| Error::Console(format!("failed to read input: {}", e)))
    }

    fn say(&self, text: &str) {
        println!("{}", text);
    }
}

/// Console that replays scripted input and records everything shown
#[derive(Default)]
pub struct ScriptedPrompter {
    inputs: StdMutex<VecDeque<String>>,
    output: StdMutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: StdMutex::new(inputs.into_iter().map(Into::into).collect()),
            output: StdMutex::new(Vec::new()),
        }
    }

    /// Queue more input
    pub fn push(&self, line: impl Into<String>) {
        self.inputs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(line.into());
    }

    /// Everything shown so far, prompts included
    pub fn transcript(&self) -> Vec<String> {
        self.output.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of scripted lines not yet read
    pub fn remaining(&self) -> usize {
        self.inputs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        self.say(prompt);
        Ok(self
            .inputs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front())
    }

    fn say(&self, text: &str) {
        self.output
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(text.to_string());
    }
}

/// Read a line, treating end of input as an error
pub async fn require_line(console: &dyn Prompter, prompt: &str) -> Result<String> {
    console
        .read_line(prompt)
        .await?
        .map(|line| line.trim().to_string())
        .ok_or_else(|| Error::Console("input closed".to_string()))
}
