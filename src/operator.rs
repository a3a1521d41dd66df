//! Operator interaction.
//!
//! Everything the runner needs from the person at the console goes through
//! the [`Operator`] trait, so the pipeline can be driven by a script in tests.

use crate::error::{Result, SqlRunError};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Console capability used by the runner.
pub trait Operator {
    /// Asks a yes/no question. Only an explicit affirmative answer returns true.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;

    /// Reads one line of visible input.
    fn prompt(&mut self, prompt: &str) -> Result<String>;

    /// Reads one line of input without echoing it.
    fn prompt_secret(&mut self, prompt: &str) -> Result<String>;

    /// Shows a line of progress or status text.
    fn show(&mut self, text: &str);
}

/// Returns true if `input` is an affirmative answer (`y` or `yes`, any case).
pub fn is_affirmative(input: &str) -> bool {
    let answer = input.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// Operator backed by stdin/stdout.
#[derive(Debug, Default)]
pub struct ConsoleOperator;

impl ConsoleOperator {
    pub fn new() -> Self {
        Self
    }

    fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{prompt}").map_err(|e| SqlRunError::io(e.to_string()))?;
        stdout.flush().map_err(|e| SqlRunError::io(e.to_string()))?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| SqlRunError::io(e.to_string()))?;

        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl Operator for ConsoleOperator {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        // End of input counts as a decline.
        Ok(self
            .read_line(prompt)?
            .is_some_and(|answer| is_affirmative(&answer)))
    }

    fn prompt(&mut self, prompt: &str) -> Result<String> {
        self.read_line(prompt)?
            .ok_or_else(|| SqlRunError::io("Input closed while waiting for an answer"))
    }

    fn prompt_secret(&mut self, prompt: &str) -> Result<String> {
        rpassword::prompt_password(prompt)
            .map_err(|e| SqlRunError::io(format!("Failed to read password: {e}")))
    }

    fn show(&mut self, text: &str) {
        println!("{text}");
    }
}

/// Operator that replays canned answers and records everything it was asked and shown.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: VecDeque<String>,
    prompts: Vec<String>,
    shown: Vec<String>,
}

impl ScriptedOperator {
    /// Creates an operator that answers prompts in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
            shown: Vec::new(),
        }
    }

    /// Prompts asked so far, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Lines shown so far, in order.
    pub fn shown(&self) -> &[String] {
        &self.shown
    }

    fn next_answer(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front()
    }
}

impl Operator for ScriptedOperator {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Ok(self
            .next_answer(prompt)
            .is_some_and(|answer| is_affirmative(&answer)))
    }

    fn prompt(&mut self, prompt: &str) -> Result<String> {
        self.next_answer(prompt)
            .ok_or_else(|| SqlRunError::io("No scripted answer left"))
    }

    fn prompt_secret(&mut self, prompt: &str) -> Result<String> {
        self.prompt(prompt)
    }

    fn show(&mut self, text: &str) {
        self.shown.push(text.to_string());
    }
}
