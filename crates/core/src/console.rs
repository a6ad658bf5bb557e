//! Operator interaction: menus and prompts.

use std::{
    collections::VecDeque,
    io::{BufRead, Write},
};

use anyhow::{Context, Result};

/// Line-oriented interaction with the operator.
pub trait Console {
    /// Print one line.
    fn say(&mut self, line: &str);

    /// Show `prompt` and read one line of input, without the line terminator.
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Like [`Console::ask`], but the typed text is not echoed.
    fn ask_secret(&mut self, prompt: &str) -> Result<String>;
}

/// The process terminal: stdout for output, stdin for input.
#[derive(Debug, Default)]
pub struct Terminal;

impl Console for Terminal {
    fn say(&mut self, line: &str) {
        println!("{}", line);
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{}", prompt).context("Failed to write prompt")?;
        stdout.flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        if read == 0 {
            anyhow::bail!("Input closed");
        }

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<String> {
        rpassword::prompt_password(prompt).context("Failed to read hidden input")
    }
}

/// Replays prepared answers and records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    /// Every line printed and every prompt shown, in order.
    pub transcript: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: vec![],
        }
    }

    /// Answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next_answer(&mut self, prompt: &str) -> Result<String> {
        self.transcript.push(prompt.to_string());
        self.answers.pop_front().context("Input closed")
    }
}

impl Console for ScriptedConsole {
    fn say(&mut self, line: &str) {
        self.transcript.push(line.to_string());
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.next_answer(prompt)
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<String> {
        self.next_answer(prompt)
    }
}
