//! Ambiguity detection and follow-up prompting.

use std::io::{self, BufRead, Write};

/// Phrases that mark a completion as ambiguous (matched case-insensitively).
pub const AMBIGUITY_PHRASES: [&str; 3] = ["unsure", "cannot determine", "ambiguous"];

pub const CLARIFICATION_PROMPT: &str = "Your request is ambiguous. Please provide more details: ";

/// Source of follow-up input.
pub trait Prompter {
    /// Show `message` and return the reply without its line terminator.
    fn prompt(&mut self, message: &str) -> io::Result<String>;
}

/// Prompts on stdout and reads one line from stdin.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn prompt(&mut self, message: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(message.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Detects ambiguous completions and asks for more detail.
#[derive(Debug, Default)]
pub struct ClarificationHandler<P> {
    prompter: P,
}

impl<P: Prompter> ClarificationHandler<P> {
    pub fn new(prompter: P) -> Self {
        Self { prompter }
    }

    /// True if `text` contains one of [`AMBIGUITY_PHRASES`].
    pub fn needs_clarification(text: &str) -> bool {
        let lower = text.to_lowercase();
        AMBIGUITY_PHRASES.iter().any(|phrase| lower.contains(phrase))
    }

    /// Ask for more detail and return the reply verbatim.
    pub fn request_clarification(&mut self) -> io::Result<String> {
        self.prompter.prompt(CLARIFICATION_PROMPT)
    }
}
