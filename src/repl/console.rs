use std::collections::VecDeque;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

/// The operator console: one prompt-and-read per iteration, plain text out.
///
/// Trait object so the interactive loop can run against a real terminal or
/// a scripted transcript.
pub trait Console {
    /// Read one line. `None` means end of input (EOF or interrupt) and is
    /// treated like an empty line by callers.
    fn read_line(&mut self, prompt: &str) -> Option<String>;

    fn write_line(&mut self, text: &str);
}

/// Terminal console backed by rustyline, with history.
pub struct StdConsole {
    editor: DefaultEditor,
}

impl StdConsole {
    pub fn new() -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl Console for StdConsole {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let _ = self.editor.add_history_entry(line.as_str());
                Some(line)
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => None,
            Err(e) => {
                warn!("console read failed: {}", e);
                None
            }
        }
    }

    fn write_line(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Deterministic console for tests and non-interactive runs: reads from a
/// prepared transcript, records everything written.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    input: VecDeque<String>,
    pub output: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            input: lines.into_iter().map(Into::into).collect(),
            output: Vec::new(),
        }
    }

    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, _prompt: &str) -> Option<String> {
        self.input.pop_front()
    }

    fn write_line(&mut self, text: &str) {
        self.output.push(text.to_string());
    }
}
