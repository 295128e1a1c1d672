//! Line-oriented terminal output shared by the chat threads.

use std::io::{self, IsTerminal, Write};
use std::sync::{Mutex, PoisonError};

use crate::style::Style;

/// Sink for whole lines of chat output.
///
/// Each call writes one complete line, so lines from concurrent threads never
/// interleave mid-line.
pub trait ChatOutput: Send + Sync {
    fn write_line(&self, line: &str);

    fn style(&self) -> Style {
        Style::plain()
    }
}

/// Process stdout. Styled when stdout is a terminal.
#[derive(Debug, Clone, Copy)]
pub struct StdoutOutput {
    style: Style,
}

impl StdoutOutput {
    #[must_use]
    pub fn new() -> Self {
        Self {
            style: Style::new(io::stdout().is_terminal()),
        }
    }
}

impl Default for StdoutOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatOutput for StdoutOutput {
    fn write_line(&self, line: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{line}");
        let _ = stdout.flush();
    }

    fn style(&self) -> Style {
        self.style
    }
}

/// In-memory output that records every line, for tests and previews.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    lines: Mutex<Vec<String>>,
    style: Style,
}

impl RecordingOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn styled() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            style: Style::new(true),
        }
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Lines with blank separators removed.
    #[must_use]
    pub fn non_empty_lines(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| !line.is_empty())
            .collect()
    }
}

impl ChatOutput for RecordingOutput {
    fn write_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }

    fn style(&self) -> Style {
        self.style
    }
}
