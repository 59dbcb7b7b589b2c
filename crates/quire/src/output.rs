//! Human-facing messages on stderr.
//!
//! Logs go through `tracing`; this is only for the handful of lines a user
//! running `quire` in a terminal should always see.

use std::fmt::Display;

use console::{Style, Term};

#[derive(Clone, Copy)]
enum Tone {
    Plain,
    Good,
    Warn,
    Bad,
    Quiet,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Self::Plain => Style::new(),
            Self::Good => Style::new().green(),
            Self::Warn => Style::new().yellow(),
            Self::Bad => Style::new().red().bold(),
            Self::Quiet => Style::new().dim(),
        }
    }
}

/// Colored stderr writer.
pub(crate) struct Output {
    term: Term,
}

impl Output {
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    pub(crate) fn info(&self, msg: &str) {
        self.line(Tone::Plain, msg);
    }

    /// A `label: value` line with the label dimmed.
    pub(crate) fn field(&self, label: &str, value: impl Display) {
        let label = Tone::Quiet.style().apply_to(format!("{label}:"));
        self.write(&format!("{label} {value}"));
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(Tone::Good, msg);
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.line(Tone::Warn, msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(Tone::Bad, msg);
    }

    /// Secondary line, indented under the previous one.
    pub(crate) fn detail(&self, msg: &str) {
        self.line(Tone::Quiet, &format!("  {msg}"));
    }

    fn line(&self, tone: Tone, msg: &str) {
        self.write(&tone.style().apply_to(msg).to_string());
    }

    fn write(&self, text: &str) {
        // A closed stderr is not worth failing a build over
        let _ = self.term.write_line(text);
    }
}
