//! Terminal styling helpers

use owo_colors::{OwoColorize, Style};
use std::fmt::Display;

pub const CHECK: &str = "✓";
pub const CROSS: &str = "✗";

/// Semantic styles for CLI output
///
/// Colors are stripped by `anstream` when stdout is not a terminal.
pub trait Stylize: Display + Sized {
    fn styled(&self, style: Style) -> String {
        format!("{}", self.style(style))
    }

    fn emphasis(&self) -> String {
        self.styled(Style::new().bold())
    }

    fn accent(&self) -> String {
        self.styled(Style::new().cyan())
    }

    fn muted(&self) -> String {
        self.styled(Style::new().dimmed())
    }

    fn success(&self) -> String {
        self.styled(Style::new().green())
    }

    fn warn(&self) -> String {
        self.styled(Style::new().yellow())
    }

    fn error(&self) -> String {
        self.styled(Style::new().red().bold())
    }
}

impl<T: Display> Stylize for T {}

pub fn check() -> String {
    CHECK.success()
}

pub fn cross() -> String {
    CROSS.error()
}
