//! ANSI styling for terminal reports
//!
//! Escape-code styling via a small extension trait, plus a [`Palette`] that
//! switches styling off when output is not a terminal.

use std::fmt;

mod codes {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIMMED: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const BRIGHT_RED: &str = "\x1b[91m";
    pub const BRIGHT_GREEN: &str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
}

/// Text wrapped in ANSI escape codes
#[derive(Clone)]
pub struct StyledString {
    content: String,
    styles: Vec<&'static str>,
}

impl StyledString {
    fn with_style(mut self, style: &'static str) -> Self {
        self.styles.push(style);
        self
    }

    pub fn bold(self) -> Self {
        self.with_style(codes::BOLD)
    }
    pub fn dimmed(self) -> Self {
        self.with_style(codes::DIMMED)
    }
    pub fn cyan(self) -> Self {
        self.with_style(codes::CYAN)
    }
    pub fn bright_red(self) -> Self {
        self.with_style(codes::BRIGHT_RED)
    }
    pub fn bright_green(self) -> Self {
        self.with_style(codes::BRIGHT_GREEN)
    }
    pub fn bright_yellow(self) -> Self {
        self.with_style(codes::BRIGHT_YELLOW)
    }
}

impl fmt::Display for StyledString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for style in &self.styles {
            f.write_str(style)?;
        }
        f.write_str(&self.content)?;
        f.write_str(codes::RESET)
    }
}

/// Color methods on string types
pub trait Colorize {
    fn to_styled(&self) -> StyledString;

    fn bold(&self) -> StyledString {
        self.to_styled().bold()
    }
    fn dimmed(&self) -> StyledString {
        self.to_styled().dimmed()
    }
    fn cyan(&self) -> StyledString {
        self.to_styled().cyan()
    }
    fn bright_red(&self) -> StyledString {
        self.to_styled().bright_red()
    }
    fn bright_green(&self) -> StyledString {
        self.to_styled().bright_green()
    }
    fn bright_yellow(&self) -> StyledString {
        self.to_styled().bright_yellow()
    }
}

impl Colorize for str {
    fn to_styled(&self) -> StyledString {
        StyledString {
            content: self.to_string(),
            styles: Vec::new(),
        }
    }
}

impl Colorize for String {
    fn to_styled(&self) -> StyledString {
        self.as_str().to_styled()
    }
}

/// Report styling that degrades to plain text
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Styled when stdout is a terminal
    pub fn for_stdout() -> Self {
        use std::io::IsTerminal;
        Self::new(std::io::stdout().is_terminal())
    }

    fn paint(&self, text: &str, style: impl FnOnce(&str) -> StyledString) -> String {
        if self.enabled {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn failure(&self, text: &str) -> String {
        self.paint(text, |t| t.bright_red().bold())
    }

    pub fn success(&self, text: &str) -> String {
        self.paint(text, |t| t.bright_green())
    }

    pub fn warning(&self, text: &str) -> String {
        self.paint(text, |t| t.bright_yellow())
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint(text, |t| t.cyan().bold())
    }

    pub fn detail(&self, text: &str) -> String {
        self.paint(text, |t| t.dimmed())
    }
}
