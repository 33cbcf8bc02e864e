//! Terminal color utilities for shell output.
//!
//! Provides ANSI color codes and semantic helpers so prompt, help, and tree
//! rendering stay consistent. Honors `--no-color` and TTY detection.

use std::io::IsTerminal;

// ============================================================================
// ANSI Color Codes
// ============================================================================

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";

pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RESET: &str = "\x1b[0m";

// ============================================================================
// Color State
// ============================================================================

/// Terminal color mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ColorMode {
    /// Detect TTY and colorize if interactive.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use colors (for piping/CI).
    Never,
}

impl ColorMode {
    /// Parse a `--color <mode>` value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(Self::Auto),
            "always" => Some(Self::Always),
            "never" => Some(Self::Never),
            _ => None,
        }
    }
}

/// Determines if colors should be used based on ColorMode and terminal detection.
pub fn is_enabled(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal(),
    }
}

/// Colorizer that can be passed around to format functions.
#[derive(Clone, Copy, Debug)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            enabled: is_enabled(mode),
        }
    }

    /// A painter that never emits escape codes, for tests and file output.
    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    // === Semantic colors ===

    /// Error lines - RED
    pub fn error(&self, s: &str) -> String {
        self.wrap(s, RED)
    }

    /// Warnings, pending states - YELLOW
    pub fn warn(&self, s: &str) -> String {
        self.wrap(s, YELLOW)
    }

    /// Success, confirmations - GREEN
    pub fn ok(&self, s: &str) -> String {
        self.wrap(s, GREEN)
    }

    /// Navigation nodes in help/tree output - CYAN
    pub fn nav(&self, s: &str) -> String {
        self.wrap(s, CYAN)
    }

    /// Action nodes in help/tree output - GREEN
    pub fn action(&self, s: &str) -> String {
        self.wrap(s, GREEN)
    }

    /// The rendered pwd path in the prompt - MAGENTA
    pub fn path(&self, s: &str) -> String {
        self.wrap(s, MAGENTA)
    }

    /// Secondary text (suggestions, grandchildren bullets) - DIM
    pub fn dim(&self, s: &str) -> String {
        self.wrap(s, DIM)
    }

    pub fn bold(&self, s: &str) -> String {
        self.wrap(s, BOLD)
    }

    fn wrap(&self, s: &str, code: &str) -> String {
        if self.enabled {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_painter_passes_through() {
        let p = Painter::plain();
        assert_eq!(p.error("boom"), "boom");
        assert_eq!(p.nav("query"), "query");
    }

    #[test]
    fn always_mode_wraps() {
        let p = Painter::new(ColorMode::Always);
        assert!(p.error("boom").contains(RED));
        assert!(p.error("boom").ends_with(RESET));
    }

    #[test]
    fn color_mode_parse() {
        assert_eq!(ColorMode::parse("auto"), Some(ColorMode::Auto));
        assert_eq!(ColorMode::parse("never"), Some(ColorMode::Never));
        assert_eq!(ColorMode::parse("rainbow"), None);
    }
}
