//! Uniform classification of kill inputs.
//!
//! Every surface (the prompt, standalone action drivers) consults this one
//! decision point so Ctrl-C/Ctrl-D and Escape behave the same everywhere.

use crossterm::event::{KeyCode, KeyModifiers};

use crate::action::Event;

/// How an input wants to kill things.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kill {
    None,
    /// Terminates the program in Prompting mode, the child in Handoff.
    Global,
    /// Terminates only a running child; no-op otherwise.
    Child,
}

/// Classify an event. Ctrl-C and Ctrl-D are global kills, Escape is a
/// child kill, everything else is not a kill at all.
pub fn check_kill_keys(event: &Event) -> Kill {
    let Event::Key(key) = event else {
        return Kill::None;
    };
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d'))
    {
        return Kill::Global;
    }
    if key.code == KeyCode::Esc {
        return Kill::Child;
    }
    Kill::None
}
