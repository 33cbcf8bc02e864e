//! # logshell
//!
//! Interactive administrative shell for a remote log-analytics backend.
//!
//! One binary, two faces:
//!
//! - **One-shot**: `logsh macros list --format csv` resolves the path,
//!   runs the leaf, prints, exits.
//! - **Interactive**: `logsh` starts the prompt; navigate the command tree
//!   like directories, run actions, page history.
//!
//! ## Architecture
//!
//! ```text
//! keystrokes ──▶ Prompt ──▶ builtin ─────────────▶ effect (print/clear/quit)
//!                  │
//!                  └──▶ Walk ──▶ navigation ─────▶ pwd moves, suggestions rebuild
//!                         │
//!                         └────▶ action ─────────▶ Handoff: the ActionModel
//!                                                  drives updates/views until
//!                                                  Done, then the prompt
//!                                                  takes the screen back
//! ```
//!
//! The command tree ([`tree`]) is an arena of navigations and actions built
//! once at startup; [`walk`] resolves input lines against it; [`action`]
//! defines the model contract plus the generic scaffolds (basic, list,
//! create, edit, delete); [`prompt`] owns the event loop; [`backend`] is the
//! contract the scaffolds consume, with an in-process implementation for
//! tests and the demo profile.

pub mod action;
pub mod backend;
pub mod builtins;
pub mod cli;
pub mod colors;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod prompt;
pub mod tree;
pub mod walk;

pub use error::ShellError;
