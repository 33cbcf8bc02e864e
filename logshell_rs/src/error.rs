//! Error taxonomy for the shell core.
//!
//! User-input problems (unknown tokens, malformed flags) are reported inline
//! by the prompt and never abort the event loop. Programmer errors surface as
//! [`ShellError::Internal`] and trigger the localized recovery path in the
//! prompt controller. Only genuine fatals (terminal/logger startup) propagate
//! out of `main`.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors produced by the shell core.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A path token did not match any child, alias, or builtin.
    #[error("unknown command \"{token}\" under \"{location}\"{}", fmt_hint(.hint))]
    UnknownToken {
        /// The offending token as typed.
        token: String,
        /// Name of the node the resolver was at when it gave up.
        location: String,
        /// Closest sibling name, if one scored well enough.
        hint: Option<String>,
    },

    /// `help` appeared somewhere other than the front of the line.
    #[error("help must be of the form \"help <path>\" or \"<path> --help\"")]
    MisplacedHelp,

    /// Shell-style quoting ran off the end of the line.
    #[error("unterminated quote in input")]
    UnterminatedQuote,

    /// Invalid tree construction (duplicate sibling name/alias, bad parent).
    #[error("command tree: {0}")]
    Tree(String),

    /// Malformed flag input, user-facing.
    #[error("{0}")]
    Flag(String),

    /// Broken internal invariant; the prompt attempts recovery once.
    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ShellError {
    /// Shorthand for an internal invariant violation.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

fn fmt_hint(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!(" (did you mean \"{h}\"?)"),
        None => String::new(),
    }
}
