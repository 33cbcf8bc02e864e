//! Input-line resolution: from a typed line to a target in the tree.
//!
//! [`walk`] tokenizes a shell-like line and descends from the caller's pwd,
//! honouring `..`, `~`/`/`, aliases, builtin names, and the flag boundary
//! (the first `-token` stops the descent; flags belong to the target).
//! Help requests are normalised into `help_mode` on the result.

use crate::error::ShellError;
use crate::tree::{CommandTree, NodeId};

/// Outcome of resolving one input line.
#[derive(Debug, Clone)]
pub struct WalkResult {
    /// Node at which traversal stopped.
    pub end: NodeId,
    /// Unconsumed tokens, original order preserved.
    pub remaining: Vec<String>,
    /// Builtin the line stopped on, if any.
    pub builtin: Option<String>,
    /// The line asked for help rather than execution.
    pub help_mode: bool,
}

/// Split a line into tokens with shell-like quoting. Single and double
/// quotes group words; a backslash escapes the next character.
pub fn tokenize(line: &str) -> Result<Vec<String>, ShellError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_current = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    has_current = true;
                }
                '\\' => {
                    match chars.next() {
                        Some(escaped) => current.push(escaped),
                        None => current.push('\\'),
                    }
                    has_current = true;
                }
                c if c.is_whitespace() => {
                    if has_current {
                        tokens.push(std::mem::take(&mut current));
                        has_current = false;
                    }
                }
                c => {
                    current.push(c);
                    has_current = true;
                }
            },
        }
    }
    if quote.is_some() {
        return Err(ShellError::UnterminatedQuote);
    }
    if has_current {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Resolve `line` relative to `pwd`.
pub fn walk(
    tree: &CommandTree,
    pwd: NodeId,
    line: &str,
    builtin_names: &[String],
) -> Result<WalkResult, ShellError> {
    let tokens = tokenize(line)?;
    walk_tokens(tree, pwd, &tokens, builtin_names)
}

/// Resolve already-tokenized input relative to `pwd`.
pub fn walk_tokens(
    tree: &CommandTree,
    pwd: NodeId,
    tokens: &[String],
    builtin_names: &[String],
) -> Result<WalkResult, ShellError> {
    let mut result = WalkResult {
        end: pwd,
        remaining: Vec::new(),
        builtin: None,
        help_mode: false,
    };

    let mut idx = 0;

    // A leading -h/--help asks for help on the pwd itself.
    if matches!(tokens.first().map(String::as_str), Some("-h") | Some("--help")) {
        result.help_mode = true;
        result.remaining = tokens[1..].to_vec();
        strip_help_flags(&mut result);
        return Ok(result);
    }

    // A leading `help` flips help mode and keeps resolving the rest of the
    // path; `help help` resolves to the help builtin itself.
    if tokens.first().map(String::as_str) == Some("help") {
        result.help_mode = true;
        idx += 1;
        if tokens.get(idx).map(String::as_str) == Some("help") {
            result.builtin = Some("help".to_string());
            result.remaining = tokens[idx + 1..].to_vec();
            strip_help_flags(&mut result);
            return Ok(result);
        }
    }

    // Descend token by token.
    while idx < tokens.len() {
        let tok = tokens[idx].trim();
        if tok.is_empty() {
            idx += 1;
            continue;
        }
        if tok.starts_with('-') {
            // Flags belong to the target; stop here.
            break;
        }
        match tok {
            ".." => {
                result.end = tree.parent(result.end);
                idx += 1;
            }
            "~" | "/" => {
                result.end = tree.root();
                idx += 1;
            }
            "help" => {
                // `help` is only valid at the front of the line.
                return Err(ShellError::MisplacedHelp);
            }
            _ => {
                if let Some(child) = tree.child_named(result.end, tok) {
                    result.end = child;
                    idx += 1;
                    if !tree.node(child).is_nav() {
                        break;
                    }
                } else if builtin_names.iter().any(|b| b.eq_ignore_ascii_case(tok)) {
                    result.builtin = Some(tok.to_ascii_lowercase());
                    idx += 1;
                    break;
                } else {
                    return Err(ShellError::UnknownToken {
                        token: tok.to_string(),
                        location: tree.node(result.end).name.clone(),
                        hint: tree.closest_child_name(result.end, tok),
                    });
                }
            }
        }
    }

    result.remaining = tokens[idx..].to_vec();
    strip_help_flags(&mut result);
    Ok(result)
}

/// Remove `-h`/`--help` wherever they appear in the remainder, flipping
/// help mode if any were present.
fn strip_help_flags(result: &mut WalkResult) {
    let before = result.remaining.len();
    result.remaining.retain(|t| t != "-h" && t != "--help");
    if result.remaining.len() != before {
        result.help_mode = true;
    }
}
