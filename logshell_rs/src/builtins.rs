//! Pseudo-commands resolvable from any position in the tree.
//!
//! The table is fixed at startup. Every builtin receives the prompt, the
//! node traversal stopped at, and the unconsumed tokens, and answers with a
//! single effect so help output stays atomic.

use once_cell::sync::Lazy;

use crate::action::Effect;
use crate::prompt::Prompt;
use crate::tree::{NodeId, render};

/// Handler signature shared by every builtin.
pub type BuiltinFn = fn(&mut Prompt, NodeId, &[String]) -> Effect;

/// One entry of the builtin table.
pub struct Builtin {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub summary: &'static str,
    /// Text printed for `help <builtin>`.
    pub help: &'static str,
    pub run: BuiltinFn,
}

/// Printed for `help help`.
pub const HELP_META: &str = "help [path]       show help for a command or navigation\n\
help <builtin>    show help for a builtin (help, history, pwd, tree, clear, quit)\n\
<path> --help     same as help <path>\n\
Navigate with \"..\" (up), \"~\" or \"/\" (root). F1 shows help for the current line.";

static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "help",
        aliases: &["ls"],
        summary: "Show help for the current or a named command",
        help: HELP_META,
        run: run_help,
    },
    Builtin {
        name: "history",
        aliases: &[],
        summary: "Print submitted commands, oldest first",
        help: "history           print every stored command line, oldest at the top",
        run: run_history,
    },
    Builtin {
        name: "pwd",
        aliases: &[],
        summary: "Print the current location in the command tree",
        help: "pwd               print the full path of the current location",
        run: run_pwd,
    },
    Builtin {
        name: "tree",
        aliases: &[],
        summary: "Print the command tree from here down",
        help: "tree [path]       print the command tree rooted at path (default: here)",
        run: run_tree,
    },
    Builtin {
        name: "clear",
        aliases: &[],
        summary: "Clear the screen",
        help: "clear             clear the screen; the prompt redraws at the top",
        run: run_clear,
    },
    Builtin {
        name: "quit",
        aliases: &["exit"],
        summary: "Leave the shell",
        help: "quit              leave the shell (aliases: exit; Ctrl-C twice works too)",
        run: run_quit,
    },
];

/// The fixed builtin table.
#[derive(Clone, Copy)]
pub struct BuiltinSet {
    entries: &'static [Builtin],
}

static ALL_NAMES: Lazy<Vec<String>> = Lazy::new(|| {
    let mut names = Vec::new();
    for b in BUILTINS {
        names.push(b.name.to_string());
        names.extend(b.aliases.iter().map(|a| a.to_string()));
    }
    names
});

impl BuiltinSet {
    pub fn standard() -> Self {
        Self { entries: BUILTINS }
    }

    /// Every resolvable name, aliases included.
    pub fn names(&self) -> &'static [String] {
        &ALL_NAMES
    }

    /// Look an entry up by name or alias, case-insensitively.
    pub fn resolve(&self, name: &str) -> Option<&'static Builtin> {
        self.entries
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name) || b.aliases.iter().any(|a| a.eq_ignore_ascii_case(name)))
    }

    pub fn entries(&self) -> &'static [Builtin] {
        self.entries
    }
}

impl Default for BuiltinSet {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn run_help(prompt: &mut Prompt, end: NodeId, rest: &[String]) -> Effect {
    if let Some(first) = rest.first()
        && let Some(builtin) = prompt.builtins().resolve(first)
    {
        return Effect::Print(builtin.help.to_string());
    }
    if rest.is_empty() {
        return prompt.help_for_node(end);
    }
    match prompt.tree().find(end, rest) {
        Ok((node, _)) => prompt.help_for_node(node),
        Err(err) => Effect::Error(err.to_string()),
    }
}

fn run_history(prompt: &mut Prompt, _end: NodeId, _rest: &[String]) -> Effect {
    let mut records = prompt.history_mut().all_newest_first();
    if records.is_empty() {
        return Effect::Print("history is empty".to_string());
    }
    records.reverse();
    Effect::Print(records.join("\n"))
}

fn run_pwd(prompt: &mut Prompt, end: NodeId, _rest: &[String]) -> Effect {
    Effect::Print(prompt.tree().path(end))
}

fn run_tree(prompt: &mut Prompt, end: NodeId, rest: &[String]) -> Effect {
    if let Some(first) = rest.first()
        && prompt.builtins().resolve(first).is_some()
    {
        return Effect::Error("tree cannot be rooted on a builtin".to_string());
    }
    let root = if rest.is_empty() {
        end
    } else {
        match prompt.tree().find(end, rest) {
            Ok((node, _)) => node,
            Err(err) => return Effect::Error(err.to_string()),
        }
    };
    let painter = *prompt.painter();
    Effect::Print(render::tree_view(prompt.tree(), root, &painter))
}

fn run_clear(_prompt: &mut Prompt, _end: NodeId, _rest: &[String]) -> Effect {
    Effect::ClearScreen
}

fn run_quit(prompt: &mut Prompt, _end: NodeId, _rest: &[String]) -> Effect {
    prompt.begin_quit();
    Effect::Print("Bye".to_string())
}
