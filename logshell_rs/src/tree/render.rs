//! Rendering of help blocks and the `tree` view.
//!
//! Navigations list `..`, `~`, and their visible children (with grandchild
//! bullets for nested navigations); actions show their own usage plus the
//! inherited global flags. Every block ends with the `help help` footer.

use crate::action::flags::FlagSet;
use crate::colors::Painter;

use super::{CommandTree, NodeId};

/// Help block for any node.
pub fn help_block(tree: &CommandTree, id: NodeId, globals: &FlagSet, painter: &Painter) -> String {
    if tree.node(id).is_nav() {
        nav_help(tree, id, painter)
    } else {
        action_help(tree, id, globals, painter)
    }
}

fn nav_help(tree: &CommandTree, id: NodeId, painter: &Painter) -> String {
    let node = tree.node(id);
    let mut out = String::new();
    out.push_str(&format!("{}\n", painter.bold(&node.name)));
    if !node.short.is_empty() {
        out.push_str(&format!("{}\n", node.short));
    }
    if !node.long.is_empty() {
        out.push_str(&format!("{}\n", node.long));
    }
    out.push('\n');

    out.push_str(&format!("  {:<18} {}\n", painter.nav(".."), "step up one level"));
    out.push_str(&format!("  {:<18} {}\n", painter.nav("~"), "jump to the root"));

    for &child_id in tree.children(id) {
        let child = tree.node(child_id);
        if child.hidden {
            continue;
        }
        let name = if child.is_nav() {
            painter.nav(&child.name)
        } else {
            painter.action(&child.name)
        };
        out.push_str(&format!("  {:<18} {}\n", name, child.short));
        if child.is_nav() {
            for &grand_id in tree.children(child_id) {
                let grand = tree.node(grand_id);
                if grand.hidden {
                    continue;
                }
                out.push_str(&format!("      - {}\n", painter.dim(&grand.name)));
            }
        }
    }

    out.push_str(&footer(painter));
    out
}

fn action_help(tree: &CommandTree, id: NodeId, globals: &FlagSet, painter: &Painter) -> String {
    let node = tree.node(id);
    let mut out = String::new();
    out.push_str(&format!("{}\n", painter.bold(&node.name)));
    if !node.short.is_empty() {
        out.push_str(&format!("{}\n", node.short));
    }
    if !node.long.is_empty() {
        out.push_str(&format!("{}\n", node.long));
    }
    if !node.aliases.is_empty() {
        out.push_str(&format!("Aliases: {}\n", node.aliases.join(", ")));
    }

    let flags = FlagSet::new(node.flags.clone());
    let usage = flags.usage_block();
    if !usage.is_empty() {
        out.push_str("\nFlags:\n");
        out.push_str(&usage);
    }
    let inherited = globals.usage_block();
    if !inherited.is_empty() {
        out.push_str("\nGlobal flags:\n");
        out.push_str(&inherited);
    }

    out.push_str(&footer(painter));
    out
}

fn footer(painter: &Painter) -> String {
    format!("\n{}\n", painter.dim("Use \"help help\" for help on help itself"))
}

/// Depth-first tree view rooted at `id`, actions as leaves. Hidden nodes
/// (the auto-generated help/completion leaves) are suppressed.
pub fn tree_view(tree: &CommandTree, id: NodeId, painter: &Painter) -> String {
    let node = tree.node(id);
    let mut out = String::new();
    let name = if node.is_nav() {
        painter.nav(&node.name)
    } else {
        painter.action(&node.name)
    };
    out.push_str(&format!("{name}\n"));
    render_children(tree, id, "", painter, &mut out);
    out
}

fn render_children(
    tree: &CommandTree,
    id: NodeId,
    indent: &str,
    painter: &Painter,
    out: &mut String,
) {
    let visible: Vec<NodeId> = tree
        .children(id)
        .iter()
        .copied()
        .filter(|&c| !tree.node(c).hidden)
        .collect();
    for (i, child_id) in visible.iter().enumerate() {
        let child = tree.node(*child_id);
        let last = i + 1 == visible.len();
        let branch = if last { "└── " } else { "├── " };
        let name = if child.is_nav() {
            painter.nav(&child.name)
        } else {
            painter.action(&child.name)
        };
        out.push_str(&format!("{indent}{branch}{name}\n"));
        if child.is_nav() {
            let next_indent = format!("{indent}{}", if last { "    " } else { "│   " });
            render_children(tree, *child_id, &next_indent, painter, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ModelFactory;
    use crate::action::basic::BasicAction;
    use crate::action::flags::{FlagKind, FlagSpec};
    use crate::tree::TreeBuilder;

    fn noop() -> ModelFactory {
        Box::new(|| Box::new(BasicAction::stub("ok")))
    }

    fn sample() -> CommandTree {
        let mut b = TreeBuilder::new("root", "the shell", "");
        let nav = b.nav(b.root(), "macros", "Manage macros", "", &["m"]).unwrap();
        b.action(
            nav,
            "list",
            "List macros",
            "",
            &[],
            vec![FlagSpec::new("format", FlagKind::Text, "Output format")],
            noop(),
        )
        .unwrap();
        b.finish().unwrap().0
    }

    #[test]
    fn nav_help_lists_special_tokens_and_children() {
        let tree = sample();
        let help = help_block(&tree, tree.root(), &FlagSet::default(), &Painter::plain());
        assert!(help.contains(".."));
        assert!(help.contains("~"));
        assert!(help.contains("macros"));
        assert!(help.contains("Manage macros"));
        assert!(help.contains("- list"));
        assert!(help.contains("help help"));
    }

    #[test]
    fn action_help_shows_flags_and_globals() {
        let tree = sample();
        let (action, _) = tree
            .find(tree.root(), &["macros".to_string(), "list".to_string()])
            .unwrap();
        let globals = FlagSet::new(vec![FlagSpec::new(
            "no-interactive",
            FlagKind::Bool,
            "Disable the prompt",
        )]);
        let help = help_block(&tree, action, &globals, &Painter::plain());
        assert!(help.contains("--format"));
        assert!(help.contains("--no-interactive"));
        assert!(help.contains("help help"));
    }

    #[test]
    fn tree_view_suppresses_hidden_leaves() {
        let tree = sample();
        let view = tree_view(&tree, tree.root(), &Painter::plain());
        assert!(view.contains("macros"));
        assert!(view.contains("└── list") || view.contains("├── list"));
        assert!(!view.contains("completion"));
    }
}
