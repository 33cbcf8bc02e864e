//! The command tree: a hierarchical namespace of navigations and actions.
//!
//! Nodes live in an arena (`Vec<CmdNode>`) and refer to each other by
//! [`NodeId`] index, so parent back-references cost nothing and ownership
//! stays acyclic. Construction goes through [`TreeBuilder`], which also
//! populates the [`ModelRegistry`](crate::action::ModelRegistry) so every
//! action node has its interactive driver from the start.

pub mod render;

use std::collections::HashSet;

use crate::action::basic::BasicAction;
use crate::action::flags::FlagSpec;
use crate::action::{ModelFactory, ModelRegistry};
use crate::error::ShellError;

/// Arena index of a command node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Whether a node is an inner navigation or a leaf action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Nav,
    Action,
}

/// One node of the command tree.
#[derive(Debug, Clone)]
pub struct CmdNode {
    /// Case-insensitive name, unique among siblings.
    pub name: String,
    pub aliases: Vec<String>,
    /// One-line description shown in parent help listings.
    pub short: String,
    /// Long help body shown in the node's own help block.
    pub long: String,
    pub kind: NodeKind,
    /// Flag schema rendered in action help.
    pub flags: Vec<FlagSpec>,
    /// Hidden nodes are skipped by help, tree, and suggestions.
    pub hidden: bool,
    parent: NodeId,
    children: Vec<NodeId>,
}

impl CmdNode {
    pub fn is_nav(&self) -> bool {
        self.kind == NodeKind::Nav
    }

    /// True when `token` matches the name or any alias, case-insensitively.
    pub fn answers_to(&self, token: &str) -> bool {
        self.name.eq_ignore_ascii_case(token)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(token))
    }
}

/// Immutable-after-construction arena of command nodes.
pub struct CommandTree {
    nodes: Vec<CmdNode>,
}

impl CommandTree {
    /// The root navigation. Always index 0; its parent is itself.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &CmdNode {
        &self.nodes[id.0]
    }

    /// Parent of `id`; the root's parent is the root.
    pub fn parent(&self, id: NodeId) -> NodeId {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Child of `id` answering to `token` (name or alias).
    pub fn child_named(&self, id: NodeId, token: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.node(c).answers_to(token))
    }

    /// Slash-joined path from the root to `id`, starting with the root name.
    pub fn path(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut cur = id;
        loop {
            parts.push(self.node(cur).name.clone());
            let up = self.parent(cur);
            if up == cur {
                break;
            }
            cur = up;
        }
        parts.reverse();
        parts.join("/")
    }

    /// Walk strictly by name/alias from `from`, consuming tokens until one
    /// does not match a child. No builtins, no `..`/`~` — used by the
    /// one-shot bootstrap and tests.
    pub fn find(
        &self,
        from: NodeId,
        tokens: &[String],
    ) -> Result<(NodeId, Vec<String>), ShellError> {
        let mut cur = from;
        let mut idx = 0;
        while idx < tokens.len() {
            let tok = tokens[idx].trim();
            if tok.is_empty() {
                idx += 1;
                continue;
            }
            if tok.starts_with('-') {
                break;
            }
            match self.child_named(cur, tok) {
                Some(child) => {
                    cur = child;
                    idx += 1;
                    if !self.node(cur).is_nav() {
                        break;
                    }
                }
                None => {
                    return Err(ShellError::UnknownToken {
                        token: tok.to_string(),
                        location: self.node(cur).name.clone(),
                        hint: self.closest_child_name(cur, tok),
                    });
                }
            }
        }
        Ok((cur, tokens[idx..].to_vec()))
    }

    /// Best-scoring sibling name for "did you mean" hints.
    pub fn closest_child_name(&self, id: NodeId, token: &str) -> Option<String> {
        let mut best: Option<(f64, String)> = None;
        for &c in self.children(id) {
            let node = self.node(c);
            if node.hidden {
                continue;
            }
            let score = strsim::jaro_winkler(&token.to_ascii_lowercase(), &node.name.to_ascii_lowercase());
            if score > 0.8 && best.as_ref().is_none_or(|(b, _)| score > *b) {
                best = Some((score, node.name.clone()));
            }
        }
        best.map(|(_, name)| name)
    }

    /// Every visible node reachable from `id` through navigations, as
    /// space-separated paths relative to `id`. Feeds the suggestion list.
    pub fn reachable_paths(&self, id: NodeId) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths(id, String::new(), &mut out);
        out
    }

    fn collect_paths(&self, id: NodeId, prefix: String, out: &mut Vec<String>) {
        for &c in self.children(id) {
            let node = self.node(c);
            if node.hidden {
                continue;
            }
            let path = if prefix.is_empty() {
                node.name.clone()
            } else {
                format!("{prefix} {}", node.name)
            };
            out.push(path.clone());
            if node.is_nav() {
                self.collect_paths(c, path, out);
            }
        }
    }
}

/// Builder producing a [`CommandTree`] plus its action-model registry.
pub struct TreeBuilder {
    nodes: Vec<CmdNode>,
    registry: ModelRegistry,
}

impl TreeBuilder {
    /// Start a tree with a root navigation.
    pub fn new(root_name: &str, short: &str, long: &str) -> Self {
        let root = CmdNode {
            name: root_name.to_string(),
            aliases: Vec::new(),
            short: short.to_string(),
            long: long.to_string(),
            kind: NodeKind::Nav,
            flags: Vec::new(),
            hidden: false,
            parent: NodeId(0),
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            registry: ModelRegistry::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Add a navigation under `parent`.
    pub fn nav(
        &mut self,
        parent: NodeId,
        name: &str,
        short: &str,
        long: &str,
        aliases: &[&str],
    ) -> Result<NodeId, ShellError> {
        self.add_node(parent, name, short, long, aliases, NodeKind::Nav, Vec::new(), false)
    }

    /// Add an action under `parent` and register its model factory. The
    /// model instance is built immediately; the factory is retained for the
    /// prompt's recovery path.
    pub fn action(
        &mut self,
        parent: NodeId,
        name: &str,
        short: &str,
        long: &str,
        aliases: &[&str],
        flags: Vec<FlagSpec>,
        factory: ModelFactory,
    ) -> Result<NodeId, ShellError> {
        let id = self.add_node(parent, name, short, long, aliases, NodeKind::Action, flags, false)?;
        self.registry.register(id, factory);
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    fn add_node(
        &mut self,
        parent: NodeId,
        name: &str,
        short: &str,
        long: &str,
        aliases: &[&str],
        kind: NodeKind,
        flags: Vec<FlagSpec>,
        hidden: bool,
    ) -> Result<NodeId, ShellError> {
        if parent.0 >= self.nodes.len() {
            return Err(ShellError::Tree(format!("no such parent for \"{name}\"")));
        }
        if !self.nodes[parent.0].is_nav() {
            return Err(ShellError::Tree(format!(
                "cannot add \"{name}\" under action \"{}\"",
                self.nodes[parent.0].name
            )));
        }

        // Sibling collision check: names and aliases share one namespace.
        let mut taken: HashSet<String> = HashSet::new();
        for &sib in &self.nodes[parent.0].children {
            let s = &self.nodes[sib.0];
            taken.insert(s.name.to_ascii_lowercase());
            taken.extend(s.aliases.iter().map(|a| a.to_ascii_lowercase()));
        }
        for candidate in std::iter::once(name).chain(aliases.iter().copied()) {
            if !taken.insert(candidate.to_ascii_lowercase()) {
                return Err(ShellError::Tree(format!(
                    "\"{candidate}\" collides with a sibling under \"{}\"",
                    self.nodes[parent.0].name
                )));
            }
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(CmdNode {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            short: short.to_string(),
            long: long.to_string(),
            kind,
            flags,
            hidden,
            parent,
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Seal the tree. Auto-generates the hidden `help` and `completion`
    /// leaves under the root; rendering and suggestions skip them.
    pub fn finish(mut self) -> Result<(CommandTree, ModelRegistry), ShellError> {
        let root = self.root();
        for (name, short, hint) in [
            (
                "help",
                "Help about any command",
                "run \"help <path>\" or \"<path> --help\"",
            ),
            (
                "completion",
                "Shell completion scripts",
                "shell completion scripts are not bundled in this build",
            ),
        ] {
            if self.nodes[root.0]
                .children
                .iter()
                .all(|&c| !self.nodes[c.0].answers_to(name))
            {
                let id =
                    self.add_node(root, name, short, short, &[], NodeKind::Action, Vec::new(), true)?;
                self.registry
                    .register(id, Box::new(move || Box::new(BasicAction::stub(hint))));
            }
        }
        tracing::debug!(nodes = self.nodes.len(), "command tree sealed");
        Ok((CommandTree { nodes: self.nodes }, self.registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::basic::BasicAction;

    fn noop_factory() -> ModelFactory {
        Box::new(|| Box::new(BasicAction::stub("ok")))
    }

    fn sample() -> (CommandTree, ModelRegistry) {
        let mut b = TreeBuilder::new("root", "", "");
        b.nav(b.root(), "Anav", "a nav", "", &["Anav_alias"]).unwrap();
        let bnav = b.nav(b.root(), "Bnav", "b nav", "", &[]).unwrap();
        b.action(bnav, "BAaction", "", "", &[], Vec::new(), noop_factory()).unwrap();
        b.finish().unwrap()
    }

    #[test]
    fn root_parent_is_root() {
        let (tree, _) = sample();
        assert_eq!(tree.parent(tree.root()), tree.root());
    }

    #[test]
    fn child_lookup_is_case_insensitive_and_alias_aware() {
        let (tree, _) = sample();
        let by_name = tree.child_named(tree.root(), "anav").unwrap();
        let by_alias = tree.child_named(tree.root(), "ANAV_ALIAS").unwrap();
        assert_eq!(by_name, by_alias);
    }

    #[test]
    fn find_descends_and_returns_remainder() {
        let (tree, _) = sample();
        let toks: Vec<String> = ["Bnav", "BAaction", "--flag"].iter().map(|s| s.to_string()).collect();
        let (node, rest) = tree.find(tree.root(), &toks).unwrap();
        assert_eq!(tree.node(node).name, "BAaction");
        assert_eq!(rest, vec!["--flag"]);
    }

    #[test]
    fn find_unknown_token_names_token_and_location() {
        let (tree, _) = sample();
        let toks = vec!["Bnav".to_string(), "nope".to_string()];
        let err = tree.find(tree.root(), &toks).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nope"));
        assert!(msg.contains("Bnav"));
    }

    #[test]
    fn sibling_collisions_rejected() {
        let mut b = TreeBuilder::new("root", "", "");
        b.nav(b.root(), "dup", "", "", &[]).unwrap();
        assert!(b.nav(b.root(), "DUP", "", "", &[]).is_err());
        assert!(b.nav(b.root(), "other", "", "", &["dup"]).is_err());
    }

    #[test]
    fn identical_builds_are_structurally_identical() {
        let (a, _) = sample();
        let (b, _) = sample();
        assert_eq!(a.nodes.len(), b.nodes.len());
        for (x, y) in a.nodes.iter().zip(b.nodes.iter()) {
            assert_eq!(x.name, y.name);
            assert_eq!(x.aliases, y.aliases);
            assert_eq!(x.children, y.children);
            assert_eq!(x.kind, y.kind);
        }
    }

    #[test]
    fn hidden_help_leaf_excluded_from_paths() {
        let (tree, _) = sample();
        let paths = tree.reachable_paths(tree.root());
        assert!(paths.iter().any(|p| p == "Bnav BAaction"));
        assert!(!paths.iter().any(|p| p.contains("help")));
        assert!(!paths.iter().any(|p| p.contains("completion")));
    }
}
