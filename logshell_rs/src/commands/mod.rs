//! The shipped administrative command tree.
//!
//! Wires the scaffolds to the backend contract: searches under `query`,
//! record CRUD under `macros`/`kits`/`users`, and a `status` probe at the
//! root. Everything here is plumbing; behavior lives in the scaffolds.

pub mod query;

use std::sync::Arc;

use crate::action::basic::BasicAction;
use crate::action::create::{CreateAction, FieldSpec};
use crate::action::delete::DeleteAction;
use crate::action::edit::EditAction;
use crate::action::list::ListAction;
use crate::action::ModelRegistry;
use crate::backend::Backend;
use crate::error::ShellError;
use crate::tree::{CommandTree, TreeBuilder};

use query::QueryAction;

/// Build the default tree against `backend`.
pub fn build_tree(backend: Arc<dyn Backend>) -> Result<(CommandTree, ModelRegistry), ShellError> {
    let mut b = TreeBuilder::new(
        "logsh",
        "Administrative shell for the log-analytics backend",
        "Navigate with the nav names below; actions run against the connected webserver.",
    );
    let root = b.root();

    // Root-level status probe.
    let ping_backend = Arc::clone(&backend);
    b.action(
        root,
        "status",
        "Check connectivity to the webserver",
        "",
        &[],
        Vec::new(),
        Box::new(move || {
            let backend = Arc::clone(&ping_backend);
            Box::new(BasicAction::new(
                Vec::new(),
                Arc::new(move |_, _| {
                    backend.ping().map(|()| "webserver is reachable".to_string())
                }),
            ))
        }),
    )?;

    // query run
    let query_nav = b.nav(
        root,
        "query",
        "Run searches against stored data",
        "",
        &["q"],
    )?;
    let query_backend = Arc::clone(&backend);
    b.action(
        query_nav,
        "run",
        "Start a search and print its results",
        "Positional arguments form the query string; quoting is respected.",
        &[],
        QueryAction::flag_specs(),
        Box::new(move || Box::new(QueryAction::new(Arc::clone(&query_backend)))),
    )?;

    // Record CRUD groups.
    crud_nav(
        &mut b,
        Arc::clone(&backend),
        "macros",
        "Manage search macros",
        &["m"],
        &[
            FieldSpec::new("name").required(),
            FieldSpec::new("expansion").required(),
            FieldSpec::new("owner"),
        ],
    )?;
    crud_nav(
        &mut b,
        Arc::clone(&backend),
        "users",
        "Manage user accounts",
        &[],
        &[
            FieldSpec::new("name").required(),
            FieldSpec::new("locked"),
        ],
    )?;

    // Kits are read-only from the shell.
    let kits = b.nav(root, "kits", "Inspect installed kits", "", &[])?;
    let list_backend = Arc::clone(&backend);
    b.action(
        kits,
        "list",
        "List installed kits",
        "",
        &[],
        ListAction::flag_specs(),
        Box::new(move || Box::new(ListAction::new("kits", Arc::clone(&list_backend)))),
    )?;
    let info_backend = Arc::clone(&backend);
    b.action(
        kits,
        "info",
        "Show one kit's fields",
        "",
        &[],
        Vec::new(),
        Box::new(move || {
            let backend = Arc::clone(&info_backend);
            Box::new(BasicAction::new(
                Vec::new(),
                Arc::new(move |_, positional| {
                    let id = positional
                        .first()
                        .ok_or_else(|| crate::backend::BackendError::Other(
                            "usage: info <kit>".to_string(),
                        ))?;
                    let record = backend.get("kits", id)?;
                    let mut out = format!("kit {}", record.id);
                    for (key, value) in &record.fields {
                        out.push_str(&format!("\n  {key}: {value}"));
                    }
                    Ok(out)
                }),
            ))
        }),
    )?;

    b.finish()
}

/// A nav with the standard list/create/edit/delete leaves for one kind.
fn crud_nav(
    b: &mut TreeBuilder,
    backend: Arc<dyn Backend>,
    kind: &str,
    short: &str,
    aliases: &[&str],
    fields: &[FieldSpec],
) -> Result<(), ShellError> {
    let nav = b.nav(b.root(), kind, short, "", aliases)?;

    let kind_owned = kind.to_string();
    let list_backend = Arc::clone(&backend);
    b.action(
        nav,
        "list",
        &format!("List {kind}"),
        "",
        &["ls"],
        ListAction::flag_specs(),
        Box::new(move || Box::new(ListAction::new(&kind_owned, Arc::clone(&list_backend)))),
    )?;

    let kind_owned = kind.to_string();
    let create_fields = fields.to_vec();
    let create_backend = Arc::clone(&backend);
    b.action(
        nav,
        "create",
        &format!("Create a {} interactively or from flags", singular(kind)),
        "",
        &["add"],
        CreateAction::flag_specs(fields),
        Box::new(move || {
            Box::new(CreateAction::new(
                &kind_owned,
                create_fields.clone(),
                Arc::clone(&create_backend),
            ))
        }),
    )?;

    // Edit operates on every field except the identifying first one.
    let kind_owned = kind.to_string();
    let edit_fields: Vec<FieldSpec> = fields.iter().skip(1).cloned().collect();
    let edit_backend = Arc::clone(&backend);
    b.action(
        nav,
        "edit",
        &format!("Fetch a {} and modify its fields", singular(kind)),
        "",
        &[],
        Vec::new(),
        Box::new(move || {
            Box::new(EditAction::new(
                &kind_owned,
                edit_fields.clone(),
                Arc::clone(&edit_backend),
            ))
        }),
    )?;

    let kind_owned = kind.to_string();
    let delete_backend = Arc::clone(&backend);
    b.action(
        nav,
        "delete",
        &format!("Delete a {} after confirmation", singular(kind)),
        "",
        &["rm"],
        Vec::new(),
        Box::new(move || Box::new(DeleteAction::new(&kind_owned, Arc::clone(&delete_backend)))),
    )?;

    Ok(())
}

fn singular(kind: &str) -> &str {
    kind.strip_suffix('s').unwrap_or(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;

    #[test]
    fn default_tree_has_expected_shape() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let (tree, registry) = build_tree(backend).unwrap();
        for path in [
            "status",
            "query run",
            "macros list",
            "macros create",
            "macros edit",
            "macros delete",
            "users list",
            "kits list",
            "kits info",
        ] {
            let tokens: Vec<String> = path.split(' ').map(|s| s.to_string()).collect();
            let (node, rest) = tree.find(tree.root(), &tokens).unwrap();
            assert!(rest.is_empty(), "{path} left tokens");
            assert!(!tree.node(node).is_nav(), "{path} should be an action");
            assert!(registry.contains(node), "{path} has no model");
        }
    }

    #[test]
    fn crud_aliases_resolve() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let (tree, _) = build_tree(backend).unwrap();
        let tokens: Vec<String> = ["m", "rm"].iter().map(|s| s.to_string()).collect();
        let (node, _) = tree.find(tree.root(), &tokens).unwrap();
        assert_eq!(tree.node(node).name, "delete");
    }

    #[test]
    fn building_twice_is_structurally_identical() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let (a, _) = build_tree(Arc::clone(&backend) as Arc<dyn Backend>).unwrap();
        let (b, _) = build_tree(backend).unwrap();
        assert_eq!(a.reachable_paths(a.root()), b.reachable_paths(b.root()));
    }
}
