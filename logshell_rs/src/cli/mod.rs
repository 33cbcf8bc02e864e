//! Shared CLI entry point: global flag scanning, one-shot dispatch, and the
//! interactive bootstrap.
//!
//! Invocation rules:
//! - a path resolving to an action runs it (interactively unless
//!   `--no-interactive`), then exits;
//! - a path resolving to a navigation starts the prompt rooted there
//!   (with `--no-interactive` it prints the nav's help instead);
//! - no path starts the prompt at the root.
//!
//! Exit codes: 0 success, 1 user error or invalid arguments, 2 fatal.

use std::collections::VecDeque;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use crossbeam_channel::unbounded;

use crate::action::flags::{FlagKind, FlagSet, FlagSpec};
use crate::action::{Effect, Event, ModelRegistry};
use crate::backend::Backend;
use crate::backend::memory::MemoryBackend;
use crate::colors::{ColorMode, Painter};
use crate::commands;
use crate::config::{FileConfig, Settings};
use crate::prompt::Prompt;
use crate::tree::{NodeId, render};

/// Options controlling binary-specific behavior.
pub struct EntryOptions {
    /// Name shown in `--version` output.
    pub binary_name: &'static str,
    /// Usage text for a bare `--help`.
    pub usage: &'static str,
}

pub const USAGE: &str = "logsh - administrative shell for the log-analytics backend\n\n\
USAGE:\n  logsh [global flags] [command path] [command flags]\n\n\
Run with no command path for the interactive prompt.\n\
Run `logsh tree` to see every command, `logsh help <path>` for one of them.\n\n\
GLOBAL FLAGS:\n";

/// Run the CLI. This is the shared main() body; the exit code is returned
/// so the binary can pass it to `process::exit`.
pub fn run(opts: &EntryOptions) -> anyhow::Result<i32> {
    let raw_args: Vec<String> = std::env::args().skip(1).collect();
    run_with_args(opts, &raw_args)
}

pub fn run_with_args(opts: &EntryOptions, raw_args: &[String]) -> anyhow::Result<i32> {
    let (mut settings, rest) = match parse_global_args(raw_args) {
        Ok(parsed) => parsed,
        Err(reason) => {
            eprintln!("{reason}");
            return Ok(1);
        }
    };

    if rest.iter().any(|a| a == "--version" || a == "-V") {
        println!("{} {}", opts.binary_name, env!("CARGO_PKG_VERSION"));
        return Ok(0);
    }

    let file = FileConfig::load();
    settings.merge_file(&file);
    if let Err(reason) = settings.validate() {
        eprintln!("{reason}");
        return Ok(1);
    }

    init_logging(&settings, !settings.no_interactive)?;

    let painter = Painter::new(settings.color);
    let backend = select_backend(&settings);
    let (tree, mut registry) =
        commands::build_tree(backend).context("building the command tree")?;
    let globals = global_flag_set(&settings);

    // Bare --help: root help plus the global flag reference.
    if rest.iter().any(|a| a == "-h" || a == "--help") && rest.len() == 1 {
        println!("{}{}", opts.usage, globals.usage_block());
        return Ok(0);
    }

    // A leading `help` asks for help on whatever follows it.
    let mut rest = rest;
    let mut help_requested = false;
    if rest.first().map(String::as_str) == Some("help") {
        help_requested = true;
        rest.remove(0);
    }

    // Resolve the command path prefix.
    let (target, remaining) = match tree.find(tree.root(), &rest) {
        Ok(found) => found,
        Err(err) => {
            eprintln!("{err}");
            return Ok(1);
        }
    };

    let help_requested =
        help_requested || remaining.iter().any(|a| a == "-h" || a == "--help");
    let node_is_nav = tree.node(target).is_nav();

    if help_requested {
        println!("{}", render::help_block(&tree, target, &globals, &painter));
        return Ok(0);
    }

    if settings.no_interactive {
        if node_is_nav {
            // Navigations only ever show help without a prompt.
            println!("{}", render::help_block(&tree, target, &globals, &painter));
            return Ok(0);
        }
        return run_oneshot(&mut registry, target, &globals, &remaining, &painter);
    }

    if !std::io::stdout().is_terminal() {
        eprintln!("the interactive prompt requires a TTY; pass --no-interactive for scripts");
        return Ok(1);
    }

    let prompt = Prompt::new(tree, registry, globals, painter);
    let prompt = if node_is_nav {
        prompt.at(target)
    } else {
        // Resolvable action: synthesise the line, quit when it finishes.
        prompt.with_startup(&rest)
    };
    prompt.run()?;
    Ok(0)
}

/// Scan argv for the persistent global flags, leaving everything else (the
/// command path and per-action flags) untouched and in order.
pub fn parse_global_args(args: &[String]) -> Result<(Settings, Vec<String>), String> {
    let mut settings = Settings::default();
    let mut rest = Vec::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];
        let (name, inline) = match arg.split_once('=') {
            Some((n, v)) => (n, Some(v.to_string())),
            None => (arg.as_str(), None),
        };
        let value_for = |i: &mut usize| -> Result<String, String> {
            if let Some(v) = inline.clone() {
                return Ok(v);
            }
            *i += 1;
            args.get(*i)
                .cloned()
                .ok_or_else(|| format!("flag {name} requires a value"))
        };
        match name {
            "--no-interactive" => settings.no_interactive = true,
            "--insecure" => settings.insecure = true,
            "--no-color" => settings.color = ColorMode::Never,
            "--server" | "-s" => settings.server = Some(value_for(&mut i)?),
            "--user" => settings.user = Some(value_for(&mut i)?),
            "--password" => settings.password = Some(value_for(&mut i)?),
            "--token" => settings.token = Some(value_for(&mut i)?),
            "--log-level" => settings.log_level = value_for(&mut i)?,
            "--log-file" => settings.log_file = Some(PathBuf::from(value_for(&mut i)?)),
            "--profile-output" => {
                settings.profile_output = Some(PathBuf::from(value_for(&mut i)?));
            }
            "--color" => {
                let value = value_for(&mut i)?;
                settings.color = ColorMode::parse(&value)
                    .ok_or_else(|| format!("invalid --color value \"{value}\""))?;
            }
            _ => rest.push(arg.clone()),
        }
        i += 1;
    }
    Ok((settings, rest))
}

/// The persistent flag schema actions inherit for help rendering.
pub fn global_flag_set(settings: &Settings) -> FlagSet {
    let mut flags = FlagSet::new(vec![
        FlagSpec::new("no-interactive", FlagKind::Bool, "Never spawn the interactive prompt"),
        FlagSpec::new("server", FlagKind::Text, "Webserver address").short('s'),
        FlagSpec::new("user", FlagKind::Text, "Username for password login"),
        FlagSpec::new("password", FlagKind::Text, "Password for password login"),
        FlagSpec::new("token", FlagKind::Text, "API token (excludes --user/--password)"),
        FlagSpec::new("insecure", FlagKind::Bool, "Skip TLS certificate verification"),
        FlagSpec::new("log-level", FlagKind::Text, "Log level filter").default_value("info"),
        FlagSpec::new("log-file", FlagKind::Text, "Write logs to this file"),
        FlagSpec::new("no-color", FlagKind::Bool, "Disable colored output"),
        FlagSpec::new("profile-output", FlagKind::Text, "Write timing profiles").hidden(),
    ]);
    if settings.no_interactive {
        flags.set("no-interactive", "true");
    }
    if let Some(server) = &settings.server {
        flags.set("server", server);
    }
    if let Some(user) = &settings.user {
        flags.set("user", user);
    }
    if let Some(token) = &settings.token {
        flags.set("token", token);
    }
    if settings.insecure {
        flags.set("insecure", "true");
    }
    flags.set("log-level", &settings.log_level);
    flags
}

fn select_backend(settings: &Settings) -> Arc<dyn Backend> {
    if let Some(server) = &settings.server {
        // The remote transport is a separate client library; this build
        // bundles only the in-process profile.
        tracing::warn!(%server, "remote transport not bundled; using the demo backend");
        eprintln!("[logsh][warn] remote transport not bundled; running against the demo backend");
    }
    Arc::new(MemoryBackend::with_demo_data())
}

fn init_logging(settings: &Settings, interactive: bool) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let default_level = if interactive && settings.log_file.is_none() {
        // Nothing should write over the prompt unless asked to.
        "warn"
    } else {
        settings.log_level.as_str()
    };
    let filter = EnvFilter::try_new(default_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match &settings.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Drive one action to completion without a terminal: effects print to
/// stdout/stderr, tasks run inline, and interactive views are refused.
fn run_oneshot(
    registry: &mut ModelRegistry,
    id: NodeId,
    globals: &FlagSet,
    args: &[String],
    painter: &Painter,
) -> anyhow::Result<i32> {
    let Some(model) = registry.model_mut(id) else {
        anyhow::bail!("no model registered for this action");
    };
    let (tx, rx) = unbounded::<Event>();

    let outcome = model
        .set_args(globals, args, 100, 40)
        .context("binding arguments")?;
    if let Some(reason) = outcome.invalid {
        eprintln!("{}", painter.error(&reason));
        return Ok(1);
    }

    let mut pending: VecDeque<Effect> = VecDeque::from([outcome.startup]);
    let mut failed = false;
    let mut idle_ticks = 0u32;

    loop {
        if let Some(effect) = pending.pop_front() {
            match effect {
                Effect::None | Effect::ClearScreen => {}
                Effect::Print(text) => println!("{text}"),
                Effect::Error(text) => {
                    eprintln!("{}", painter.error(&text));
                    failed = true;
                }
                Effect::Quit => break,
                Effect::Task(work) => work(tx.clone()),
                Effect::Batch(effects) => pending.extend(effects),
            }
            continue;
        }
        if let Ok(event) = rx.try_recv() {
            pending.push_back(model.update(&event));
            continue;
        }
        if model.done() {
            break;
        }
        if !model.view().is_empty() {
            eprintln!("this action is interactive; run it without --no-interactive");
            let _ = model.reset();
            return Ok(1);
        }
        pending.push_back(model.update(&Event::Tick));
        idle_ticks += 1;
        if idle_ticks > 10_000 {
            eprintln!("action did not complete");
            let _ = model.reset();
            return Ok(1);
        }
    }

    if let Err(err) = model.reset() {
        tracing::error!(%err, "model reset failed after one-shot run");
    }
    Ok(if failed { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn globals_are_scanned_out_of_argv() {
        let (settings, rest) = parse_global_args(&args(&[
            "--no-interactive",
            "macros",
            "list",
            "--format=csv",
            "--server",
            "https://logs.example.com",
        ]))
        .unwrap();
        assert!(settings.no_interactive);
        assert_eq!(settings.server.as_deref(), Some("https://logs.example.com"));
        assert_eq!(rest, args(&["macros", "list", "--format=csv"]));
    }

    #[test]
    fn equals_form_accepted() {
        let (settings, rest) = parse_global_args(&args(&["--log-level=debug", "status"])).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(rest, args(&["status"]));
    }

    #[test]
    fn missing_value_is_an_error() {
        let err = parse_global_args(&args(&["--server"])).unwrap_err();
        assert!(err.contains("--server"));
    }

    #[test]
    fn invalid_color_is_an_error() {
        let err = parse_global_args(&args(&["--color", "rainbow"])).unwrap_err();
        assert!(err.contains("rainbow"));
    }

    #[test]
    fn global_flag_set_reflects_settings() {
        let settings = Settings {
            no_interactive: true,
            insecure: true,
            ..Settings::default()
        };
        let flags = global_flag_set(&settings);
        assert!(flags.get_bool("no-interactive"));
        assert!(flags.get_bool("insecure"));
        assert!(!flags.usage_block().contains("profile-output"));
    }
}
