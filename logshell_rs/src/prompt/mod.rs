//! The prompt controller: top-level state machine of the interactive shell.
//!
//! Three modes:
//! - **Prompting** - the editable line owns the screen; keys edit input,
//!   Up/Down recall history, Enter resolves and dispatches.
//! - **Handoff** - a leaf's action model drives; every event is forwarded
//!   until the model reports done, then the prompt reclaims control.
//! - **Quitting** - the event loop drains and exits.
//!
//! `handle` is a pure state transition returning effects; `run` wraps it in
//! the crossterm poll/read loop and performs the effects, so the whole
//! machine is drivable from tests without a terminal.

pub mod input;
pub mod keys;

use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, unbounded};
use crossterm::cursor;
use crossterm::event::{Event as CtEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::Paragraph;

use crate::action::flags::FlagSet;
use crate::action::{Effect, Event, ModelRegistry};
use crate::builtins::{BuiltinSet, HELP_META};
use crate::colors::Painter;
use crate::history::HistoryRing;
use crate::tree::{CommandTree, NodeId, render};
use crate::walk::walk;

use input::InputLine;
use keys::{Kill, check_kill_keys};

/// Where the state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    Prompting,
    Handoff,
    Quitting,
}

/// The interactive shell driver.
pub struct Prompt {
    tree: CommandTree,
    registry: ModelRegistry,
    builtins: BuiltinSet,
    history: HistoryRing,
    input: InputLine,
    mode: PromptMode,
    pwd: NodeId,
    active: Option<NodeId>,
    globals: FlagSet,
    painter: Painter,
    width: u16,
    height: u16,
    /// Line synthesised from argv, submitted on the first tick.
    startup_line: Option<String>,
    /// Quit once the startup child finishes instead of prompting.
    die_on_child_done: bool,
}

impl Prompt {
    pub fn new(
        tree: CommandTree,
        registry: ModelRegistry,
        globals: FlagSet,
        painter: Painter,
    ) -> Self {
        let pwd = tree.root();
        let mut prompt = Self {
            tree,
            registry,
            builtins: BuiltinSet::standard(),
            history: HistoryRing::new(),
            input: InputLine::new(),
            mode: PromptMode::Prompting,
            pwd,
            active: None,
            globals,
            painter,
            width: 80,
            height: 24,
            startup_line: None,
            die_on_child_done: false,
        };
        prompt.rebuild_suggestions();
        prompt
    }

    /// Start at a navigation other than the root.
    pub fn at(mut self, pwd: NodeId) -> Self {
        self.pwd = pwd;
        self.rebuild_suggestions();
        self
    }

    /// Submit `tokens` on the first tick and quit when the child finishes.
    /// Tokens with embedded whitespace are re-quoted so the resolver sees
    /// the same values argv carried.
    pub fn with_startup(mut self, tokens: &[String]) -> Self {
        if !tokens.is_empty() {
            let line: Vec<String> = tokens
                .iter()
                .map(|t| {
                    if t.contains(char::is_whitespace) {
                        format!("\"{t}\"")
                    } else {
                        t.clone()
                    }
                })
                .collect();
            self.startup_line = Some(line.join(" "));
            self.die_on_child_done = true;
        }
        self
    }

    // === Accessors (builtin handlers and tests) ===

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn builtins(&self) -> &BuiltinSet {
        &self.builtins
    }

    pub fn painter(&self) -> &Painter {
        &self.painter
    }

    pub fn history_mut(&mut self) -> &mut HistoryRing {
        &mut self.history
    }

    pub fn mode(&self) -> PromptMode {
        self.mode
    }

    pub fn pwd(&self) -> NodeId {
        self.pwd
    }

    pub fn pwd_path(&self) -> String {
        self.tree.path(self.pwd)
    }

    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    pub fn input_text(&self) -> &str {
        self.input.text()
    }

    pub fn completions(&self) -> Vec<String> {
        self.input.completions()
    }

    pub fn begin_quit(&mut self) {
        self.mode = PromptMode::Quitting;
    }

    /// Help block effect for any node.
    pub fn help_for_node(&self, id: NodeId) -> Effect {
        Effect::Print(render::help_block(&self.tree, id, &self.globals, &self.painter))
    }

    // ========================================================================
    // State machine
    // ========================================================================

    /// Process one event and return the effects it caused.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match check_kill_keys(&event) {
            Kill::Global => {
                return match self.mode {
                    PromptMode::Prompting => {
                        self.mode = PromptMode::Quitting;
                        vec![Effect::Print("Bye".to_string())]
                    }
                    PromptMode::Handoff => {
                        self.reclaim_child();
                        vec![]
                    }
                    PromptMode::Quitting => vec![],
                };
            }
            Kill::Child => {
                if self.mode == PromptMode::Handoff {
                    self.reclaim_child();
                }
                return vec![];
            }
            Kill::None => {}
        }

        if let Event::Resize(w, h) = &event {
            self.apply_resize(*w, *h);
            // A resize also concerns the child; fall through in handoff.
            if self.mode != PromptMode::Handoff {
                return vec![];
            }
        }

        match self.mode {
            PromptMode::Handoff => self.handle_handoff(event),
            PromptMode::Prompting => self.handle_prompting(event),
            PromptMode::Quitting => vec![],
        }
    }

    fn apply_resize(&mut self, w: u16, h: u16) {
        self.width = w;
        self.height = h;
        // Input gets whatever the rendered path and the "> " leave over.
        let used = self.pwd_path().chars().count() as u16 + 2;
        self.input.set_width(w.saturating_sub(used));
    }

    fn handle_prompting(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Key(key) => match key.code {
                KeyCode::F(1) => self.help_for_input(),
                KeyCode::Up => {
                    let line = self.history.older();
                    self.input.set_text(&line);
                    vec![]
                }
                KeyCode::Down => {
                    let line = self.history.newer();
                    self.input.set_text(&line);
                    vec![]
                }
                KeyCode::Enter => self.submit_line(),
                _ => {
                    self.input.handle_key(&key);
                    vec![]
                }
            },
            Event::Tick => {
                if let Some(line) = self.startup_line.take() {
                    self.input.set_text(&line);
                    let effects = self.submit_line();
                    if self.die_on_child_done && self.mode == PromptMode::Prompting {
                        // The synthesised line never started a child, so
                        // there is nothing to wait for.
                        self.mode = PromptMode::Quitting;
                    }
                    return effects;
                }
                vec![]
            }
            Event::Data(msg) => {
                // Stale message from a killed child; drop it.
                tracing::debug!(?msg, "data message outside handoff");
                vec![]
            }
            Event::Resize(..) => vec![],
        }
    }

    fn handle_handoff(&mut self, event: Event) -> Vec<Effect> {
        let Some(id) = self.active else {
            tracing::error!("handoff mode with no active child");
            self.mode = PromptMode::Prompting;
            return vec![Effect::Error(bug_line("handoff state lost"))];
        };
        if !self.registry.contains(id) {
            // Recover the registry invariant, abandon the invocation.
            tracing::error!(
                node = %self.tree.node(id).name,
                "active model vanished; rebuilding from its node"
            );
            let rebuilt = self.registry.rebuild(id);
            self.active = None;
            self.mode = PromptMode::Prompting;
            let detail = if rebuilt {
                "action state was rebuilt; the invocation was abandoned"
            } else {
                "no model is registered for this action"
            };
            return vec![Effect::Error(bug_line(detail))];
        }

        let Some(model) = self.registry.model_mut(id) else {
            self.active = None;
            self.mode = PromptMode::Prompting;
            return vec![Effect::Error(bug_line("active model lookup failed"))];
        };
        if model.done() {
            self.reclaim_child();
            return vec![];
        }
        let effect = model.update(&event);
        if model.done() {
            let effects = flatten(effect);
            self.reclaim_child();
            return effects;
        }
        flatten(effect)
    }

    /// Reset the child and take the screen back.
    fn reclaim_child(&mut self) {
        if let Some(id) = self.active.take()
            && let Some(model) = self.registry.model_mut(id)
            && let Err(err) = model.reset()
        {
            tracing::error!(%err, "model reset failed");
        }
        self.mode = if self.die_on_child_done {
            PromptMode::Quitting
        } else {
            PromptMode::Prompting
        };
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Snapshot the line to history and scrollback, then resolve it.
    fn submit_line(&mut self) -> Vec<Effect> {
        let line = self.input.take();
        let path = self.painter.path(&self.pwd_path());
        let mut effects = vec![Effect::Print(format!("{path}> {line}"))];
        self.history.insert(&line);
        self.history.reset();
        effects.extend(self.dispatch(&line));
        effects
    }

    fn dispatch(&mut self, line: &str) -> Vec<Effect> {
        let result = match walk(&self.tree, self.pwd, line, self.builtins.names()) {
            Ok(r) => r,
            Err(err) => return vec![Effect::Error(err.to_string())],
        };

        if let Some(name) = result.builtin {
            if name == "help" {
                // Only `help help` resolves to the help builtin itself.
                return vec![Effect::Print(HELP_META.to_string())];
            }
            let Some(entry) = self.builtins.resolve(&name) else {
                return vec![Effect::Error(bug_line("builtin vanished from the table"))];
            };
            if result.help_mode {
                return vec![Effect::Print(entry.help.to_string())];
            }
            return vec![(entry.run)(self, result.end, &result.remaining)];
        }

        if result.help_mode {
            return vec![self.help_for_node(result.end)];
        }

        if self.tree.node(result.end).is_nav() {
            self.pwd = result.end;
            self.rebuild_suggestions();
            return vec![];
        }

        self.enter_handoff(result.end, result.remaining)
    }

    fn enter_handoff(&mut self, id: NodeId, args: Vec<String>) -> Vec<Effect> {
        if !self.registry.contains(id) && !self.registry.rebuild(id) {
            tracing::error!(node = %self.tree.node(id).name, "no action model registered");
            return vec![Effect::Error(bug_line("no model registered for this action"))];
        }
        let globals = self.globals.clone();
        let (width, height) = (self.width, self.height);
        let node_name = self.tree.node(id).name.clone();
        let Some(model) = self.registry.model_mut(id) else {
            return vec![Effect::Error(bug_line("active model lookup failed"))];
        };
        match model.set_args(&globals, &args, width, height) {
            Err(err) => {
                tracing::error!(%err, node = %node_name, "set_args failed");
                vec![Effect::Error(bug_line(&err.to_string()))]
            }
            Ok(outcome) => {
                if let Some(reason) = outcome.invalid {
                    // Drop any partially bound arguments.
                    if let Err(err) = model.reset() {
                        tracing::error!(%err, "model reset after invalid args failed");
                    }
                    return vec![Effect::Error(format!(
                        "{reason} (see \"help {node_name}\")"
                    ))];
                }
                self.active = Some(id);
                self.mode = PromptMode::Handoff;
                flatten(outcome.startup)
            }
        }
    }

    /// F1: help for whatever the input line currently points at.
    fn help_for_input(&mut self) -> Vec<Effect> {
        let text = self.input.text().to_string();
        match walk(&self.tree, self.pwd, &text, self.builtins.names()) {
            Ok(result) => {
                if let Some(name) = result.builtin
                    && let Some(entry) = self.builtins.resolve(&name)
                {
                    return vec![Effect::Print(entry.help.to_string())];
                }
                vec![self.help_for_node(result.end)]
            }
            Err(err) => vec![Effect::Error(err.to_string())],
        }
    }

    /// Candidates are builtins plus every path reachable through navs.
    fn rebuild_suggestions(&mut self) {
        let mut candidates: Vec<String> = self.builtins.names().to_vec();
        candidates.extend(self.tree.reachable_paths(self.pwd));
        self.input.set_candidates(candidates);
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Current frame as a string: the child's view during handoff, the
    /// prompt line plus completions otherwise.
    pub fn view(&self) -> String {
        if self.mode == PromptMode::Handoff
            && let Some(id) = self.active
            && let Some(model) = self.registry.model(id)
        {
            let view = model.view();
            if !view.is_empty() {
                return view;
            }
        }
        if self.die_on_child_done && self.active.is_none() {
            return String::new();
        }
        let path = self.painter.path(&self.pwd_path());
        format!(
            "{path}> {}\n{}",
            self.input.text(),
            self.input.completions_display(&self.painter)
        )
    }

    // ========================================================================
    // Terminal event loop
    // ========================================================================

    /// Run the interactive loop until quit. Raw mode is held for the whole
    /// session; the alternate screen only during handoffs with a view.
    pub fn run(mut self) -> anyhow::Result<()> {
        let (tx, rx) = unbounded::<Event>();
        enable_raw_mode().context("cannot enable raw terminal mode")?;
        let result = self.event_loop(&tx, &rx);
        let _ = disable_raw_mode();
        result
    }

    fn event_loop(&mut self, tx: &Sender<Event>, rx: &Receiver<Event>) -> anyhow::Result<()> {
        let mut out = std::io::stdout();
        let mut alt: Option<Terminal<CrosstermBackend<std::io::Stdout>>> = None;

        if let Ok((w, h)) = crossterm::terminal::size() {
            self.apply_resize(w, h);
        }

        loop {
            let mut batch: Vec<Event> = rx.try_iter().collect();
            if batch.is_empty() {
                if crossterm::event::poll(Duration::from_millis(100))? {
                    match crossterm::event::read()? {
                        CtEvent::Key(key) if key.kind != KeyEventKind::Release => {
                            batch.push(Event::Key(key));
                        }
                        CtEvent::Resize(w, h) => batch.push(Event::Resize(w, h)),
                        _ => {}
                    }
                } else {
                    batch.push(Event::Tick);
                }
            }

            for event in batch {
                let effects = self.handle(event);
                self.sync_screen(&mut alt, &mut out)?;
                for effect in effects {
                    self.execute(effect, tx, &mut out)?;
                }
            }

            if self.mode == PromptMode::Quitting {
                break;
            }
            self.sync_screen(&mut alt, &mut out)?;
            self.paint(&mut alt, &mut out)?;
        }

        if alt.take().is_some() {
            execute!(out, LeaveAlternateScreen, cursor::Show)?;
        }
        execute!(out, cursor::MoveToColumn(0))?;
        writeln!(out)?;
        Ok(())
    }

    /// Enter or leave the alternate screen to match the child's view.
    fn sync_screen(
        &self,
        alt: &mut Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
        out: &mut std::io::Stdout,
    ) -> anyhow::Result<()> {
        let want_alt = self.mode == PromptMode::Handoff
            && self
                .active
                .and_then(|id| self.registry.model(id))
                .map(|model| !model.view().is_empty())
                .unwrap_or(false);
        if want_alt && alt.is_none() {
            execute!(out, EnterAlternateScreen, cursor::Hide)?;
            let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
            terminal.clear()?;
            *alt = Some(terminal);
        } else if !want_alt && alt.take().is_some() {
            execute!(out, LeaveAlternateScreen, cursor::Show)?;
        }
        Ok(())
    }

    fn execute(
        &mut self,
        effect: Effect,
        tx: &Sender<Event>,
        out: &mut std::io::Stdout,
    ) -> anyhow::Result<()> {
        match effect {
            Effect::None => {}
            Effect::Print(text) => self.print_block(&text, out)?,
            Effect::Error(text) => {
                let styled = self.painter.error(&text);
                self.print_block(&styled, out)?;
            }
            Effect::ClearScreen => {
                execute!(out, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
            }
            Effect::Quit => self.mode = PromptMode::Quitting,
            Effect::Task(work) => {
                let tx = tx.clone();
                std::thread::spawn(move || work(tx));
            }
            Effect::Batch(effects) => {
                for effect in effects {
                    self.execute(effect, tx, out)?;
                }
            }
        }
        Ok(())
    }

    /// Write a block of lines into the scrollback above the prompt.
    fn print_block(&self, text: &str, out: &mut std::io::Stdout) -> anyhow::Result<()> {
        for line in text.split('\n') {
            queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
            write!(out, "{line}\r\n")?;
        }
        out.flush()?;
        Ok(())
    }

    fn paint(
        &mut self,
        alt: &mut Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
        out: &mut std::io::Stdout,
    ) -> anyhow::Result<()> {
        if let Some(terminal) = alt {
            let view = self.view();
            terminal.draw(|frame| {
                frame.render_widget(Paragraph::new(view.as_str()), frame.area());
            })?;
            return Ok(());
        }
        if self.die_on_child_done {
            // One-shot bootstrap: no prompt line between effects.
            return Ok(());
        }
        let path = self.pwd_path();
        let prompt_cols = path.chars().count() + 2;
        let completions = self.input.completions_display(&self.painter);
        queue!(out, cursor::MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
        write!(out, "{}> {}", self.painter.path(&path), self.input.text())?;
        if !completions.is_empty() {
            write!(out, "\r\n{completions}")?;
            queue!(out, cursor::MoveUp(1))?;
        }
        let col = (prompt_cols + self.input.cursor()).min(u16::MAX as usize) as u16;
        queue!(out, cursor::MoveToColumn(col))?;
        out.flush()?;
        Ok(())
    }
}

fn bug_line(detail: &str) -> String {
    format!("bug: {detail}; please report this")
}

fn flatten(effect: Effect) -> Vec<Effect> {
    match effect {
        Effect::None => vec![],
        Effect::Batch(effects) => effects.into_iter().flat_map(flatten).collect(),
        other => vec![other],
    }
}

