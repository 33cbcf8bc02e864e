//! Delete scaffold: select a record, confirm, delete.
//!
//! With an id argument the selection step is skipped and only the y/N
//! confirmation remains. Esc cancels through the prompt's child-kill path.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};

use crate::backend::{Backend, Record};
use crate::error::ShellError;

use super::flags::FlagSet;
use super::{ActionModel, ArgOutcome, DataMsg, Effect, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Loading,
    Select,
    Confirm,
    Finishing,
}

pub struct DeleteAction {
    kind: String,
    backend: Arc<dyn Backend>,
    records: Vec<Record>,
    cursor: usize,
    stage: Stage,
    target: Option<String>,
    done: bool,
}

impl DeleteAction {
    pub fn new(kind: &str, backend: Arc<dyn Backend>) -> Self {
        Self {
            kind: kind.to_string(),
            backend,
            records: Vec::new(),
            cursor: 0,
            stage: Stage::Loading,
            target: None,
            done: false,
        }
    }

    fn delete_target(&mut self) -> Effect {
        self.stage = Stage::Finishing;
        let backend = Arc::clone(&self.backend);
        let kind = self.kind.clone();
        let id = self.target.clone().unwrap_or_default();
        Effect::task(move |tx| {
            let msg = match backend.delete(&kind, &id) {
                Ok(()) => DataMsg::Text(format!("deleted {kind} \"{id}\"")),
                Err(err) => DataMsg::Failed(err.to_string()),
            };
            let _ = tx.send(Event::Data(msg));
        })
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Effect {
        match (self.stage, key.code) {
            (Stage::Select, KeyCode::Up) => {
                self.cursor = self.cursor.saturating_sub(1);
                Effect::None
            }
            (Stage::Select, KeyCode::Down) => {
                if self.cursor + 1 < self.records.len() {
                    self.cursor += 1;
                }
                Effect::None
            }
            (Stage::Select, KeyCode::Enter) => {
                if let Some(record) = self.records.get(self.cursor) {
                    self.target = Some(record.id.clone());
                    self.stage = Stage::Confirm;
                }
                Effect::None
            }
            (Stage::Confirm, KeyCode::Char('y') | KeyCode::Char('Y')) => self.delete_target(),
            (Stage::Confirm, KeyCode::Char('n') | KeyCode::Char('N')) => {
                self.done = true;
                Effect::Print("aborted".to_string())
            }
            _ => Effect::None,
        }
    }
}

impl ActionModel for DeleteAction {
    fn set_args(
        &mut self,
        _globals: &FlagSet,
        args: &[String],
        _width: u16,
        _height: u16,
    ) -> Result<ArgOutcome, ShellError> {
        let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();
        if let Some(id) = positional.first() {
            self.target = Some(id.to_string());
            self.stage = Stage::Confirm;
            return Ok(ArgOutcome::ok(Effect::None));
        }
        let backend = Arc::clone(&self.backend);
        let kind = self.kind.clone();
        Ok(ArgOutcome::ok(Effect::task(move |tx| {
            let msg = match backend.list(&kind) {
                Ok(records) => DataMsg::Records(records),
                Err(err) => DataMsg::Failed(err.to_string()),
            };
            let _ = tx.send(Event::Data(msg));
        })))
    }

    fn update(&mut self, event: &Event) -> Effect {
        match event {
            Event::Data(DataMsg::Records(records)) if self.stage == Stage::Loading => {
                if records.is_empty() {
                    self.done = true;
                    return Effect::Print(format!("no {} to delete", self.kind));
                }
                self.records = records.clone();
                self.cursor = 0;
                self.stage = Stage::Select;
                Effect::None
            }
            Event::Key(key) => self.handle_key(key),
            Event::Data(DataMsg::Text(text)) => {
                self.done = true;
                Effect::Print(text.clone())
            }
            Event::Data(DataMsg::Failed(reason)) => {
                self.done = true;
                Effect::Error(reason.clone())
            }
            _ => Effect::None,
        }
    }

    fn view(&self) -> String {
        if self.done {
            return String::new();
        }
        match self.stage {
            Stage::Select => {
                let mut out = format!("Delete which {}?\n\n", self.kind);
                for (i, record) in self.records.iter().enumerate() {
                    let marker = if i == self.cursor { ">" } else { " " };
                    out.push_str(&format!("{marker} {}\n", record.id));
                }
                out.push_str("\nUp/Down: move | Enter: select | Esc: cancel\n");
                out
            }
            Stage::Confirm => format!(
                "Delete {} \"{}\"? [y/N]\n",
                self.kind,
                self.target.as_deref().unwrap_or("")
            ),
            Stage::Loading | Stage::Finishing => String::new(),
        }
    }

    fn done(&self) -> bool {
        self.done
    }

    fn reset(&mut self) -> Result<(), ShellError> {
        self.records.clear();
        self.cursor = 0;
        self.stage = Stage::Loading;
        self.target = None;
        self.done = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crossbeam_channel::unbounded;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn select_then_confirm_deletes() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let mut action = DeleteAction::new("macros", backend.clone());
        let outcome = action.set_args(&FlagSet::default(), &[], 80, 24).unwrap();
        let (tx, rx) = unbounded();
        let Effect::Task(f) = outcome.startup else {
            panic!("expected list task");
        };
        f(tx.clone());
        action.update(&rx.recv().unwrap());
        assert!(action.view().contains("ERRORS"));

        action.update(&key(KeyCode::Down));
        action.update(&key(KeyCode::Enter));
        assert!(action.view().contains("[y/N]"));
        let effect = action.update(&key(KeyCode::Char('y')));
        let Effect::Task(f) = effect else {
            panic!("expected delete task");
        };
        f(tx);
        let effect = action.update(&rx.recv().unwrap());
        assert!(matches!(effect, Effect::Print(ref s) if s.contains("WEBHOSTS")));
        assert!(action.done());
        assert!(backend.get("macros", "WEBHOSTS").is_err());
    }

    #[test]
    fn explicit_id_skips_selection() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let mut action = DeleteAction::new("macros", backend);
        let outcome = action
            .set_args(&FlagSet::default(), &["ERRORS".to_string()], 80, 24)
            .unwrap();
        assert!(matches!(outcome.startup, Effect::None));
        assert!(action.view().contains("ERRORS"));
        assert!(action.view().contains("[y/N]"));
    }

    #[test]
    fn answering_no_aborts() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let mut action = DeleteAction::new("macros", backend.clone());
        let _ = action
            .set_args(&FlagSet::default(), &["ERRORS".to_string()], 80, 24)
            .unwrap();
        let effect = action.update(&key(KeyCode::Char('n')));
        assert!(matches!(effect, Effect::Print(ref s) if s == "aborted"));
        assert!(action.done());
        assert!(backend.get("macros", "ERRORS").is_ok());
    }

    #[test]
    fn empty_kind_finishes_immediately() {
        let backend = Arc::new(MemoryBackend::new());
        let mut action = DeleteAction::new("kits", backend);
        let outcome = action.set_args(&FlagSet::default(), &[], 80, 24).unwrap();
        let (tx, rx) = unbounded();
        let Effect::Task(f) = outcome.startup else {
            panic!("expected list task");
        };
        f(tx);
        let effect = action.update(&rx.recv().unwrap());
        assert!(matches!(effect, Effect::Print(ref s) if s.contains("no kits")));
        assert!(action.done());
    }
}
