//! Edit scaffold: fetch a record, modify its fields, write it back.
//!
//! Reuses the [`FieldForm`](super::create::FieldForm) from the create
//! scaffold; the record id is fixed at invocation and never editable.

use std::sync::Arc;

use crate::backend::{Backend, Record};
use crate::error::ShellError;

use super::create::{FieldForm, FieldSpec, FormEvent};
use super::flags::FlagSet;
use super::{ActionModel, ArgOutcome, DataMsg, Effect, Event};

pub struct EditAction {
    kind: String,
    backend: Arc<dyn Backend>,
    fields: Vec<FieldSpec>,
    form: FieldForm,
    target: Option<String>,
    editing: bool,
    done: bool,
}

impl EditAction {
    /// `fields` are the editable fields; the id comes from the argument.
    pub fn new(kind: &str, fields: Vec<FieldSpec>, backend: Arc<dyn Backend>) -> Self {
        Self {
            kind: kind.to_string(),
            backend,
            form: FieldForm::new(fields.clone()),
            fields,
            target: None,
            editing: false,
            done: false,
        }
    }

    fn submit(&mut self) -> Effect {
        self.editing = false;
        let backend = Arc::clone(&self.backend);
        let kind = self.kind.clone();
        let id = self.target.clone().unwrap_or_default();
        let mut record = Record::new(&id);
        for (name, value) in self.form.entries() {
            record
                .fields
                .insert(name.to_string(), value.trim().to_string());
        }
        Effect::task(move |tx| {
            let msg = match backend.update(&kind, record) {
                Ok(updated) => DataMsg::Text(format!("updated {kind} \"{}\"", updated.id)),
                Err(err) => DataMsg::Failed(err.to_string()),
            };
            let _ = tx.send(Event::Data(msg));
        })
    }
}

impl ActionModel for EditAction {
    fn set_args(
        &mut self,
        _globals: &FlagSet,
        args: &[String],
        _width: u16,
        _height: u16,
    ) -> Result<ArgOutcome, ShellError> {
        let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();
        let Some(id) = positional.first() else {
            return Ok(ArgOutcome::invalid(format!(
                "which {}? usage: edit <id>",
                self.kind
            )));
        };
        self.target = Some(id.to_string());
        let backend = Arc::clone(&self.backend);
        let kind = self.kind.clone();
        let id = id.to_string();
        Ok(ArgOutcome::ok(Effect::task(move |tx| {
            let msg = match backend.get(&kind, &id) {
                Ok(record) => DataMsg::Records(vec![record]),
                Err(err) => DataMsg::Failed(err.to_string()),
            };
            let _ = tx.send(Event::Data(msg));
        })))
    }

    fn update(&mut self, event: &Event) -> Effect {
        match event {
            Event::Data(DataMsg::Records(records)) if !self.editing => {
                if let Some(record) = records.first() {
                    for field in &self.fields {
                        if let Some(value) = record.fields.get(&field.name) {
                            self.form.set_value(&field.name, value);
                        }
                    }
                    self.editing = true;
                }
                Effect::None
            }
            Event::Key(key) if self.editing => {
                if self.form.handle_key(key) == FormEvent::Submitted {
                    self.submit()
                } else {
                    Effect::None
                }
            }
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
        if self.editing && !self.done {
            let title = format!(
                "Edit {} \"{}\"",
                self.kind,
                self.target.as_deref().unwrap_or("")
            );
            self.form.view(&title)
        } else {
            String::new()
        }
    }

    fn done(&self) -> bool {
        self.done
    }

    fn reset(&mut self) -> Result<(), ShellError> {
        self.form.reset();
        self.target = None;
        self.editing = false;
        self.done = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crossbeam_channel::unbounded;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn missing_id_is_invalid() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let mut action = EditAction::new("macros", vec![FieldSpec::new("expansion")], backend);
        let outcome = action.set_args(&FlagSet::default(), &[], 80, 24).unwrap();
        assert!(outcome.invalid.is_some());
    }

    #[test]
    fn fetch_edit_submit_roundtrip() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let mut action = EditAction::new(
            "macros",
            vec![FieldSpec::new("expansion").required(), FieldSpec::new("owner")],
            backend.clone(),
        );
        let outcome = action
            .set_args(&FlagSet::default(), &["ERRORS".to_string()], 80, 24)
            .unwrap();
        let (tx, rx) = unbounded();
        let Effect::Task(f) = outcome.startup else {
            panic!("expected fetch task");
        };
        f(tx.clone());
        action.update(&rx.recv().unwrap());
        assert!(action.view().contains("level=error"));

        // Append to the prefilled expansion and submit from the last field.
        action.update(&key(KeyCode::Char('!')));
        action.update(&key(KeyCode::Enter));
        let effect = action.update(&key(KeyCode::Enter));
        let Effect::Task(f) = effect else {
            panic!("expected submit task");
        };
        f(tx);
        let effect = action.update(&rx.recv().unwrap());
        assert!(matches!(effect, Effect::Print(_)));
        assert!(action.done());
        assert_eq!(
            backend.get("macros", "ERRORS").unwrap().fields["expansion"],
            "level=error!"
        );
    }

    #[test]
    fn unknown_id_fails_with_error_effect() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let mut action = EditAction::new("macros", vec![FieldSpec::new("expansion")], backend);
        let outcome = action
            .set_args(&FlagSet::default(), &["NOPE".to_string()], 80, 24)
            .unwrap();
        let (tx, rx) = unbounded();
        let Effect::Task(f) = outcome.startup else {
            panic!("expected fetch task");
        };
        f(tx);
        let effect = action.update(&rx.recv().unwrap());
        assert!(matches!(effect, Effect::Error(_)));
        assert!(action.done());
    }
}
