//! Create scaffold: ordered field inputs plus submit.
//!
//! Fields can be preseeded from flags (`--expansion foo`); when every
//! required field arrives that way the record is submitted without entering
//! the interactive form. The [`FieldForm`] is shared with the edit scaffold.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};

use crate::backend::{Backend, Record};
use crate::error::ShellError;

use super::flags::{FlagKind, FlagSet, FlagSpec};
use super::{ActionModel, ArgOutcome, DataMsg, Effect, Event};

/// One field of a create/edit form.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        Self {
            required: true,
            ..self
        }
    }
}

/// What a key did to the form.
#[derive(Debug, PartialEq, Eq)]
pub enum FormEvent {
    Editing,
    Submitted,
}

/// Ordered field editor: arrows move, Enter advances, Enter on the last
/// field submits once every required field has a value.
#[derive(Debug, Clone)]
pub struct FieldForm {
    fields: Vec<FieldSpec>,
    values: Vec<String>,
    current: usize,
    notice: Option<String>,
}

impl FieldForm {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        let values = vec![String::new(); fields.len()];
        Self {
            fields,
            values,
            current: 0,
            notice: None,
        }
    }

    pub fn set_value(&mut self, name: &str, value: &str) {
        if let Some(i) = self.fields.iter().position(|f| f.name == name) {
            self.values[i] = value.to_string();
        }
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .map(|i| self.values[i].as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .zip(self.values.iter())
            .map(|(f, v)| (f.name.as_str(), v.as_str()))
    }

    fn first_missing(&self) -> Option<usize> {
        self.fields
            .iter()
            .enumerate()
            .position(|(i, f)| f.required && self.values[i].trim().is_empty())
    }

    /// True when every required field has a value.
    pub fn complete(&self) -> bool {
        self.first_missing().is_none()
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> FormEvent {
        self.notice = None;
        match key.code {
            KeyCode::Char(c) => self.values[self.current].push(c),
            KeyCode::Backspace => {
                self.values[self.current].pop();
            }
            KeyCode::Up => self.current = self.current.saturating_sub(1),
            KeyCode::Down | KeyCode::Tab => {
                if self.current + 1 < self.fields.len() {
                    self.current += 1;
                }
            }
            KeyCode::Enter => {
                if self.current + 1 < self.fields.len() {
                    self.current += 1;
                } else {
                    match self.first_missing() {
                        None => return FormEvent::Submitted,
                        Some(missing) => {
                            self.current = missing;
                            self.notice = Some(format!(
                                "\"{}\" is required",
                                self.fields[missing].name
                            ));
                        }
                    }
                }
            }
            _ => {}
        }
        FormEvent::Editing
    }

    pub fn view(&self, title: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("{title}\n\n"));
        for (i, field) in self.fields.iter().enumerate() {
            let marker = if i == self.current { ">" } else { " " };
            let req = if field.required { "*" } else { " " };
            out.push_str(&format!(
                "{marker} {req}{:<14} {}\n",
                format!("{}:", field.name),
                self.values[i]
            ));
        }
        out.push('\n');
        if let Some(notice) = &self.notice {
            out.push_str(&format!("{notice}\n"));
        }
        out.push_str("Enter: next/submit | Up/Down: move | Esc: cancel\n");
        out
    }

    pub fn reset(&mut self) {
        for v in &mut self.values {
            v.clear();
        }
        self.current = 0;
        self.notice = None;
    }
}

pub struct CreateAction {
    kind: String,
    backend: Arc<dyn Backend>,
    fields: Vec<FieldSpec>,
    form: FieldForm,
    flags: FlagSet,
    interactive: bool,
    submitting: bool,
    done: bool,
}

impl CreateAction {
    /// The first field names the record; the rest become its field map.
    pub fn new(kind: &str, fields: Vec<FieldSpec>, backend: Arc<dyn Backend>) -> Self {
        let flags = FlagSet::new(Self::flag_specs(&fields));
        Self {
            kind: kind.to_string(),
            backend,
            form: FieldForm::new(fields.clone()),
            fields,
            flags,
            interactive: false,
            submitting: false,
            done: false,
        }
    }

    /// One preseed flag per form field.
    pub fn flag_specs(fields: &[FieldSpec]) -> Vec<FlagSpec> {
        fields
            .iter()
            .map(|f| FlagSpec::new(&f.name, FlagKind::Text, &format!("Preset the {} field", f.name)))
            .collect()
    }

    fn record_from_form(&self) -> Record {
        let mut entries = self.form.entries();
        let id = entries
            .next()
            .map(|(_, v)| v.trim().to_string())
            .unwrap_or_default();
        let mut record = Record::new(&id);
        for (name, value) in entries {
            record
                .fields
                .insert(name.to_string(), value.trim().to_string());
        }
        record
    }

    fn submit(&mut self) -> Effect {
        self.submitting = true;
        self.interactive = false;
        let backend = Arc::clone(&self.backend);
        let kind = self.kind.clone();
        let record = self.record_from_form();
        Effect::task(move |tx| {
            let msg = match backend.create(&kind, record) {
                Ok(created) => DataMsg::Text(format!("created {kind} \"{}\"", created.id)),
                Err(err) => DataMsg::Failed(err.to_string()),
            };
            let _ = tx.send(Event::Data(msg));
        })
    }
}

impl ActionModel for CreateAction {
    fn set_args(
        &mut self,
        _globals: &FlagSet,
        args: &[String],
        _width: u16,
        _height: u16,
    ) -> Result<ArgOutcome, ShellError> {
        if let Err(reason) = self.flags.parse(args) {
            return Ok(ArgOutcome::invalid(reason));
        }
        for field in &self.fields {
            if let Some(value) = self.flags.get(&field.name)
                && self.flags.is_set(&field.name)
            {
                self.form.set_value(&field.name, &value);
            }
        }
        if self.form.complete() && self.fields.iter().any(|f| self.flags.is_set(&f.name)) {
            // Fully preseeded: no form, straight to the backend.
            return Ok(ArgOutcome::ok(self.submit()));
        }
        self.interactive = true;
        Ok(ArgOutcome::ok(Effect::None))
    }

    fn update(&mut self, event: &Event) -> Effect {
        match event {
            Event::Key(key) if self.interactive => {
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
        if self.interactive && !self.done {
            self.form.view(&format!("New {}", self.kind))
        } else {
            String::new()
        }
    }

    fn done(&self) -> bool {
        self.done
    }

    fn reset(&mut self) -> Result<(), ShellError> {
        self.flags.reset();
        self.form.reset();
        self.interactive = false;
        self.submitting = false;
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

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("name").required(),
            FieldSpec::new("expansion").required(),
            FieldSpec::new("owner"),
        ]
    }

    #[test]
    fn preseeded_flags_submit_without_form() {
        let backend = Arc::new(MemoryBackend::new());
        let mut action = CreateAction::new("macros", fields(), backend.clone());
        let args: Vec<String> = ["--name=SLOW", "--expansion=latency>500"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let outcome = action.set_args(&FlagSet::default(), &args, 80, 24).unwrap();
        assert!(outcome.invalid.is_none());
        let (tx, rx) = unbounded();
        let Effect::Task(f) = outcome.startup else {
            panic!("expected submit task");
        };
        f(tx);
        let effect = action.update(&rx.recv().unwrap());
        assert!(matches!(effect, Effect::Print(ref s) if s.contains("SLOW")));
        assert!(action.done());
        assert_eq!(backend.get("macros", "SLOW").unwrap().fields["expansion"], "latency>500");
    }

    #[test]
    fn interactive_form_collects_fields_then_submits() {
        let backend = Arc::new(MemoryBackend::new());
        let mut action = CreateAction::new("macros", fields(), backend.clone());
        let outcome = action.set_args(&FlagSet::default(), &[], 80, 24).unwrap();
        assert!(matches!(outcome.startup, Effect::None));
        assert!(action.view().contains("name:"));

        for c in "M1".chars() {
            action.update(&key(KeyCode::Char(c)));
        }
        action.update(&key(KeyCode::Enter));
        for c in "x=1".chars() {
            action.update(&key(KeyCode::Char(c)));
        }
        action.update(&key(KeyCode::Enter)); // move to optional owner
        let effect = action.update(&key(KeyCode::Enter)); // submit
        let Effect::Task(f) = effect else {
            panic!("expected submit task");
        };
        let (tx, rx) = unbounded();
        f(tx);
        let effect = action.update(&rx.recv().unwrap());
        assert!(matches!(effect, Effect::Print(_)));
        assert!(backend.get("macros", "M1").is_ok());
    }

    #[test]
    fn submit_blocked_until_required_present() {
        let mut form = FieldForm::new(fields());
        // Jump straight to the end and try to submit with nothing filled.
        form.handle_key(&KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        form.handle_key(&KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        let ev = form.handle_key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(ev, FormEvent::Editing);
        assert!(form.view("t").contains("required"));
    }

    #[test]
    fn reset_restores_pristine_form() {
        let backend = Arc::new(MemoryBackend::new());
        let mut action = CreateAction::new("macros", fields(), backend);
        let _ = action.set_args(&FlagSet::default(), &[], 80, 24).unwrap();
        action.update(&key(KeyCode::Char('z')));
        let dirty = action.view();
        assert!(dirty.contains('z'));
        action.reset().unwrap();
        let _ = action.set_args(&FlagSet::default(), &[], 80, 24).unwrap();
        assert!(!action.view().contains('z'));
    }
}
