//! List scaffold: fetch records of one kind, render as table, CSV, or JSON,
//! optionally redirected to a file and restricted to chosen columns.

use std::sync::Arc;

use crate::backend::{Backend, Record};
use crate::error::ShellError;

use super::flags::{FlagKind, FlagSet, FlagSpec};
use super::{ActionModel, ArgOutcome, DataMsg, Effect, Event};

pub struct ListAction {
    kind: String,
    backend: Arc<dyn Backend>,
    flags: FlagSet,
    done: bool,
}

impl ListAction {
    pub fn new(kind: &str, backend: Arc<dyn Backend>) -> Self {
        Self {
            kind: kind.to_string(),
            backend,
            flags: FlagSet::new(Self::flag_specs()),
            done: false,
        }
    }

    /// Schema shared by every list leaf; exposed so tree construction can
    /// attach it to the node for help rendering.
    pub fn flag_specs() -> Vec<FlagSpec> {
        vec![
            FlagSpec::new("format", FlagKind::Text, "Output format: table, csv, or json")
                .short('f')
                .default_value("table"),
            FlagSpec::new("columns", FlagKind::Text, "Comma-separated columns to show")
                .short('c'),
            FlagSpec::new("output", FlagKind::Text, "Write the rendering to a file")
                .short('o'),
        ]
    }

    fn render(&self, records: &[Record]) -> Result<String, String> {
        let columns = self.columns(records);
        match self.flags.get("format").as_deref() {
            Some("table") | None => Ok(render_table(records, &columns)),
            Some("csv") => Ok(render_csv(records, &columns)),
            Some("json") => render_json(records, &columns),
            Some(other) => Err(format!("unknown format \"{other}\"")),
        }
    }

    fn columns(&self, records: &[Record]) -> Vec<String> {
        if let Some(sel) = self.flags.get("columns") {
            return sel
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }
        let mut cols = vec!["id".to_string()];
        for rec in records {
            for key in rec.fields.keys() {
                if !cols.contains(key) {
                    cols.push(key.clone());
                }
            }
        }
        cols
    }
}

fn cell<'r>(rec: &'r Record, col: &str) -> &'r str {
    if col == "id" {
        &rec.id
    } else {
        rec.fields.get(col).map(String::as_str).unwrap_or("")
    }
}

fn render_table(records: &[Record], columns: &[String]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(String::len).collect();
    for rec in records {
        for (i, col) in columns.iter().enumerate() {
            widths[i] = widths[i].max(cell(rec, col).len());
        }
    }
    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:<w$}", c.to_uppercase(), w = widths[i]))
        .collect();
    out.push_str(&header.join("  "));
    out.push('\n');
    for rec in records {
        let row: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<w$}", cell(rec, c), w = widths[i]))
            .collect();
        out.push_str(row.join("  ").trim_end());
        out.push('\n');
    }
    out.push_str(&format!("{} record(s)", records.len()));
    out
}

fn render_csv(records: &[Record], columns: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&columns.iter().map(|c| csv_quote(c)).collect::<Vec<_>>().join(","));
    out.push('\n');
    for rec in records {
        let row: Vec<String> = columns.iter().map(|c| csv_quote(cell(rec, c))).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn csv_quote(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn render_json(records: &[Record], columns: &[String]) -> Result<String, String> {
    let rows: Vec<serde_json::Value> = records
        .iter()
        .map(|rec| {
            let mut obj = serde_json::Map::new();
            for col in columns {
                obj.insert(col.clone(), serde_json::Value::String(cell(rec, col).to_string()));
            }
            serde_json::Value::Object(obj)
        })
        .collect();
    serde_json::to_string_pretty(&rows).map_err(|e| e.to_string())
}

impl ActionModel for ListAction {
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
        match self.flags.get("format").as_deref() {
            Some("table") | Some("csv") | Some("json") | None => {}
            Some(other) => {
                return Ok(ArgOutcome::invalid(format!(
                    "unknown format \"{other}\" (expected table, csv, or json)"
                )));
            }
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
            Event::Data(DataMsg::Records(records)) => {
                self.done = true;
                let rendered = match self.render(records) {
                    Ok(r) => r,
                    Err(reason) => return Effect::Error(reason),
                };
                match self.flags.get("output") {
                    Some(path) => match std::fs::write(&path, &rendered) {
                        Ok(()) => Effect::Print(format!(
                            "wrote {} record(s) to {path}",
                            records.len()
                        )),
                        Err(err) => Effect::Error(format!("cannot write {path}: {err}")),
                    },
                    None => Effect::Print(rendered),
                }
            }
            Event::Data(DataMsg::Failed(reason)) => {
                self.done = true;
                Effect::Error(reason.clone())
            }
            _ => Effect::None,
        }
    }

    fn view(&self) -> String {
        String::new()
    }

    fn done(&self) -> bool {
        self.done
    }

    fn reset(&mut self) -> Result<(), ShellError> {
        self.flags.reset();
        self.done = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crossbeam_channel::unbounded;

    fn run_list(args: &[&str]) -> (ListAction, Effect) {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let mut action = ListAction::new("macros", backend);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let outcome = action.set_args(&FlagSet::default(), &args, 80, 24).unwrap();
        assert!(outcome.invalid.is_none(), "{:?}", outcome.invalid);
        let (tx, rx) = unbounded();
        if let Effect::Task(f) = outcome.startup {
            f(tx);
        }
        let event = rx.recv().unwrap();
        let effect = action.update(&event);
        (action, effect)
    }

    #[test]
    fn table_output_has_header_and_count() {
        let (action, effect) = run_list(&[]);
        assert!(action.done());
        let Effect::Print(out) = effect else {
            panic!("expected print");
        };
        assert!(out.contains("ID"));
        assert!(out.contains("EXPANSION"));
        assert!(out.contains("ERRORS"));
        assert!(out.contains("2 record(s)"));
    }

    #[test]
    fn csv_quotes_embedded_commas() {
        assert_eq!(csv_quote("a,b"), "\"a,b\"");
        assert_eq!(csv_quote("plain"), "plain");
        let (_, effect) = run_list(&["--format=csv"]);
        let Effect::Print(out) = effect else {
            panic!("expected print");
        };
        assert!(out.starts_with("id,expansion,owner"));
    }

    #[test]
    fn json_is_parseable() {
        let (_, effect) = run_list(&["--format=json", "--columns=id"]);
        let Effect::Print(out) = effect else {
            panic!("expected print");
        };
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].get("id").is_some());
        assert!(parsed[0].get("expansion").is_none());
    }

    #[test]
    fn unknown_format_is_invalid_reason() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let mut action = ListAction::new("macros", backend);
        let outcome = action
            .set_args(&FlagSet::default(), &["--format=xml".to_string()], 80, 24)
            .unwrap();
        assert!(outcome.invalid.unwrap().contains("xml"));
    }

    #[test]
    fn output_flag_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.csv");
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let mut action = ListAction::new("macros", backend);
        let args = vec![
            "--format=csv".to_string(),
            format!("--output={}", path.display()),
        ];
        let outcome = action.set_args(&FlagSet::default(), &args, 80, 24).unwrap();
        let (tx, rx) = unbounded();
        if let Effect::Task(f) = outcome.startup {
            f(tx);
        }
        let effect = action.update(&rx.recv().unwrap());
        assert!(matches!(effect, Effect::Print(_)));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("id,"));
    }
}
