//! The `query run` action: start a search, keep it alive, print results.
//!
//! The only long-lived background activity in the shell: while the search
//! runs, a [`Keepalive`] thread pings the backend at the cadence derived
//! from the server-reported interval. A bounded task polls for completion
//! and posts the result lines; reset tears the heartbeat down.

use std::sync::Arc;
use std::time::Duration;

use crate::action::flags::{FlagKind, FlagSet, FlagSpec};
use crate::action::{ActionModel, ArgOutcome, DataMsg, Effect, Event};
use crate::backend::heartbeat::Keepalive;
use crate::backend::{Backend, Search};
use crate::error::ShellError;

/// How often the completion poller re-checks a running search.
const POLL_PERIOD: Duration = Duration::from_millis(100);
/// Poll attempts before the invocation is declared stuck.
const POLL_LIMIT: u32 = 3000;

pub struct QueryAction {
    backend: Arc<dyn Backend>,
    flags: FlagSet,
    search: Option<Search>,
    keepalive: Option<Keepalive>,
    done: bool,
}

impl QueryAction {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            flags: FlagSet::new(Self::flag_specs()),
            search: None,
            keepalive: None,
            done: false,
        }
    }

    pub fn flag_specs() -> Vec<FlagSpec> {
        vec![
            FlagSpec::new("last", FlagKind::Int, "Search the last N minutes")
                .default_value("60"),
            FlagSpec::new("limit", FlagKind::Int, "Maximum result lines to print")
                .short('n')
                .default_value("100"),
        ]
    }

    fn stop_search(&mut self) {
        if let Some(mut keepalive) = self.keepalive.take() {
            keepalive.stop();
        }
        if let Some(search) = self.search.take()
            && let Err(err) = self.backend.close_search(&search.id)
        {
            tracing::debug!(%err, search = %search.id, "close_search failed");
        }
    }
}

impl ActionModel for QueryAction {
    fn set_args(
        &mut self,
        _globals: &FlagSet,
        args: &[String],
        _width: u16,
        _height: u16,
    ) -> Result<ArgOutcome, ShellError> {
        let positional = match self.flags.parse(args) {
            Ok(p) => p,
            Err(reason) => return Ok(ArgOutcome::invalid(reason)),
        };
        let query = positional.join(" ");
        if query.trim().is_empty() {
            return Ok(ArgOutcome::invalid(
                "a query string is required, e.g.: run tag=default",
            ));
        }
        let minutes = self.flags.get_int("last").unwrap_or(60);
        let range = Duration::from_secs(minutes * 60);
        let backend = Arc::clone(&self.backend);
        Ok(ArgOutcome::ok(Effect::task(move |tx| {
            let msg = match backend.start_search(&query, range) {
                Ok(search) => DataMsg::SearchStarted(search),
                Err(err) => DataMsg::Failed(err.to_string()),
            };
            let _ = tx.send(Event::Data(msg));
        })))
    }

    fn update(&mut self, event: &Event) -> Effect {
        match event {
            Event::Data(DataMsg::SearchStarted(search)) => {
                self.keepalive = Some(Keepalive::spawn(
                    Arc::clone(&self.backend),
                    search.id.clone(),
                    search.ping_interval,
                ));
                self.search = Some(search.clone());

                let backend = Arc::clone(&self.backend);
                let id = search.id.clone();
                let limit = self.flags.get_int("limit").unwrap_or(100) as usize;
                Effect::task(move |tx| {
                    let mut polls = 0;
                    let msg = loop {
                        match backend.search_status(&id) {
                            Ok(status) if status.done => {
                                break match backend.search_results(&id, limit) {
                                    Ok(lines) => DataMsg::SearchResults(lines),
                                    Err(err) => DataMsg::Failed(err.to_string()),
                                };
                            }
                            Ok(_) => {
                                polls += 1;
                                if polls > POLL_LIMIT {
                                    break DataMsg::Failed(
                                        "search did not complete in time".to_string(),
                                    );
                                }
                                std::thread::sleep(POLL_PERIOD);
                            }
                            Err(err) => break DataMsg::Failed(err.to_string()),
                        }
                    };
                    let _ = tx.send(Event::Data(msg));
                })
            }
            Event::Data(DataMsg::SearchResults(lines)) => {
                self.stop_search();
                self.done = true;
                let mut out = lines.join("\n");
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&format!("{} result(s)", lines.len()));
                Effect::Print(out)
            }
            Event::Data(DataMsg::Failed(reason)) => {
                self.stop_search();
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
        self.stop_search();
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

    fn run_query(args: &[&str]) -> (QueryAction, Vec<Effect>) {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let mut action = QueryAction::new(backend);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let outcome = action.set_args(&FlagSet::default(), &args, 80, 24).unwrap();
        assert!(outcome.invalid.is_none(), "{:?}", outcome.invalid);

        let (tx, rx) = unbounded();
        let mut pending = vec![outcome.startup];
        let mut printed = Vec::new();
        // Drive tasks inline until the model settles.
        while let Some(effect) = pending.pop() {
            match effect {
                Effect::Task(f) => f(tx.clone()),
                Effect::Batch(v) => pending.extend(v),
                other => printed.push(other),
            }
            while let Ok(event) = rx.try_recv() {
                pending.push(action.update(&event));
            }
        }
        (action, printed)
    }

    #[test]
    fn query_prints_matching_lines_and_count() {
        let (action, effects) = run_query(&["host=web"]);
        assert!(action.done());
        let text = effects
            .iter()
            .find_map(|e| match e {
                Effect::Print(s) => Some(s.clone()),
                _ => None,
            })
            .expect("expected printed results");
        assert!(text.contains("web-1"));
        assert!(text.contains("result(s)"));
    }

    #[test]
    fn empty_query_is_invalid() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let mut action = QueryAction::new(backend);
        let outcome = action.set_args(&FlagSet::default(), &[], 80, 24).unwrap();
        assert!(outcome.invalid.is_some());
    }

    #[test]
    fn limit_flag_caps_results() {
        let (_, effects) = run_query(&["--limit", "1", "tag=default"]);
        let text = effects
            .iter()
            .find_map(|e| match e {
                Effect::Print(s) => Some(s.clone()),
                _ => None,
            })
            .expect("expected printed results");
        assert!(text.contains("1 result(s)"));
    }

    #[test]
    fn reset_stops_the_heartbeat_and_closes_the_search() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let mut action = QueryAction::new(Arc::clone(&backend) as Arc<dyn Backend>);
        let outcome = action
            .set_args(&FlagSet::default(), &["tag=default".to_string()], 80, 24)
            .unwrap();
        let (tx, rx) = unbounded();
        let Effect::Task(f) = outcome.startup else {
            panic!("expected start task");
        };
        f(tx);
        // Deliver only the start message; the search is now live.
        let event = rx.recv().unwrap();
        let _ = action.update(&event);
        assert!(!action.done());

        action.reset().unwrap();
        // The search was closed, so further keepalives fail.
        let search_id = crate::backend::SearchId("search-1".to_string());
        assert!(backend.keepalive_search(&search_id).is_err());
    }
}
