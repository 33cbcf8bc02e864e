//! Basic scaffold: a single-shot action that prints one result string.
//!
//! The work closure runs on a task thread and posts its outcome back as a
//! [`DataMsg`]; the model is done as soon as that message arrives.

use std::sync::Arc;

use crate::backend::BackendError;
use crate::error::ShellError;

use super::flags::{FlagSet, FlagSpec};
use super::{ActionModel, ArgOutcome, DataMsg, Effect, Event};

/// Work bound to a basic action: flags and positionals in, one line out.
pub type BasicRun =
    Arc<dyn Fn(&FlagSet, &[String]) -> Result<String, BackendError> + Send + Sync>;

pub struct BasicAction {
    flags: FlagSet,
    run: BasicRun,
    done: bool,
}

impl BasicAction {
    pub fn new(flags: Vec<FlagSpec>, run: BasicRun) -> Self {
        Self {
            flags: FlagSet::new(flags),
            run,
            done: false,
        }
    }

    /// A canned action for tests: always prints `msg`.
    pub fn stub(msg: &'static str) -> Self {
        Self::new(Vec::new(), Arc::new(move |_, _| Ok(msg.to_string())))
    }
}

impl ActionModel for BasicAction {
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
        let flags = self.flags.clone();
        let run = Arc::clone(&self.run);
        Ok(ArgOutcome::ok(Effect::task(move |tx| {
            let msg = match run(&flags, &positional) {
                Ok(text) => DataMsg::Text(text),
                Err(err) => DataMsg::Failed(err.to_string()),
            };
            let _ = tx.send(Event::Data(msg));
        })))
    }

    fn update(&mut self, event: &Event) -> Effect {
        match event {
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
    use crossbeam_channel::unbounded;

    fn drive_startup(outcome: ArgOutcome) -> Vec<Event> {
        let (tx, rx) = unbounded();
        if let Effect::Task(f) = outcome.startup {
            f(tx);
        }
        rx.try_iter().collect()
    }

    #[test]
    fn prints_result_and_finishes() {
        let mut action = BasicAction::stub("pong");
        let outcome = action
            .set_args(&FlagSet::default(), &[], 80, 24)
            .unwrap();
        assert!(outcome.invalid.is_none());
        let events = drive_startup(outcome);
        assert_eq!(events.len(), 1);
        let effect = action.update(&events[0]);
        assert!(matches!(effect, Effect::Print(ref s) if s == "pong"));
        assert!(action.done());
    }

    #[test]
    fn failure_surfaces_as_error_effect() {
        let mut action = BasicAction::new(
            Vec::new(),
            Arc::new(|_, _| Err(BackendError::Unavailable("offline".into()))),
        );
        let outcome = action.set_args(&FlagSet::default(), &[], 80, 24).unwrap();
        let events = drive_startup(outcome);
        let effect = action.update(&events[0]);
        assert!(matches!(effect, Effect::Error(_)));
        assert!(action.done());
    }

    #[test]
    fn bad_flag_is_invalid_reason_not_error() {
        let mut action = BasicAction::stub("x");
        let outcome = action
            .set_args(&FlagSet::default(), &["--nope".to_string()], 80, 24)
            .unwrap();
        assert!(outcome.invalid.is_some());
        assert!(!action.done());
    }

    #[test]
    fn reset_then_rerun_is_identical() {
        let mut action = BasicAction::stub("same");
        let o1 = action.set_args(&FlagSet::default(), &[], 80, 24).unwrap();
        let e1 = drive_startup(o1);
        let _ = action.update(&e1[0]);
        let v1 = action.view();

        action.reset().unwrap();
        assert!(!action.done());

        let o2 = action.set_args(&FlagSet::default(), &[], 80, 24).unwrap();
        let e2 = drive_startup(o2);
        let _ = action.update(&e2[0]);
        assert_eq!(action.view(), v1);
        assert!(action.done());
    }
}
