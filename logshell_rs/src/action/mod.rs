//! The action-model contract and its registry.
//!
//! Every leaf of the command tree is driven through [`ActionModel`]: the
//! prompt binds arguments with `set_args`, then forwards one [`Event`] per
//! cycle to `update`, paints `view`, and polls `done` until the model
//! finishes. `reset` returns the model to its freshly-constructed state so
//! the same instance can be re-invoked.
//!
//! Long work never blocks `update`; it is expressed as an [`Effect::Task`]
//! that runs on its own thread and posts a [`DataMsg`] back into the loop.

pub mod basic;
pub mod create;
pub mod delete;
pub mod edit;
pub mod flags;
pub mod list;

use std::collections::HashMap;

use crossbeam_channel::Sender;
use crossterm::event::KeyEvent;

use crate::backend::{Record, Search};
use crate::error::ShellError;
use crate::tree::NodeId;
use flags::FlagSet;

// ============================================================================
// Events and effects
// ============================================================================

/// One input delivered to the event loop.
#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Periodic heartbeat of the loop; models poll their progress here.
    Tick,
    /// Completion message posted by a background task.
    Data(DataMsg),
}

/// Completion messages background tasks post back to the loop.
#[derive(Debug, Clone)]
pub enum DataMsg {
    /// Records fetched for a list/edit/delete scaffold.
    Records(Vec<Record>),
    /// A search was accepted by the backend.
    SearchStarted(Search),
    /// Final result lines of a finished search.
    SearchResults(Vec<String>),
    /// A one-shot operation finished with a printable message.
    Text(String),
    /// A background operation failed; user-facing reason.
    Failed(String),
}

/// Work the loop performs on behalf of a handler.
pub enum Effect {
    None,
    /// Print a line to the scrollback above the prompt.
    Print(String),
    /// Print a styled error line.
    Error(String),
    /// Clear the screen; the prompt redraws at the top.
    ClearScreen,
    /// Terminate the event loop.
    Quit,
    /// Run on a dedicated thread; post completions through the sender.
    Task(Box<dyn FnOnce(Sender<Event>) + Send + 'static>),
    Batch(Vec<Effect>),
}

impl Effect {
    /// Convenience for building a task effect from a closure.
    pub fn task(f: impl FnOnce(Sender<Event>) + Send + 'static) -> Self {
        Self::Task(Box::new(f))
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Print(s) => f.debug_tuple("Print").field(s).finish(),
            Self::Error(s) => f.debug_tuple("Error").field(s).finish(),
            Self::ClearScreen => write!(f, "ClearScreen"),
            Self::Quit => write!(f, "Quit"),
            Self::Task(_) => write!(f, "Task(..)"),
            Self::Batch(v) => f.debug_tuple("Batch").field(v).finish(),
        }
    }
}

// ============================================================================
// Argument binding
// ============================================================================

/// Result of binding arguments to a model.
#[derive(Debug)]
pub struct ArgOutcome {
    /// Non-empty when the input was rejected; shown to the user verbatim.
    pub invalid: Option<String>,
    /// Deferred effect the prompt executes once the handoff begins.
    pub startup: Effect,
}

impl ArgOutcome {
    pub fn ok(startup: Effect) -> Self {
        Self {
            invalid: None,
            startup,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            invalid: Some(reason.into()),
            startup: Effect::None,
        }
    }
}

// ============================================================================
// The model contract
// ============================================================================

/// Interactive driver bound to one action node.
pub trait ActionModel {
    /// Bind an invocation's arguments. `Err` means a programmer mistake;
    /// user mistakes come back as [`ArgOutcome::invalid`].
    fn set_args(
        &mut self,
        globals: &FlagSet,
        args: &[String],
        width: u16,
        height: u16,
    ) -> Result<ArgOutcome, ShellError>;

    /// Consume one event, returning the work it implies. Must not block.
    fn update(&mut self, event: &Event) -> Effect;

    /// Render the current frame. Empty means "keep the prompt visible".
    fn view(&self) -> String;

    /// True once the invocation has finished, successfully or not.
    fn done(&self) -> bool;

    /// Restore the freshly-constructed state so the model can run again.
    fn reset(&mut self) -> Result<(), ShellError>;
}

/// Factory used to build (and on recovery, rebuild) a model instance.
pub type ModelFactory = Box<dyn Fn() -> Box<dyn ActionModel>>;

// ============================================================================
// Registry
// ============================================================================

/// Process-wide mapping from action node to its model, populated at tree
/// construction and read-only thereafter (instances mutate, the map does not).
#[derive(Default)]
pub struct ModelRegistry {
    factories: HashMap<NodeId, ModelFactory>,
    models: HashMap<NodeId, Box<dyn ActionModel>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory and build the initial instance.
    pub fn register(&mut self, id: NodeId, factory: ModelFactory) {
        let model = factory();
        self.factories.insert(id, factory);
        self.models.insert(id, model);
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.models.contains_key(&id)
    }

    pub fn model(&self, id: NodeId) -> Option<&dyn ActionModel> {
        self.models.get(&id).map(|m| m.as_ref())
    }

    pub fn model_mut(&mut self, id: NodeId) -> Option<&mut Box<dyn ActionModel>> {
        self.models.get_mut(&id)
    }

    /// Re-materialise the model from its factory. Returns false when the
    /// node was never registered - the caller reports the bug.
    pub fn rebuild(&mut self, id: NodeId) -> bool {
        match self.factories.get(&id) {
            Some(factory) => {
                self.models.insert(id, factory());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basic::BasicAction;

    #[test]
    fn registry_builds_instance_on_register() {
        let mut reg = ModelRegistry::new();
        let id = NodeId(7);
        reg.register(id, Box::new(|| Box::new(BasicAction::stub("hi"))));
        assert!(reg.contains(id));
        assert!(reg.model_mut(id).is_some());
    }

    #[test]
    fn rebuild_requires_registration() {
        let mut reg = ModelRegistry::new();
        assert!(!reg.rebuild(NodeId(3)));
        reg.register(NodeId(3), Box::new(|| Box::new(BasicAction::stub("x"))));
        assert!(reg.rebuild(NodeId(3)));
    }
}
