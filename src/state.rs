//! Application state container
//!
//! Holds one immutable state value, applies reducers in dispatch order and
//! publishes every new state on a watch channel.

pub mod app;
pub mod hydration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use tokio::sync::watch;

/// Dispatched once when a [`Store`] is created.
pub const INIT: &str = "@store/init";
/// Dispatched whenever the reducer is replaced.
pub const UPDATE: &str = "@store/update-reducers";

// =========================================================
// Action
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Action {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: None,
        }
    }

    pub fn with_payload(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload: Some(payload),
        }
    }

    pub fn init() -> Self {
        Self::new(INIT)
    }

    pub fn update() -> Self {
        Self::new(UPDATE)
    }

    /// `INIT` and `UPDATE` are the points where hydration is attempted.
    pub fn is_hydration_point(&self) -> bool {
        self.kind == INIT || self.kind == UPDATE
    }
}

// =========================================================
// Reducer
// =========================================================

/// Pure transition `(state, action) -> next state`.
pub trait Reducer<S> {
    fn reduce(&self, state: &S, action: &Action) -> S;
}

impl<S, F> Reducer<S> for F
where
    F: Fn(&S, &Action) -> S,
{
    fn reduce(&self, state: &S, action: &Action) -> S {
        self(state, action)
    }
}

// =========================================================
// Store
// =========================================================

/// Clears the dispatching flag even if a reducer panics.
struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct Store<S, R> {
    reducer: RefCell<R>,
    state: RefCell<Rc<S>>,
    publisher: watch::Sender<Rc<S>>,
    queue: RefCell<VecDeque<Action>>,
    dispatching: Cell<bool>,
}

impl<S, R: Reducer<S>> Store<S, R> {
    /// Builds the store and immediately dispatches `INIT`.
    pub fn new(initial: S, reducer: R) -> Self {
        let initial = Rc::new(initial);
        let (publisher, _) = watch::channel(initial.clone());
        let store = Self {
            reducer: RefCell::new(reducer),
            state: RefCell::new(initial),
            publisher,
            queue: RefCell::new(VecDeque::new()),
            dispatching: Cell::new(false),
        };
        store.dispatch(Action::init());
        store
    }

    pub fn state(&self) -> Rc<S> {
        self.state.borrow().clone()
    }

    /// Receives every state produced after the call (and the current one).
    pub fn subscribe(&self) -> watch::Receiver<Rc<S>> {
        self.publisher.subscribe()
    }

    /// Applies `action`.
    ///
    /// A dispatch issued while another one is being applied is queued and
    /// runs after it, so reducer applications never overlap.
    pub fn dispatch(&self, action: Action) {
        self.queue.borrow_mut().push_back(action);
        if self.dispatching.replace(true) {
            return;
        }
        let _guard = DispatchGuard(&self.dispatching);

        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(action) = next else { break };

            let current = self.state();
            let reduced = Rc::new(self.reducer.borrow().reduce(&current, &action));
            tracing::trace!(action = %action.kind, "action applied");
            *self.state.borrow_mut() = reduced.clone();
            self.publisher.send_replace(reduced);
        }
    }

    /// Swaps the reducer and dispatches `UPDATE`.
    pub fn replace_reducer(&self, reducer: R) {
        *self.reducer.borrow_mut() = reducer;
        self.dispatch(Action::update());
    }
}
