//! Client state store.
//!
//! A [`Store`] owns one piece of state and changes it only through a
//! [`Reducer`]. Listeners registered with [`Store::subscribe`] are called
//! synchronously after every dispatch, in registration order, so a read
//! right after `dispatch` always observes the new state.
//!
//! ```text
//! Action ──→ Reducer ──→ State ──→ listeners / view
//!    ↑                                   │
//!    └───────────────────────────────────┘
//! ```

pub mod counter;

use std::fmt;

/// Transforms state in response to actions.
///
/// The reducer is the only place where state transitions happen. It must be
/// a pure function `(State, Action) -> State` that cannot fail.
pub trait Reducer {
    /// The state this reducer operates on.
    type State: Clone + PartialEq + Default + fmt::Debug;

    /// The actions this reducer handles.
    type Action: fmt::Debug;

    /// Process an action and return the next state.
    fn reduce(state: Self::State, action: Self::Action) -> Self::State;
}

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<S> = Box<dyn FnMut(&S)>;

/// An observable state container driven by a [`Reducer`].
pub struct Store<R: Reducer> {
    state: R::State,
    listeners: Vec<(ListenerId, Listener<R::State>)>,
    next_listener: u64,
}

impl<R: Reducer> Store<R> {
    /// Creates a store holding the reducer's default state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(R::State::default())
    }

    /// Creates a store holding `state`.
    #[must_use]
    pub const fn with_state(state: R::State) -> Self {
        Self {
            state,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Returns the current state.
    pub const fn state(&self) -> &R::State {
        &self.state
    }

    /// Applies `action` and notifies every listener with the new state.
    pub fn dispatch(&mut self, action: R::Action) {
        tracing::trace!(?action, "dispatch");
        let current = std::mem::take(&mut self.state);
        self.state = R::reduce(current, action);

        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }

    /// Registers a listener called after every dispatch.
    pub fn subscribe(&mut self, listener: impl FnMut(&R::State) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<R: Reducer> Default for Store<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Reducer> fmt::Debug for Store<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Log(Vec<&'static str>);

    #[derive(Debug)]
    struct Push(&'static str);

    struct LogReducer;

    impl Reducer for LogReducer {
        type State = Log;
        type Action = Push;

        fn reduce(mut state: Log, action: Push) -> Log {
            state.0.push(action.0);
            state
        }
    }

    #[test]
    fn test_dispatch_updates_state() {
        let mut store = Store::<LogReducer>::new();
        store.dispatch(Push("a"));
        store.dispatch(Push("b"));
        assert_eq!(store.state(), &Log(vec!["a", "b"]));
    }

    #[test]
    fn test_listeners_see_new_state_in_order() {
        let mut store = Store::<LogReducer>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = seen.clone();
        store.subscribe(move |state: &Log| first.borrow_mut().push(("first", state.0.len())));
        let second = seen.clone();
        store.subscribe(move |state: &Log| second.borrow_mut().push(("second", state.0.len())));

        store.dispatch(Push("a"));

        assert_eq!(*seen.borrow(), vec![("first", 1), ("second", 1)]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut store = Store::<LogReducer>::new();
        let calls = Rc::new(RefCell::new(0));

        let counter = calls.clone();
        let id = store.subscribe(move |_: &Log| *counter.borrow_mut() += 1);
        store.dispatch(Push("a"));

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.dispatch(Push("b"));

        assert_eq!(*calls.borrow(), 1);
        assert_eq!(store.listener_count(), 0);
    }
}
