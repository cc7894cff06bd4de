#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::rc::Rc;

use tally::store::Store;
use tally::store::counter::{CounterAction, CounterReducer, CounterState, ValidationError, parse_amount};

#[test]
fn test_increment_twice_decrement_then_add_ten() {
    let mut store = Store::<CounterReducer>::new();
    store.dispatch(CounterAction::Increment);
    store.dispatch(CounterAction::Increment);
    store.dispatch(CounterAction::Decrement);
    store.dispatch(CounterAction::IncrementByAmount(parse_amount("10").unwrap()));

    assert_eq!(store.state().value, 11);
}

#[test]
fn test_reset_from_any_value() {
    let mut store = Store::<CounterReducer>::with_state(CounterState {
        value: -250,
        is_loading: false,
    });
    store.dispatch(CounterAction::Reset);
    assert_eq!(store.state(), &CounterState::default());
}

#[test]
fn test_invalid_input_dispatches_nothing() {
    let mut store = Store::<CounterReducer>::new();
    let dispatched = Rc::new(RefCell::new(0));
    let seen = dispatched.clone();
    store.subscribe(move |_| *seen.borrow_mut() += 1);

    for input in ["abc", "", "  ", "2.5"] {
        if let Ok(amount) = parse_amount(input) {
            store.dispatch(CounterAction::IncrementByAmount(amount));
        }
    }

    assert_eq!(*dispatched.borrow(), 0);
    assert_eq!(store.state().value, 0);
    assert_eq!(parse_amount("abc"), Err(ValidationError::NotANumber("abc".into())));
}

#[test]
fn test_listener_reads_new_state_synchronously() {
    let mut store = Store::<CounterReducer>::new();
    let values = Rc::new(RefCell::new(Vec::new()));
    let sink = values.clone();
    let id = store.subscribe(move |state: &CounterState| sink.borrow_mut().push(state.value));

    store.dispatch(CounterAction::Increment);
    store.dispatch(CounterAction::IncrementByAmount(-5));
    store.dispatch(CounterAction::SetLoading(true));
    assert!(store.unsubscribe(id));
    store.dispatch(CounterAction::Reset);

    assert_eq!(*values.borrow(), vec![1, -4, -4]);
    assert!(store.state().is_loading);
}
