//! The counter slice: a single integer with a loading flag.

use thiserror::Error;

use super::Reducer;

/// State of the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterState {
    pub value: i64,
    /// Shown as a "Processing..." marker. No key binding sets it.
    pub is_loading: bool,
}

/// Everything that can happen to the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterAction {
    Increment,
    Decrement,
    IncrementByAmount(i64),
    Reset,
    SetLoading(bool),
}

/// Reducer for [`CounterState`]. Arithmetic wraps on overflow.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterReducer;

impl Reducer for CounterReducer {
    type State = CounterState;
    type Action = CounterAction;

    fn reduce(state: CounterState, action: CounterAction) -> CounterState {
        match action {
            CounterAction::Increment => CounterState {
                value: state.value.wrapping_add(1),
                ..state
            },
            CounterAction::Decrement => CounterState {
                value: state.value.wrapping_sub(1),
                ..state
            },
            CounterAction::IncrementByAmount(amount) => CounterState {
                value: state.value.wrapping_add(amount),
                ..state
            },
            CounterAction::Reset => CounterState { value: 0, ..state },
            CounterAction::SetLoading(is_loading) => CounterState { is_loading, ..state },
        }
    }
}

/// Why user-entered text is not a valid amount.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no amount entered")]
    Empty,

    #[error("not a whole number: {0:?}")]
    NotANumber(String),
}

/// Parses the text typed into the custom amount prompt.
///
/// Surrounding whitespace is ignored. A leading `+` or `-` is accepted;
/// fractions, exponents and anything outside the `i64` range are not.
///
/// ```
/// use tally::store::counter::{ValidationError, parse_amount};
///
/// assert_eq!(parse_amount(" 10 "), Ok(10));
/// assert_eq!(parse_amount("-3"), Ok(-3));
/// assert_eq!(parse_amount(""), Err(ValidationError::Empty));
/// assert!(parse_amount("abc").is_err());
/// ```
pub fn parse_amount(input: &str) -> Result<i64, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    trimmed
        .parse()
        .map_err(|_| ValidationError::NotANumber(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn reduce_all(actions: impl IntoIterator<Item = CounterAction>) -> CounterState {
        actions
            .into_iter()
            .fold(CounterState::default(), CounterReducer::reduce)
    }

    #[test]
    fn test_initial_state() {
        let state = CounterState::default();
        assert_eq!(state.value, 0);
        assert!(!state.is_loading);
    }

    #[test]
    fn test_increment_increment_decrement_then_amount() {
        let state = reduce_all([
            CounterAction::Increment,
            CounterAction::Increment,
            CounterAction::Decrement,
            CounterAction::IncrementByAmount(10),
        ]);
        assert_eq!(state.value, 11);
    }

    #[test]
    fn test_reset_keeps_loading_flag() {
        let state = reduce_all([
            CounterAction::IncrementByAmount(-7),
            CounterAction::SetLoading(true),
            CounterAction::Reset,
        ]);
        assert_eq!(state.value, 0);
        assert!(state.is_loading);
    }

    #[test]
    fn test_set_loading_leaves_value() {
        let state = reduce_all([CounterAction::Increment, CounterAction::SetLoading(true)]);
        assert_eq!(
            state,
            CounterState {
                value: 1,
                is_loading: true
            }
        );
        let state = CounterReducer::reduce(state, CounterAction::SetLoading(false));
        assert!(!state.is_loading);
    }

    #[test]
    fn test_arithmetic_wraps() {
        let max = CounterState {
            value: i64::MAX,
            is_loading: false,
        };
        assert_eq!(
            CounterReducer::reduce(max, CounterAction::Increment).value,
            i64::MIN
        );
        let min = CounterState {
            value: i64::MIN,
            is_loading: false,
        };
        assert_eq!(
            CounterReducer::reduce(min, CounterAction::Decrement).value,
            i64::MAX
        );
    }

    #[test]
    fn test_parse_amount_accepts_integers() {
        assert_eq!(parse_amount("10"), Ok(10));
        assert_eq!(parse_amount("  42\n"), Ok(42));
        assert_eq!(parse_amount("+5"), Ok(5));
        assert_eq!(parse_amount("-12"), Ok(-12));
        assert_eq!(parse_amount("0"), Ok(0));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), Err(ValidationError::Empty));
        assert_eq!(parse_amount("   "), Err(ValidationError::Empty));
        assert_eq!(
            parse_amount("abc"),
            Err(ValidationError::NotANumber("abc".to_string()))
        );
        assert!(parse_amount("1.5").is_err());
        assert!(parse_amount("1e3").is_err());
        assert!(parse_amount("99999999999999999999").is_err());
    }

    #[test]
    fn test_invalid_amount_dispatches_nothing() {
        let mut store = Store::<CounterReducer>::new();
        for input in ["abc", ""] {
            if let Ok(amount) = parse_amount(input) {
                store.dispatch(CounterAction::IncrementByAmount(amount));
            }
        }
        assert_eq!(store.state().value, 0);
    }
}
