//! Reducer composition utilities
//!
//! - **`combine_reducers`**: Run several reducers over the same state and action,
//!   each one receiving the output of the previous one
//!
//! # Example
//!
//! ```
//! use rxmvi_core::Reducer;
//! use rxmvi_core::composition::combine_reducers;
//!
//! #[derive(Clone, Debug, PartialEq, Default)]
//! struct AppState {
//!     counter: i32,
//!     logged: bool,
//! }
//!
//! enum AppAction {
//!     Increment,
//!     Log,
//! }
//!
//! struct CounterReducer;
//! struct LoggingReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = AppState;
//!     type Action = AppAction;
//!
//!     fn reduce(&self, state: &AppState, action: &AppAction) -> AppState {
//!         match action {
//!             AppAction::Increment => AppState { counter: state.counter + 1, ..state.clone() },
//!             AppAction::Log => state.clone(),
//!         }
//!     }
//! }
//!
//! impl Reducer for LoggingReducer {
//!     type State = AppState;
//!     type Action = AppAction;
//!
//!     fn reduce(&self, state: &AppState, action: &AppAction) -> AppState {
//!         match action {
//!             AppAction::Log => AppState { logged: true, ..state.clone() },
//!             AppAction::Increment => state.clone(),
//!         }
//!     }
//! }
//!
//! let combined = combine_reducers(vec![Box::new(CounterReducer), Box::new(LoggingReducer)]);
//!
//! let state = combined.reduce(&AppState::default(), &AppAction::Increment);
//! let state = combined.reduce(&state, &AppAction::Log);
//! assert_eq!(state, AppState { counter: 1, logged: true });
//! ```

use crate::reducer::Reducer;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Reducers run in the given order; each receives the state produced by the
/// previous one. An empty combination is the identity reducer.
#[must_use]
pub fn combine_reducers<S, A>(
    reducers: Vec<Box<dyn Reducer<State = S, Action = A>>>,
) -> CombinedReducer<S, A>
where
    S: Clone + 'static,
    A: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A>
where
    S: 'static,
    A: 'static,
{
    reducers: Vec<Box<dyn Reducer<State = S, Action = A>>>,
}

impl<S, A> Reducer for CombinedReducer<S, A>
where
    S: Clone + 'static,
    A: 'static,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: &Self::State, action: &Self::Action) -> Self::State {
        self.reducers
            .iter()
            .fold(state.clone(), |current, reducer| reducer.reduce(&current, action))
    }
}

impl<S, A> std::fmt::Debug for CombinedReducer<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("reducers", &self.reducers.len())
            .finish()
    }
}
