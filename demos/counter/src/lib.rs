//! # Counter Example
//!
//! A counter demonstrating the rxmvi architecture.
//!
//! This example showcases:
//! - Pure reducer over an immutable state
//! - An asynchronous middleware (`IncrementMiddleware`) feeding effects back
//! - A view model deciding which action to dispatch from the current state
//!
//! ## Architecture
//!
//! `Decrement`, `ShowHint` and `HideHint` are reduced directly. `Increment`
//! leaves the state untouched; the middleware answers it with `Calculating`
//! and, after a delay, with `IncrementSuccess(result + value)`.
//!
//! ## Example
//!
//! ```no_run
//! use counter::{CounterAction, CounterReducer, CounterState, IncrementMiddleware};
//! use rxmvi_core::middlewares;
//! use rxmvi_runtime::Store;
//!
//! # async fn example() {
//! let store = Store::new(
//!     CounterReducer::new(),
//!     CounterState::default(),
//!     middlewares![IncrementMiddleware::new()],
//! );
//!
//! store.dispatch(|| CounterAction::Increment(1));
//! # }
//! ```

use futures::{Stream, StreamExt, future, stream};
use rxmvi_core::composition::{CombinedReducer, combine_reducers};
use rxmvi_core::middleware::{Middleware, with_latest_state};
use rxmvi_core::{ActionFeed, ActionStream, Disposable, Reducer, StateChannel, View};
use rxmvi_macros::Action;
use rxmvi_runtime::{BinderError, Store, ViewModel};
use std::sync::Arc;
use std::time::Duration;

/// Counter state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterState {
    /// Current counter value
    pub result: i64,
    /// Whether the hint is shown
    pub is_hint_displayed: bool,
    /// Whether an increment is in flight
    pub is_calculating: bool,
}

/// Counter actions
#[derive(Action, Debug, Clone, PartialEq, Eq)]
pub enum CounterAction {
    /// Ask for the counter to grow by the payload
    #[intent]
    Increment(i64),
    /// Shrink the counter by the payload
    #[intent]
    Decrement(i64),
    /// Show the hint
    #[intent]
    ShowHint,
    /// Hide the hint
    #[intent]
    HideHint,
    /// An increment started
    #[effect]
    Calculating,
    /// An increment finished with the new counter value
    #[effect]
    IncrementSuccess(i64),
}

/// Counter value and calculation flag
#[derive(Debug, Clone, Copy, Default)]
struct ResultReducer;

impl Reducer for ResultReducer {
    type State = CounterState;
    type Action = CounterAction;

    fn reduce(&self, state: &CounterState, action: &CounterAction) -> CounterState {
        match action {
            CounterAction::IncrementSuccess(result) => CounterState {
                result: *result,
                is_calculating: false,
                ..state.clone()
            },
            CounterAction::Decrement(value) => CounterState {
                result: state.result - value,
                is_calculating: false,
                ..state.clone()
            },
            CounterAction::Calculating => CounterState {
                is_calculating: true,
                ..state.clone()
            },
            CounterAction::ShowHint | CounterAction::HideHint => CounterState {
                is_calculating: false,
                ..state.clone()
            },
            CounterAction::Increment(_) => state.clone(),
        }
    }
}

/// Hint visibility: any handled action but `ShowHint` hides it
#[derive(Debug, Clone, Copy, Default)]
struct HintReducer;

impl Reducer for HintReducer {
    type State = CounterState;
    type Action = CounterAction;

    fn reduce(&self, state: &CounterState, action: &CounterAction) -> CounterState {
        let is_hint_displayed = match action {
            CounterAction::ShowHint => true,
            CounterAction::Increment(_) => return state.clone(),
            _ => false,
        };

        CounterState {
            is_hint_displayed,
            ..state.clone()
        }
    }
}

/// Counter reducer
///
/// Runs the result section, then the hint section. Every handled action
/// hides the hint, except `ShowHint`.
#[derive(Debug)]
pub struct CounterReducer {
    sections: CombinedReducer<CounterState, CounterAction>,
}

impl CounterReducer {
    /// Reducer over both counter sections
    #[must_use]
    pub fn new() -> Self {
        Self {
            sections: combine_reducers(vec![Box::new(ResultReducer), Box::new(HintReducer)]),
        }
    }
}

impl Default for CounterReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for CounterReducer {
    type State = CounterState;
    type Action = CounterAction;

    fn reduce(&self, state: &CounterState, action: &CounterAction) -> CounterState {
        self.sections.reduce(state, action)
    }
}

/// Simulated latency of an increment.
pub const DEFAULT_INCREMENT_DELAY: Duration = Duration::from_secs(5);

/// Answers `Increment(value)` with `Calculating`, then `IncrementSuccess`
///
/// The new value is computed from the state the increment left behind, even
/// when other actions were reduced while it was waiting. Increments in
/// flight run concurrently.
#[derive(Debug, Clone, Copy)]
pub struct IncrementMiddleware {
    delay: Duration,
}

impl IncrementMiddleware {
    /// Middleware with [`DEFAULT_INCREMENT_DELAY`]
    #[must_use]
    pub const fn new() -> Self {
        Self::with_delay(DEFAULT_INCREMENT_DELAY)
    }

    /// Middleware with a custom delay
    #[must_use]
    pub const fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for IncrementMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for IncrementMiddleware {
    type State = CounterState;
    type Action = CounterAction;

    fn bind(
        &self,
        _state: StateChannel<CounterState>,
        actions: ActionFeed<CounterAction, CounterState>,
    ) -> ActionStream<CounterAction> {
        let delay = self.delay;

        with_latest_state(actions)
            .filter_map(|(action, current)| {
                future::ready(match action {
                    CounterAction::Increment(value) => Some((value, current)),
                    _ => None,
                })
            })
            .flat_map_unordered(None, move |(value, current)| {
                let success = async move {
                    tokio::time::sleep(delay).await;
                    CounterAction::IncrementSuccess(current.result + value)
                };

                stream::once(future::ready(CounterAction::Calculating))
                    .chain(stream::once(success))
                    .boxed()
            })
            .boxed()
    }
}

/// View model of the counter screen
///
/// Each `*_counter`/`show_hint` call subscribes one click stream.
pub struct CounterViewModel {
    binder: ViewModel<CounterState, CounterAction>,
}

impl CounterViewModel {
    /// Wrap a counter store
    #[must_use]
    pub fn new(store: Store<CounterState, CounterAction>) -> Self {
        Self {
            binder: ViewModel::new(store),
        }
    }

    /// Every click asks for an increment by one
    pub fn increment_counter<E>(&self, clicks: E) -> Disposable
    where
        E: Stream<Item = ()> + Send + 'static,
    {
        self.binder
            .dispatch_events(clicks, |()| CounterAction::Increment(1))
    }

    /// Every click decrements by one
    pub fn decrement_counter<E>(&self, clicks: E) -> Disposable
    where
        E: Stream<Item = ()> + Send + 'static,
    {
        self.binder
            .dispatch_events(clicks, |()| CounterAction::Decrement(1))
    }

    /// Every click toggles the hint
    ///
    /// Whether to show or hide is decided from the state at the time the
    /// click is reduced, so consecutive clicks alternate.
    pub fn show_hint<E>(&self, clicks: E) -> Disposable
    where
        E: Stream<Item = ()> + Send + 'static,
    {
        let store = self.binder.store().clone();
        self.binder.dispatch_events(clicks, move |()| {
            if store.current_state().is_hint_displayed {
                CounterAction::HideHint
            } else {
                CounterAction::ShowHint
            }
        })
    }

    /// Attach a view
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::Terminated`] after [`terminate`](Self::terminate).
    pub fn activate<V>(&mut self, view: Arc<V>) -> Result<(), BinderError>
    where
        V: View<CounterState> + ?Sized + 'static,
    {
        self.binder.activate(view)
    }

    /// Detach the view
    pub fn deactivate(&mut self) {
        self.binder.deactivate();
    }

    /// Release the store and every click subscription
    pub fn terminate(&mut self) {
        self.binder.terminate();
    }

    /// Read-only state channel
    #[must_use]
    pub fn state(&self) -> StateChannel<CounterState> {
        self.binder.state()
    }
}
