//! # rxmvi Core
//!
//! Core contracts for the rxmvi (Model-View-Intent) architecture.
//!
//! This crate provides the fundamental abstractions for building reactive,
//! unidirectional state containers. The runtime that wires them together lives
//! in `rxmvi-runtime`.
//!
//! ## Core Concepts
//!
//! - **State**: Immutable application state, replaced wholesale on every transition
//! - **Action**: Something that happened (a user intent or a side-effect outcome)
//! - **Reducer**: Pure function `(State, Action) → State`
//! - **Middleware**: `(state channel, action stream) → action stream`, for side effects
//! - **View**: A render sink the store pushes published states into
//! - **Relay**: Hot multicast channel carrying actions or states
//! - **Disposable**: Cancellation handle returned by every subscribing operation
//!
//! ## Data Flow
//!
//! ```text
//! UI event ──► Action ──► Reducer ──► State ──► View::render
//!                ▲                      │
//!                └──── Middleware ◄─────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use rxmvi_core::{Action, Reducer};
//!
//! #[derive(Clone, Debug, PartialEq, Default)]
//! struct CounterState {
//!     count: i64,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//!     Reset,
//! }
//!
//! impl Action for CounterAction {
//!     fn describe(&self) -> &'static str {
//!         match self {
//!             Self::Increment => "Increment",
//!             Self::Reset => "Reset",
//!         }
//!     }
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!
//!     fn reduce(&self, state: &CounterState, action: &CounterAction) -> CounterState {
//!         match action {
//!             CounterAction::Increment => CounterState { count: state.count + 1 },
//!             CounterAction::Reset => CounterState::default(),
//!         }
//!     }
//! }
//!
//! let next = CounterReducer.reduce(&CounterState::default(), &CounterAction::Increment);
//! assert_eq!(next.count, 1);
//! ```

/// Hot multicast channels for actions and states
pub mod channel;

/// Reducer composition utilities
pub mod composition;

/// Cancellation handles for subscriptions
pub mod disposable;

/// Middleware contract and stream helpers
pub mod middleware;

/// Action module - values flowing through the store
///
/// Actions unify intents (requests coming from the UI) and effects (outcomes
/// produced by middlewares). Both travel the same channel; the distinction is
/// a naming convention only.
pub mod action {
    use std::fmt::Debug;

    /// A value representing something that happened.
    ///
    /// `describe` returns a stable, per-variant tag. It is what the logger
    /// middleware prints as the action type, so it must not depend on the
    /// variant's payload.
    ///
    /// Implement it by hand or derive it with `rxmvi_macros::Action`.
    ///
    /// # Example
    ///
    /// ```
    /// use rxmvi_core::Action;
    ///
    /// #[derive(Clone, Debug)]
    /// enum PostsAction {
    ///     Load,
    ///     Failed(String),
    /// }
    ///
    /// impl Action for PostsAction {
    ///     fn describe(&self) -> &'static str {
    ///         match self {
    ///             Self::Load => "Load",
    ///             Self::Failed(_) => "Failed",
    ///         }
    ///     }
    /// }
    ///
    /// assert_eq!(PostsAction::Failed("boom".into()).describe(), "Failed");
    /// ```
    pub trait Action: Clone + Debug + Send + Sync + 'static {
        /// The variant tag of this action
        fn describe(&self) -> &'static str;
    }
}

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(State, Action) → State`.
///
/// The store suppresses a new state that is equal to the previous one, so a
/// reducer must return an equal result for an equal `(state, action)` pair.
pub mod reducer {
    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer produces
    /// - `Action`: The action type this reducer processes
    ///
    /// # Contract
    ///
    /// - Pure: no I/O, no interior mutability, no randomness
    /// - Total: never panics; a variant the reducer does not handle returns
    ///   `state.clone()`
    ///
    /// # Example
    ///
    /// ```
    /// use rxmvi_core::Reducer;
    ///
    /// #[derive(Clone, Debug, PartialEq, Default)]
    /// struct HintState {
    ///     visible: bool,
    /// }
    ///
    /// enum HintAction {
    ///     Show,
    ///     Hide,
    ///     Unrelated,
    /// }
    ///
    /// struct HintReducer;
    ///
    /// impl Reducer for HintReducer {
    ///     type State = HintState;
    ///     type Action = HintAction;
    ///
    ///     fn reduce(&self, state: &HintState, action: &HintAction) -> HintState {
    ///         match action {
    ///             HintAction::Show => HintState { visible: true },
    ///             HintAction::Hide => HintState { visible: false },
    ///             HintAction::Unrelated => state.clone(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer: Send + Sync {
        /// The state type this reducer produces
        type State;

        /// The action type this reducer processes
        type Action;

        /// Compute the next state from the current state and an action
        ///
        /// # Arguments
        ///
        /// - `state`: The most recently published state
        /// - `action`: The action to process
        ///
        /// # Returns
        ///
        /// The next state. Returning a value equal to `state` means "nothing changed".
        fn reduce(&self, state: &Self::State, action: &Self::Action) -> Self::State;
    }
}

/// View module - render sinks
pub mod view {
    /// A component that renders published states.
    ///
    /// Called with the current state when bound, then with every later
    /// publication in order. Calls for one binding never overlap.
    pub trait View<S>: Send + Sync {
        /// Render a state
        fn render(&self, state: &S);
    }
}

/// Effect module - framing of asynchronous side effects into actions
///
/// Middlewares performing fallible asynchronous work are expected to turn
/// failures into data. [`framed`](effect::framed) implements the usual
/// `InProgress → Success | Failure` state machine.
pub mod effect {
    use crate::channel::ActionStream;
    use futures::{StreamExt, future, stream};
    use std::future::Future;

    /// Wrap a fallible request into an in-progress / outcome action pair.
    ///
    /// The returned stream yields `in_progress` immediately, then exactly one
    /// of `on_success(value)` or `on_failure(error)` once `request` resolves,
    /// then ends.
    ///
    /// # Example
    ///
    /// ```
    /// use futures::StreamExt;
    /// use rxmvi_core::effect::framed;
    ///
    /// # tokio_test::block_on(async {
    /// let request = async { Ok::<_, String>(vec![1, 2, 3]) };
    /// let actions: Vec<String> = framed(
    ///     request,
    ///     "loading".to_string(),
    ///     |items| format!("loaded {}", items.len()),
    ///     |error| format!("failed: {error}"),
    /// )
    /// .collect()
    /// .await;
    ///
    /// assert_eq!(actions, vec!["loading", "loaded 3"]);
    /// # });
    /// ```
    pub fn framed<T, E, A, Fut, OnSuccess, OnFailure>(
        request: Fut,
        in_progress: A,
        on_success: OnSuccess,
        on_failure: OnFailure,
    ) -> ActionStream<A>
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        A: Send + 'static,
        OnSuccess: FnOnce(T) -> A + Send + 'static,
        OnFailure: FnOnce(E) -> A + Send + 'static,
    {
        let outcome = async move {
            match request.await {
                Ok(value) => on_success(value),
                Err(error) => on_failure(error),
            }
        };

        stream::once(future::ready(in_progress))
            .chain(stream::once(outcome))
            .boxed()
    }
}

// Re-export commonly used types
pub use action::Action;
pub use channel::{
    ActionChannel, ActionFeed, ActionRelay, ActionStream, StateChannel, StateRelay, StateStream,
};
pub use disposable::{CompositeDisposable, Disposable};
pub use middleware::{Middleware, Middlewares};
pub use reducer::Reducer;
pub use view::View;
