//! Middleware contract.
//!
//! A middleware observes the store's actions, each paired with the state its
//! reduction produced, and returns a stream of follow-up actions. Everything it emits is fed back into
//! the store, where it is reduced and seen by every middleware again:
//!
//! ```text
//! Action ──► Reducer ──► State
//!    │                     │
//!    └──► Middleware ◄─────┘ (latest state)
//!             │
//!             └──► Effect ──► back into the store
//! ```
//!
//! A middleware must not fail: fallible work is turned into an effect action
//! (see [`effect::framed`](crate::effect::framed)). A middleware whose stream
//! panics stops contributing; the store and the other middlewares carry on.
//!
//! # Example
//!
//! ```
//! use futures::StreamExt;
//! use rxmvi_core::channel::{ActionFeed, ActionStream, StateChannel};
//! use rxmvi_core::middleware::{Middleware, with_latest_state};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct State {
//!     total: i64,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum Action {
//!     Add(i64),
//!     Added(i64),
//! }
//!
//! /// Echoes every `Add` as an `Added` carrying the would-be total.
//! struct Echo;
//!
//! impl Middleware for Echo {
//!     type State = State;
//!     type Action = Action;
//!
//!     fn bind(&self, _state: StateChannel<State>, actions: ActionFeed<Action, State>) -> ActionStream<Action> {
//!         with_latest_state(actions)
//!             .filter_map(|(action, state)| async move {
//!                 match action {
//!                     Action::Add(value) => Some(Action::Added(state.total + value)),
//!                     Action::Added(_) => None,
//!                 }
//!             })
//!             .boxed()
//!     }
//! }
//! ```

use crate::channel::{ActionFeed, ActionStream, StateChannel};
use futures::Stream;

/// The Middleware trait - side effects producing follow-up actions
///
/// # Type Parameters
///
/// - `State`: The store's state type
/// - `Action`: The store's action type
///
/// `bind` is called exactly once, when the store is created. The input stream
/// is already subscribed at that point, so no action dispatched after
/// construction is missed.
pub trait Middleware: Send + Sync {
    /// The state type of the store this middleware is attached to
    type State;

    /// The action type of the store this middleware is attached to
    type Action;

    /// Wire the middleware into the store.
    ///
    /// # Arguments
    ///
    /// - `state`: Read-only handle to the store's state relay
    /// - `actions`: Every action the store reduces, in order, after its
    ///   reduction, with the state that reduction left behind
    ///
    /// # Returns
    ///
    /// The stream of actions to feed back into the store.
    fn bind(
        &self,
        state: StateChannel<Self::State>,
        actions: ActionFeed<Self::Action, Self::State>,
    ) -> ActionStream<Self::Action>;
}

/// A fixed collection of middlewares, handed to the store at construction.
pub type Middlewares<S, A> = Vec<Box<dyn Middleware<State = S, Action = A>>>;

/// Box a middleware for a [`Middlewares`] collection.
pub fn boxed<M>(middleware: M) -> Box<dyn Middleware<State = M::State, Action = M::Action>>
where
    M: Middleware + 'static,
{
    Box::new(middleware)
}

/// Build a [`Middlewares`] collection from middleware values.
///
/// ```
/// # use rxmvi_core::channel::{ActionFeed, ActionStream, StateChannel};
/// # use rxmvi_core::middleware::Middleware;
/// # use rxmvi_core::{Middlewares, middlewares};
/// # struct Silent;
/// # impl Middleware for Silent {
/// #     type State = ();
/// #     type Action = ();
/// #     fn bind(&self, _: StateChannel<()>, _: ActionFeed<(), ()>) -> ActionStream<()> {
/// #         Box::pin(futures::stream::empty())
/// #     }
/// # }
/// let all: Middlewares<(), ()> = middlewares![Silent, Silent];
/// assert_eq!(all.len(), 2);
/// ```
#[macro_export]
macro_rules! middlewares {
    () => {
        ::std::vec::Vec::new()
    };
    ($($middleware:expr),+ $(,)?) => {
        ::std::vec![$($crate::middleware::boxed($middleware)),+]
    };
}

/// Pair every action with the state at its arrival.
///
/// This is a "latest value" join, not a one-to-one zip. The state is the one
/// the store published (or kept, when deduplicated) right after reducing the
/// action, captured before any later action was reduced. A middleware that
/// lags behind still sees each action with its own state.
pub fn with_latest_state<A, S>(actions: ActionFeed<A, S>) -> impl Stream<Item = (A, S)> + Send
where
    A: Send + 'static,
    S: Send + 'static,
{
    actions.into_snapshots()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ActionRelay;
    use futures::StreamExt;

    #[tokio::test]
    async fn pairs_actions_with_state_at_arrival() {
        let relay = ActionRelay::new();
        let mut joined = with_latest_state(ActionFeed::new(relay.subscribe())).boxed();

        relay.accept(("first", 0));
        relay.accept(("second", 5));

        // Read after both arrived: each keeps its own state
        assert_eq!(joined.next().await, Some(("first", 0)));
        assert_eq!(joined.next().await, Some(("second", 5)));
    }
}
