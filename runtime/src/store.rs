//! The Store - single authoritative holder of state.
//!
//! # Pipelines
//!
//! Creating a store starts two kinds of tasks that live until [`Store::release`]:
//!
//! 1. **Reduce-and-publish**: a single task drains the store's action queue
//!    in arrival order. For each item it evaluates the dispatched thunk,
//!    reduces it against the latest published state, publishes the new state
//!    unless it equals the previous one, then publishes the action itself on
//!    the action relay and, paired with the resulting state, on the
//!    middleware feed.
//! 2. **Middleware forwarding**: one task per middleware drives the stream
//!    returned by [`Middleware::bind`](rxmvi_core::Middleware::bind) and queues
//!    every action it emits back into the store.
//!
//! ```text
//!  dispatch ─┐
//!  events  ──┼──► queue ──► reduce ──► state relay ──► views
//!  effects ──┘                │
//!     ▲                       └──► action relay ──► middlewares ─┐
//!     └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every state publication happens on the reduce task, so views observe a
//! single, totally ordered sequence of states. Relays queue without bound:
//! slow views and middlewares fall behind but never skip a value.
//!
//! # Error Handling Strategy
//!
//! **Reducer panics**: Fatal. The reduce task logs the panic and stops; the
//! store no longer publishes state. Reducers must be pure and total.
//!
//! **Dispatch panics**: A thunk or event mapper that panics drops only its
//! own action.
//!
//! **Middleware panics**: Isolated. The panicking middleware stops
//! contributing; the other middlewares and the reducer carry on.

use crate::StoreConfig;
use crate::error::StoreError;
use crate::metrics::{
    ACTIONS_DISPATCHED, ACTIONS_REDUCED, DISPATCHES_CANCELLED, DISPATCHES_PANICKED,
    MIDDLEWARE_ACTIONS, MIDDLEWARE_PANICKED, REDUCER_DURATION, REDUCER_PANICKED,
    STATES_PUBLISHED, STATES_SUPPRESSED, STORES_RELEASED, counter, histogram,
};
use futures::{FutureExt, Stream, StreamExt};
use rxmvi_core::{
    Action, ActionChannel, ActionFeed, ActionRelay, ActionStream, CompositeDisposable,
    Disposable, Middlewares, Reducer, StateChannel, StateRelay, View,
};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Work item for the reduce task
enum Pending<A> {
    /// Action emitted by a middleware
    Ready(A),

    /// Dispatched thunk, evaluated by the reduce task unless `guard` was disposed
    Deferred {
        produce: Box<dyn FnOnce() -> A + Send>,
        guard: Disposable,
    },

    /// End of an event stream; every earlier item of it was already resolved
    Finished(Disposable),
}

impl<A: Action> Pending<A> {
    fn resolve(self) -> Option<A> {
        match self {
            Self::Ready(action) => Some(action),
            Self::Deferred { produce, guard } => {
                if guard.is_disposed() {
                    tracing::trace!("Skipping cancelled dispatch");
                    counter!(DISPATCHES_CANCELLED).increment(1);
                    return None;
                }

                if let Ok(action) = catch_unwind(AssertUnwindSafe(produce)) {
                    Some(action)
                } else {
                    tracing::error!("Dispatched thunk panicked, action dropped");
                    counter!(DISPATCHES_PANICKED).increment(1);
                    None
                }
            },
            Self::Finished(handle) => {
                handle.dispose();
                None
            },
        }
    }
}

struct Inner<S, A> {
    queue: mpsc::UnboundedSender<Pending<A>>,
    actions: ActionRelay<A>,
    state: StateRelay<S>,
    pipelines: CompositeDisposable,
    released: AtomicBool,
}

impl<S, A> Inner<S, A> {
    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }

        self.pipelines.dispose();
        tracing::debug!("Store released");
        counter!(STORES_RELEASED).increment(1);
    }
}

impl<S, A> Drop for Inner<S, A> {
    fn drop(&mut self) {
        self.release();
    }
}

/// The Store - runtime coordinator for a reducer and its middlewares
///
/// The Store owns:
/// 1. The current state (in a replay-latest relay)
/// 2. The action queue and the action relay
/// 3. The reduce task and one forwarding task per middleware
///
/// Handles are cheap to clone and share the same store. When the last handle
/// is dropped the store is released.
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
///
/// # Example
///
/// ```ignore
/// let store = Store::new(CounterReducer, CounterState::default(), middlewares![]);
///
/// let binding = store.bind(Arc::new(view));
/// store.dispatch(|| CounterAction::Decrement(1));
/// ```
pub struct Store<S, A> {
    inner: Arc<Inner<S, A>>,
}

impl<S, A> Store<S, A>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    A: Action,
{
    /// Create a new store with a reducer, an initial state and middlewares
    ///
    /// Uses [`StoreConfig::default`]. Nothing is dispatched during
    /// construction.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new<R>(reducer: R, initial_state: S, middlewares: Middlewares<S, A>) -> Self
    where
        R: Reducer<State = S, Action = A> + 'static,
    {
        Self::with_config(reducer, initial_state, middlewares, StoreConfig::default())
    }

    /// Create a new store with custom configuration
    ///
    /// # Arguments
    ///
    /// - `reducer`: The reducer (state transitions)
    /// - `initial_state`: The first published state
    /// - `middlewares`: Side effects, bound once here
    /// - `config`: Relay backlog warnings
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn with_config<R>(
        reducer: R,
        initial_state: S,
        middlewares: Middlewares<S, A>,
        config: StoreConfig,
    ) -> Self
    where
        R: Reducer<State = S, Action = A> + 'static,
    {
        let (queue, receiver) = mpsc::unbounded_channel();
        let actions = ActionRelay::with_backlog_warning(config.action_backlog_warning);
        let state =
            StateRelay::with_backlog_warning(initial_state.clone(), config.state_backlog_warning);
        let pipelines = CompositeDisposable::new();
        let middleware_count = middlewares.len();

        let feed: Option<ActionRelay<(A, S)>> = (middleware_count > 0)
            .then(|| ActionRelay::with_backlog_warning(config.action_backlog_warning));

        // Inputs are subscribed before the reduce task exists, so middlewares
        // observe every action.
        if let Some(feed) = &feed {
            for (index, middleware) in middlewares.into_iter().enumerate() {
                let output = middleware.bind(state.channel(), ActionFeed::new(feed.subscribe()));
                let task = tokio::spawn(forward_middleware(index, output, queue.clone()));
                pipelines.add(Disposable::from_task(task.abort_handle()));
            }
        }

        let task = tokio::spawn(reduce_and_publish(
            reducer,
            initial_state,
            receiver,
            Publication {
                state: state.clone(),
                actions: actions.clone(),
                feed,
            },
        ));
        pipelines.add(Disposable::from_task(task.abort_handle()));

        tracing::debug!(
            middlewares = middleware_count,
            action_backlog_warning = config.action_backlog_warning,
            state_backlog_warning = config.state_backlog_warning,
            "Store created"
        );

        Self {
            inner: Arc::new(Inner {
                queue,
                actions,
                state,
                pipelines,
                released: AtomicBool::new(false),
            }),
        }
    }

    /// Dispatch an action produced by a thunk
    ///
    /// The thunk is evaluated exactly once, by the reduce task, when every
    /// previously queued action has been reduced. It may therefore read
    /// [`current_state`](Self::current_state) to decide which action to
    /// produce.
    ///
    /// # Returns
    ///
    /// A handle that cancels the dispatch while it is still queued. Once the
    /// action was delivered the handle reports disposed and disposing it is a
    /// no-op.
    ///
    /// Dispatching into a released store has no effect.
    pub fn dispatch<F>(&self, thunk: F) -> Disposable
    where
        F: FnOnce() -> A + Send + 'static,
    {
        let handle = Disposable::new();
        if self.is_released() {
            tracing::trace!("Dispatch ignored: store released");
            handle.dispose();
            return handle;
        }

        let delivered = handle.clone();
        let produce = Box::new(move || {
            let action = thunk();
            delivered.dispose();
            action
        });

        self.enqueue(Pending::Deferred {
            produce,
            guard: handle.clone(),
        });
        handle
    }

    /// Dispatch one action per element of an event stream
    ///
    /// Every element is mapped through `action_from_event` by the reduce task,
    /// in element order. Elements of different streams interleave.
    ///
    /// # Returns
    ///
    /// A handle that stops consuming the stream and drops its elements that
    /// are queued but not yet reduced. Other subscriptions are unaffected.
    /// Once the stream ended and its last element was reduced the handle
    /// reports disposed.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn dispatch_events<T, E, F>(&self, events: E, action_from_event: F) -> Disposable
    where
        E: Stream<Item = T> + Send + 'static,
        T: Send + 'static,
        F: Fn(T) -> A + Send + Sync + 'static,
    {
        let handle = Disposable::new();
        if self.is_released() {
            tracing::trace!("Event dispatch ignored: store released");
            handle.dispose();
            return handle;
        }

        let mapper = Arc::new(action_from_event);
        let queue = self.inner.queue.clone();
        let guard = handle.clone();

        let task = tokio::spawn(async move {
            let mut events = std::pin::pin!(events);
            while let Some(event) = events.next().await {
                let mapper = Arc::clone(&mapper);
                let pending = Pending::Deferred {
                    produce: Box::new(move || mapper(event)),
                    guard: guard.clone(),
                };

                if queue.send(pending).is_err() {
                    tracing::trace!("Event stream detached: store released");
                    break;
                }
                counter!(ACTIONS_DISPATCHED).increment(1);
            }

            tracing::trace!("Event stream completed");
            let _ = queue.send(Pending::Finished(guard));
        });

        handle.attach(task.abort_handle());
        handle
    }

    /// Bind a view to the state relay
    ///
    /// The view first renders the current state, then every later published
    /// state in order. Renders for one binding run on a dedicated task and
    /// never overlap.
    ///
    /// # Returns
    ///
    /// A handle that stops rendering into this view.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn bind<V>(&self, view: Arc<V>) -> Disposable
    where
        V: View<S> + ?Sized + 'static,
    {
        // Subscribed here, not in the task: the binding replays the state
        // current at bind time.
        let mut states = self.inner.state.subscribe();

        let task = tokio::spawn(async move {
            while let Some(state) = states.next().await {
                view.render(&state);
            }
        });

        tracing::trace!("View bound");
        Disposable::from_task(task.abort_handle())
    }

    /// The latest published state
    #[must_use]
    pub fn current_state(&self) -> S {
        self.inner.state.value()
    }

    /// Read-only handle to the state relay (replays the latest state)
    #[must_use]
    pub fn state(&self) -> StateChannel<S> {
        self.inner.state.channel()
    }

    /// Read-only handle to the action relay (no replay)
    ///
    /// Every reduced action is published here after its reduction, whether it
    /// was dispatched or emitted by a middleware.
    #[must_use]
    pub fn actions(&self) -> ActionChannel<A> {
        self.inner.actions.channel()
    }

    /// Dispatch an action and wait for a matching action
    ///
    /// Designed for request-response flows (for example waiting until a
    /// middleware reports the outcome of a fetch).
    ///
    /// # How It Works
    ///
    /// 1. Subscribe to the action relay BEFORE dispatching (avoids races)
    /// 2. Dispatch the thunk
    /// 3. Return the first action matching the predicate, the dispatched
    ///    action included
    ///
    /// # Errors
    ///
    /// - [`StoreError::Released`]: The store was released
    /// - [`StoreError::Timeout`]: No matching action within `timeout`
    /// - [`StoreError::ChannelClosed`]: The action relay closed while waiting
    ///
    /// # Example
    ///
    /// ```ignore
    /// let outcome = store
    ///     .dispatch_and_wait_for(
    ///         || PostsAction::Load,
    ///         |action| matches!(action, PostsAction::Loaded(_) | PostsAction::Failed(_)),
    ///         Duration::from_secs(10),
    ///     )
    ///     .await?;
    /// ```
    pub async fn dispatch_and_wait_for<F, P>(
        &self,
        thunk: F,
        predicate: P,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: FnOnce() -> A + Send + 'static,
        P: Fn(&A) -> bool,
    {
        if self.is_released() {
            return Err(StoreError::Released);
        }

        // Subscribe BEFORE dispatching to avoid race condition
        let mut actions = self.inner.actions.subscribe();
        self.dispatch(thunk);

        tokio::time::timeout(timeout, async {
            while let Some(action) = actions.next().await {
                if predicate(&action) {
                    return Ok(action);
                }
            }
            Err(StoreError::ChannelClosed)
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    fn enqueue(&self, pending: Pending<A>) {
        if self.inner.queue.send(pending).is_err() {
            tracing::trace!("Dispatch ignored: store pipeline stopped");
            return;
        }
        counter!(ACTIONS_DISPATCHED).increment(1);
    }
}

impl<S, A> Store<S, A> {
    /// Release the store
    ///
    /// Stops the reduce task and every middleware task. Permanent and
    /// idempotent. Bound views stay subscribed but receive nothing new;
    /// later dispatches are ignored.
    pub fn release(&self) {
        self.inner.release();
    }

    /// Whether [`release`](Self::release) was called
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> std::fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("released", &self.inner.released.load(Ordering::Acquire))
            .field("pipelines", &self.inner.pipelines.len())
            .finish_non_exhaustive()
    }
}

/// Where the reduce task publishes
struct Publication<S, A> {
    state: StateRelay<S>,
    actions: ActionRelay<A>,
    /// Actions paired with their resulting state; absent without middlewares
    feed: Option<ActionRelay<(A, S)>>,
}

/// The reduce-and-publish loop
async fn reduce_and_publish<R, S, A>(
    reducer: R,
    mut latest: S,
    mut queue: mpsc::UnboundedReceiver<Pending<A>>,
    publication: Publication<S, A>,
) where
    R: Reducer<State = S, Action = A>,
    S: Clone + PartialEq + Send + 'static,
    A: Action,
{
    while let Some(pending) = queue.recv().await {
        let Some(action) = pending.resolve() else {
            continue;
        };

        let span = tracing::trace_span!("reduce", action = action.describe());
        let _enter = span.enter();

        let start = Instant::now();
        let reduced = catch_unwind(AssertUnwindSafe(|| reducer.reduce(&latest, &action)));
        histogram!(REDUCER_DURATION).record(start.elapsed().as_secs_f64());

        let Ok(next) = reduced else {
            tracing::error!(
                action = action.describe(),
                "Reducer panicked, store stopped publishing state"
            );
            counter!(REDUCER_PANICKED).increment(1);
            return;
        };
        counter!(ACTIONS_REDUCED).increment(1);

        if next == latest {
            tracing::trace!("State unchanged, publication suppressed");
            counter!(STATES_SUPPRESSED).increment(1);
        } else {
            latest = next;
            publication.state.accept(latest.clone());
            tracing::trace!("State published");
            counter!(STATES_PUBLISHED).increment(1);
        }

        if let Some(feed) = &publication.feed {
            feed.accept((action.clone(), latest.clone()));
        }
        publication.actions.accept(action);
    }

    tracing::debug!("Action queue closed, reduce task finished");
}

/// Queue every action a middleware emits, isolating its panics
async fn forward_middleware<A: Action>(
    index: usize,
    output: ActionStream<A>,
    queue: mpsc::UnboundedSender<Pending<A>>,
) {
    let forwarding = async move {
        let mut output = output;
        while let Some(action) = output.next().await {
            tracing::trace!(
                middleware = index,
                action = action.describe(),
                "Middleware emitted action"
            );
            counter!(MIDDLEWARE_ACTIONS).increment(1);

            if queue.send(Pending::Ready(action)).is_err() {
                break;
            }
        }
    };

    if AssertUnwindSafe(forwarding).catch_unwind().await.is_err() {
        tracing::error!(
            middleware = index,
            "Middleware panicked, its actions are no longer forwarded"
        );
        counter!(MIDDLEWARE_PANICKED).increment(1);
    }
}
