//! Hot multicast channels ("relays") connecting the store, its middlewares and its views.
//!
//! Two flavours exist:
//!
//! - [`ActionRelay`]: multicast, no history. A subscriber sees only values
//!   published after it subscribed.
//! - [`StateRelay`]: multicast, replays the latest value. A subscriber first
//!   receives the current value, then every later publication.
//!
//! Every subscriber owns an unbounded queue; the relay keeps the senders in a
//! mutex-guarded list. A slow subscriber therefore never loses values, it only
//! accumulates a backlog. The state relay keeps its latest value under the
//! same lock as its subscriber list, so a new subscriber never misses nor
//! duplicates a publication.
//!
//! Relays hand out read-only handles ([`ActionChannel`], [`StateChannel`]) for
//! consumers that must not publish. Middlewares receive an [`ActionFeed`]:
//! every action paired with the state its reduction left behind.
//!
//! # Backlog warnings
//!
//! When a subscriber's backlog reaches the relay's warning threshold a
//! warning is logged once per crossing.

use futures::{Stream, StreamExt, future, stream};
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Default backlog at which a slow subscriber is reported.
pub const DEFAULT_BACKLOG_WARNING: usize = 256;

/// Stream of actions, as produced by middlewares.
pub type ActionStream<A> = Pin<Box<dyn Stream<Item = A> + Send>>;

/// Stream of published states.
pub type StateStream<S> = Pin<Box<dyn Stream<Item = S> + Send>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Subscriber<T> {
    sender: mpsc::UnboundedSender<T>,
    backlog: Arc<AtomicUsize>,
}

/// Subscriber list shared by both relay flavours. Callers hold the lock.
struct Fanout<T> {
    subscribers: Vec<Subscriber<T>>,
    backlog_warning: usize,
    relay: &'static str,
}

impl<T> Fanout<T>
where
    T: Clone + Send + 'static,
{
    fn new(relay: &'static str, backlog_warning: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            backlog_warning: backlog_warning.max(1),
            relay,
        }
    }

    /// Deliver to every live subscriber, dropping the ones that went away.
    fn publish(&mut self, value: &T) {
        let Self {
            subscribers,
            backlog_warning,
            relay,
        } = self;

        subscribers.retain(|subscriber| {
            // Counted before sending so the receiving side never sees it negative
            let backlog = subscriber.backlog.fetch_add(1, Ordering::AcqRel) + 1;
            if subscriber.sender.send(value.clone()).is_err() {
                return false;
            }
            if backlog == *backlog_warning {
                tracing::warn!(relay = *relay, backlog, "Relay subscriber is falling behind");
            }
            true
        });

        if subscribers.is_empty() {
            tracing::trace!(relay = *relay, "Value published without subscribers");
        }
    }

    fn subscribe(&mut self) -> Pin<Box<dyn Stream<Item = T> + Send>> {
        self.subscribers
            .retain(|subscriber| !subscriber.sender.is_closed());

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let backlog = Arc::new(AtomicUsize::new(0));
        self.subscribers.push(Subscriber {
            sender,
            backlog: Arc::clone(&backlog),
        });

        Box::pin(async_stream::stream! {
            while let Some(value) = receiver.recv().await {
                backlog.fetch_sub(1, Ordering::AcqRel);
                yield value;
            }
        })
    }

    fn live_subscribers(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|subscriber| !subscriber.sender.is_closed())
            .count()
    }
}

/// Multicast relay without history, used for actions.
///
/// Subscriber streams end once every handle to the relay is dropped.
///
/// # Example
///
/// ```
/// use futures::StreamExt;
/// use rxmvi_core::channel::ActionRelay;
///
/// # tokio_test::block_on(async {
/// let relay = ActionRelay::new();
/// relay.accept("dropped: nobody listens yet");
///
/// let mut actions = relay.subscribe();
/// relay.accept("delivered");
///
/// assert_eq!(actions.next().await, Some("delivered"));
/// # });
/// ```
pub struct ActionRelay<A> {
    fanout: Arc<Mutex<Fanout<A>>>,
}

impl<A> ActionRelay<A>
where
    A: Clone + Send + 'static,
{
    /// Create a relay warning at [`DEFAULT_BACKLOG_WARNING`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_backlog_warning(DEFAULT_BACKLOG_WARNING)
    }

    /// Create a relay warning when a subscriber has `threshold` undelivered values.
    ///
    /// A threshold of zero is raised to one.
    #[must_use]
    pub fn with_backlog_warning(threshold: usize) -> Self {
        Self {
            fanout: Arc::new(Mutex::new(Fanout::new("action", threshold))),
        }
    }

    /// Publish a value to every current subscriber.
    ///
    /// Publishing without subscribers is not an error; the value is dropped.
    pub fn accept(&self, action: A) {
        lock(&self.fanout).publish(&action);
    }

    /// Subscribe to values published from now on.
    #[must_use]
    pub fn subscribe(&self) -> ActionStream<A> {
        lock(&self.fanout).subscribe()
    }

    /// Read-only handle to this relay.
    #[must_use]
    pub fn channel(&self) -> ActionChannel<A> {
        ActionChannel {
            fanout: Arc::clone(&self.fanout),
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.fanout).live_subscribers()
    }
}

impl<A> Default for ActionRelay<A>
where
    A: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for ActionRelay<A> {
    fn clone(&self) -> Self {
        Self {
            fanout: Arc::clone(&self.fanout),
        }
    }
}

impl<A> fmt::Debug for ActionRelay<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRelay").finish_non_exhaustive()
    }
}

/// Subscribe-only view of an [`ActionRelay`].
pub struct ActionChannel<A> {
    fanout: Arc<Mutex<Fanout<A>>>,
}

impl<A> ActionChannel<A>
where
    A: Clone + Send + 'static,
{
    /// Subscribe to actions published from now on.
    #[must_use]
    pub fn subscribe(&self) -> ActionStream<A> {
        lock(&self.fanout).subscribe()
    }
}

impl<A> Clone for ActionChannel<A> {
    fn clone(&self) -> Self {
        Self {
            fanout: Arc::clone(&self.fanout),
        }
    }
}

impl<A> fmt::Debug for ActionChannel<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionChannel").finish_non_exhaustive()
    }
}

/// Actions as seen by a middleware.
///
/// Each action arrives together with the state right after its reduction,
/// captured by the store when the action was published. Used directly as a
/// [`Stream`] it yields the bare actions; pass it to
/// [`with_latest_state`](crate::middleware::with_latest_state) to keep the
/// snapshots.
pub struct ActionFeed<A, S> {
    snapshots: Pin<Box<dyn Stream<Item = (A, S)> + Send>>,
}

impl<A, S> ActionFeed<A, S> {
    /// Feed over a stream of `(action, state after the action)` pairs.
    pub fn new<T>(snapshots: T) -> Self
    where
        T: Stream<Item = (A, S)> + Send + 'static,
    {
        Self {
            snapshots: Box::pin(snapshots),
        }
    }

    pub(crate) fn into_snapshots(self) -> Pin<Box<dyn Stream<Item = (A, S)> + Send>> {
        self.snapshots
    }
}

impl<A, S> Stream for ActionFeed<A, S> {
    type Item = A;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<A>> {
        self.snapshots
            .as_mut()
            .poll_next(cx)
            .map(|snapshot| snapshot.map(|(action, _)| action))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.snapshots.size_hint()
    }
}

impl<A, S> fmt::Debug for ActionFeed<A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionFeed").finish_non_exhaustive()
    }
}

struct StateSlot<S> {
    latest: S,
    fanout: Fanout<S>,
}

struct StateCell<S> {
    slot: Mutex<StateSlot<S>>,
}

impl<S> StateCell<S> {
    fn lock(&self) -> MutexGuard<'_, StateSlot<S>> {
        lock(&self.slot)
    }
}

impl<S> StateCell<S>
where
    S: Clone + Send + 'static,
{
    fn value(&self) -> S {
        self.lock().latest.clone()
    }

    fn subscribe(&self) -> StateStream<S> {
        let mut slot = self.lock();
        let current = slot.latest.clone();
        let later = slot.fanout.subscribe();
        drop(slot);

        Box::pin(stream::once(future::ready(current)).chain(later))
    }
}

/// Multicast relay that replays its latest value, used for state.
///
/// # Example
///
/// ```
/// use futures::StreamExt;
/// use rxmvi_core::channel::StateRelay;
///
/// # tokio_test::block_on(async {
/// let relay = StateRelay::new(0);
/// relay.accept(1);
/// relay.accept(2);
///
/// // Only the latest value is replayed
/// let mut states = relay.subscribe();
/// assert_eq!(states.next().await, Some(2));
///
/// relay.accept(3);
/// assert_eq!(states.next().await, Some(3));
/// # });
/// ```
pub struct StateRelay<S> {
    cell: Arc<StateCell<S>>,
}

impl<S> StateRelay<S>
where
    S: Clone + Send + 'static,
{
    /// Create a relay holding `initial`, warning at [`DEFAULT_BACKLOG_WARNING`].
    #[must_use]
    pub fn new(initial: S) -> Self {
        Self::with_backlog_warning(initial, DEFAULT_BACKLOG_WARNING)
    }

    /// Create a relay holding `initial`, warning when a subscriber has
    /// `threshold` undelivered states.
    ///
    /// A threshold of zero is raised to one.
    #[must_use]
    pub fn with_backlog_warning(initial: S, threshold: usize) -> Self {
        Self {
            cell: Arc::new(StateCell {
                slot: Mutex::new(StateSlot {
                    latest: initial,
                    fanout: Fanout::new("state", threshold),
                }),
            }),
        }
    }

    /// Replace the latest value and publish it to every subscriber.
    pub fn accept(&self, state: S) {
        let mut slot = self.cell.lock();
        // Published under the lock so that `subscribe` observes either the
        // old value plus this publication, or the new value without it.
        slot.fanout.publish(&state);
        slot.latest = state;
    }

    /// The latest value.
    #[must_use]
    pub fn value(&self) -> S {
        self.cell.value()
    }

    /// Subscribe: yields the latest value, then every later publication.
    #[must_use]
    pub fn subscribe(&self) -> StateStream<S> {
        self.cell.subscribe()
    }

    /// Read-only handle to this relay.
    #[must_use]
    pub fn channel(&self) -> StateChannel<S> {
        StateChannel {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<S> Clone for StateRelay<S> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<S> fmt::Debug for StateRelay<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateRelay").finish_non_exhaustive()
    }
}

/// Read-only view of a [`StateRelay`].
///
/// This is what middlewares receive: they may read the latest state or
/// subscribe to state changes, never publish.
pub struct StateChannel<S> {
    cell: Arc<StateCell<S>>,
}

impl<S> StateChannel<S>
where
    S: Clone + Send + 'static,
{
    /// The latest published state.
    #[must_use]
    pub fn value(&self) -> S {
        self.cell.value()
    }

    /// Subscribe: yields the latest state, then every later publication.
    #[must_use]
    pub fn subscribe(&self) -> StateStream<S> {
        self.cell.subscribe()
    }
}

impl<S> Clone for StateChannel<S> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<S> fmt::Debug for StateChannel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateChannel").finish_non_exhaustive()
    }
}
