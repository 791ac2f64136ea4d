//! View lifecycle binder.
//!
//! A [`ViewModel`] owns a [`Store`] and the subscriptions made on behalf of
//! one screen. The host drives it through three lifecycle calls:
//!
//! ```text
//!            activate              terminate
//! Unbound ─────────────► Bound ───────────────► Terminated
//!    ▲                     │
//!    └─────────────────────┘
//!          deactivate
//! ```
//!
//! `deactivate` only detaches the view; dispatches in flight keep running.
//! `terminate` releases the store and disposes every subscription the view
//! model made. It runs on drop as well.

use crate::Store;
use crate::error::BinderError;
use futures::Stream;
use rxmvi_core::{Action, CompositeDisposable, Disposable, StateChannel, View};
use std::sync::Arc;

/// Lifecycle state of a [`ViewModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderState {
    /// No view attached
    Unbound,
    /// A view renders the store's states
    Bound,
    /// Store released; terminal
    Terminated,
}

/// Couples one store to the lifecycle of a view
///
/// # Example
///
/// ```ignore
/// let mut model = ViewModel::new(Store::new(CounterReducer, CounterState::default(), middlewares![]));
///
/// model.activate(Arc::new(TerminalView))?;
/// model.dispatch(|| CounterAction::Increment(1));
///
/// model.terminate();
/// ```
pub struct ViewModel<S, A> {
    store: Store<S, A>,
    view_binding: Option<Disposable>,
    disposables: CompositeDisposable,
    state: BinderState,
}

impl<S, A> ViewModel<S, A>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    A: Action,
{
    /// Wrap a store
    #[must_use]
    pub fn new(store: Store<S, A>) -> Self {
        Self {
            store,
            view_binding: None,
            disposables: CompositeDisposable::new(),
            state: BinderState::Unbound,
        }
    }

    /// Attach a view
    ///
    /// The view immediately renders the current state. Activating while
    /// already bound replaces the previous view.
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::Terminated`] after [`terminate`](Self::terminate).
    pub fn activate<V>(&mut self, view: Arc<V>) -> Result<(), BinderError>
    where
        V: View<S> + ?Sized + 'static,
    {
        if self.state == BinderState::Terminated {
            return Err(BinderError::Terminated);
        }

        if let Some(previous) = self.view_binding.take() {
            previous.dispose();
        }
        self.view_binding = Some(self.store.bind(view));
        self.state = BinderState::Bound;
        tracing::debug!("View activated");
        Ok(())
    }

    /// Detach the current view, if any
    pub fn deactivate(&mut self) {
        if let Some(binding) = self.view_binding.take() {
            binding.dispose();
            tracing::debug!("View deactivated");
        }
        if self.state == BinderState::Bound {
            self.state = BinderState::Unbound;
        }
    }

    /// Dispatch through the store, tying the handle to this view model
    pub fn dispatch<F>(&self, thunk: F) -> Disposable
    where
        F: FnOnce() -> A + Send + 'static,
    {
        let handle = self.store.dispatch(thunk);
        self.disposables.add(handle.clone());
        handle
    }

    /// Dispatch an event stream through the store, tying the handle to this
    /// view model
    pub fn dispatch_events<T, E, F>(&self, events: E, action_from_event: F) -> Disposable
    where
        E: Stream<Item = T> + Send + 'static,
        T: Send + 'static,
        F: Fn(T) -> A + Send + Sync + 'static,
    {
        let handle = self.store.dispatch_events(events, action_from_event);
        self.disposables.add(handle.clone());
        handle
    }

    /// Detach the view, release the store and dispose every subscription
    ///
    /// Idempotent.
    pub fn terminate(&mut self) {
        if self.state == BinderState::Terminated {
            return;
        }

        if let Some(binding) = self.view_binding.take() {
            binding.dispose();
        }
        self.store.release();
        self.disposables.dispose();
        self.state = BinderState::Terminated;
        tracing::debug!("View model terminated");
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn binder_state(&self) -> BinderState {
        self.state
    }

    /// Read-only state channel of the underlying store
    #[must_use]
    pub fn state(&self) -> StateChannel<S> {
        self.store.state()
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &Store<S, A> {
        &self.store
    }
}

impl<S, A> Drop for ViewModel<S, A> {
    fn drop(&mut self) {
        if self.state == BinderState::Terminated {
            return;
        }

        if let Some(binding) = self.view_binding.take() {
            binding.dispose();
        }
        self.store.release();
        self.disposables.dispose();
    }
}

impl<S, A> std::fmt::Debug for ViewModel<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewModel")
            .field("state", &self.state)
            .field("subscriptions", &self.disposables.len())
            .finish_non_exhaustive()
    }
}
