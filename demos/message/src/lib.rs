//! # Message Example
//!
//! The smallest rxmvi screen: every click shows the same message. Clicks
//! after the first reduce to an equal state and are never re-rendered.

use futures::Stream;
use rxmvi_core::{Disposable, Reducer, StateChannel, View, middlewares};
use rxmvi_macros::Action;
use rxmvi_runtime::{BinderError, LoggerMiddleware, Store, ViewModel};
use std::sync::Arc;

/// Text shown after a click.
pub const MESSAGE: &str = "Hello from rxmvi!";

/// Message screen state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainState {
    /// Text on screen; empty until the first click
    pub message: String,
}

/// Message screen actions
#[derive(Action, Debug, Clone, PartialEq, Eq)]
pub enum MainAction {
    /// Show a message
    #[intent]
    ShowMessage(String),
}

/// Message reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct MainReducer;

impl Reducer for MainReducer {
    type State = MainState;
    type Action = MainAction;

    fn reduce(&self, _state: &MainState, action: &MainAction) -> MainState {
        match action {
            MainAction::ShowMessage(message) => MainState {
                message: message.clone(),
            },
        }
    }
}

/// Build the message store, logging every action
#[must_use]
pub fn main_store() -> Store<MainState, MainAction> {
    Store::new(
        MainReducer,
        MainState::default(),
        middlewares![LoggerMiddleware::new()],
    )
}

/// View model of the message screen
pub struct MainViewModel {
    binder: ViewModel<MainState, MainAction>,
}

impl MainViewModel {
    /// Wrap a message store
    #[must_use]
    pub fn new(store: Store<MainState, MainAction>) -> Self {
        Self {
            binder: ViewModel::new(store),
        }
    }

    /// Every click shows [`MESSAGE`]
    pub fn show_message<E>(&self, clicks: E) -> Disposable
    where
        E: Stream<Item = ()> + Send + 'static,
    {
        self.binder
            .dispatch_events(clicks, |()| MainAction::ShowMessage(MESSAGE.to_string()))
    }

    /// Attach a view
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::Terminated`] after [`terminate`](Self::terminate).
    pub fn activate<V>(&mut self, view: Arc<V>) -> Result<(), BinderError>
    where
        V: View<MainState> + ?Sized + 'static,
    {
        self.binder.activate(view)
    }

    /// Release the store
    pub fn terminate(&mut self) {
        self.binder.terminate();
    }

    /// Read-only state channel
    #[must_use]
    pub fn state(&self) -> StateChannel<MainState> {
        self.binder.state()
    }
}
