//! # rxmvi Testing
//!
//! Testing utilities and helpers for the rxmvi architecture.
//!
//! This crate provides:
//! - [`TestObserver`]: records every element of a stream for later assertions
//! - [`mocks::RecordingView`]: a view that records every rendered state
//! - [`ReducerTest`]: Given-When-Then helper for pure reducers
//! - [`init_test_tracing`]: opt-in log output for tests
//!
//! ## Example
//!
//! ```ignore
//! use rxmvi_testing::TestObserver;
//!
//! #[tokio::test]
//! async fn test_counter_flow() {
//!     let store = Store::new(CounterReducer, CounterState::default(), middlewares![]);
//!     let states = TestObserver::new(store.state().subscribe());
//!
//!     store.dispatch(|| CounterAction::IncrementSuccess(1));
//!
//!     states.await_count(2).await;
//!     assert_eq!(states.values()[1].result, 1);
//! }
//! ```

use futures::{Stream, StreamExt};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Ergonomic testing utilities for reducers
pub mod reducer_test;

/// How long the `await_*` helpers wait before failing a test.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(2);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Poll `condition` until it holds or `timeout` elapses.
///
/// Returns whether the condition held.
pub async fn eventually<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Records every element a stream yields
///
/// The stream is driven on a spawned task from construction on, so the
/// observer must be created before the values it should capture are
/// published.
pub struct TestObserver<T> {
    values: Arc<Mutex<Vec<T>>>,
    task: JoinHandle<()>,
}

impl<T> TestObserver<T>
where
    T: Clone + Send + 'static,
{
    /// Start recording `stream`
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new<St>(stream: St) -> Self
    where
        St: Stream<Item = T> + Send + 'static,
    {
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&values);

        let task = tokio::spawn(async move {
            let mut stream = std::pin::pin!(stream);
            while let Some(value) = stream.next().await {
                sink.lock().unwrap_or_else(PoisonError::into_inner).push(value);
            }
        });

        Self { values, task }
    }

    /// Snapshot of the recorded values
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded values
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the observed stream has ended
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until at least `count` values were recorded
    ///
    /// # Panics
    ///
    /// Panics if fewer than `count` values arrive within [`DEFAULT_WAIT`].
    #[allow(clippy::panic)] // Test assertion
    pub async fn await_count(&self, count: usize) -> Vec<T> {
        if !eventually(DEFAULT_WAIT, || self.value_count() >= count).await {
            panic!(
                "Expected at least {count} values within {DEFAULT_WAIT:?}, got {}",
                self.value_count()
            );
        }
        self.values()
    }

    /// Wait until no new value arrived for `settle`, then return every value
    pub async fn await_quiet(&self, settle: Duration) -> Vec<T> {
        let mut seen = self.value_count();
        loop {
            tokio::time::sleep(settle).await;
            let now = self.value_count();
            if now == seen {
                return self.values();
            }
            seen = now;
        }
    }
}

impl<T> Drop for TestObserver<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<T> std::fmt::Debug for TestObserver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestObserver")
            .field("complete", &self.task.is_finished())
            .finish_non_exhaustive()
    }
}

/// Mock implementations of framework traits
pub mod mocks {
    use super::{DEFAULT_WAIT, eventually};
    use rxmvi_core::View;
    use std::sync::{Mutex, PoisonError};

    /// View that records every rendered state
    ///
    /// # Example
    ///
    /// ```
    /// use rxmvi_core::View;
    /// use rxmvi_testing::mocks::RecordingView;
    ///
    /// let view = RecordingView::new();
    /// view.render(&1);
    /// view.render(&2);
    /// assert_eq!(view.renders(), vec![1, 2]);
    /// ```
    #[derive(Debug)]
    pub struct RecordingView<S> {
        renders: Mutex<Vec<S>>,
    }

    impl<S: Clone> RecordingView<S> {
        /// Create an empty recording view
        #[must_use]
        pub const fn new() -> Self {
            Self {
                renders: Mutex::new(Vec::new()),
            }
        }

        /// Every state rendered so far, in order
        #[must_use]
        pub fn renders(&self) -> Vec<S> {
            self.renders
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// The most recently rendered state
        #[must_use]
        pub fn last_render(&self) -> Option<S> {
            self.renders
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .last()
                .cloned()
        }

        /// Wait until at least `count` renders happened
        ///
        /// # Panics
        ///
        /// Panics if fewer than `count` renders happen within the default wait.
        #[allow(clippy::panic)] // Test assertion
        pub async fn await_renders(&self, count: usize) -> Vec<S> {
            let len = || {
                self.renders
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len()
            };
            if !eventually(DEFAULT_WAIT, || len() >= count).await {
                panic!("Expected at least {count} renders, got {}", len());
            }
            self.renders()
        }
    }

    impl<S: Clone> Default for RecordingView<S> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<S> View<S> for RecordingView<S>
    where
        S: Clone + Send,
    {
        fn render(&self, state: &S) {
            self.renders
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(state.clone());
        }
    }
}

/// Install a `tracing` subscriber for tests
///
/// Honours `RUST_LOG` and writes through the test harness' captured output.
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::RecordingView;
pub use reducer_test::ReducerTest;
