//! Cancellation handles.
//!
//! Every subscribing operation of the store returns a [`Disposable`]. Disposing
//! it stops only that subscription. Handles are cheap to clone; all clones
//! share the same cancellation state.
//!
//! Dropping a handle does **not** dispose it. Fire-and-forget dispatches are
//! expected to ignore the returned handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::AbortHandle;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct Inner {
    disposed: AtomicBool,
    tasks: Mutex<Vec<AbortHandle>>,
}

/// A cancellation handle for one subscription.
///
/// A handle may own Tokio tasks (aborted on dispose) or be a bare flag checked
/// by the producer before delivering.
///
/// # Example
///
/// ```
/// use rxmvi_core::Disposable;
///
/// let handle = Disposable::new();
/// let clone = handle.clone();
///
/// clone.dispose();
/// assert!(handle.is_disposed());
///
/// // Disposing twice is a no-op
/// handle.dispose();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Disposable {
    inner: Arc<Inner>,
}

impl Disposable {
    /// Create a live handle that owns no task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle that aborts `task` when disposed.
    #[must_use]
    pub fn from_task(task: AbortHandle) -> Self {
        let handle = Self::new();
        handle.attach(task);
        handle
    }

    /// Create a handle that is already disposed.
    #[must_use]
    pub fn disposed() -> Self {
        let handle = Self::new();
        handle.dispose();
        handle
    }

    /// Tie a task to this handle.
    ///
    /// If the handle is already disposed the task is aborted right away.
    pub fn attach(&self, task: AbortHandle) {
        let mut tasks = lock(&self.inner.tasks);
        if self.is_disposed() {
            task.abort();
        } else {
            tasks.push(task);
        }
    }

    /// Cancel the subscription. Idempotent.
    pub fn dispose(&self) {
        let tasks = {
            let mut tasks = lock(&self.inner.tasks);
            if self.inner.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *tasks)
        };

        for task in tasks {
            task.abort();
        }
    }

    /// Whether the handle was disposed (or its one-shot work already delivered).
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

/// A disposal scope holding many handles.
///
/// Disposing the scope disposes every handle it holds. A handle added after
/// the scope was disposed is disposed immediately.
///
/// # Example
///
/// ```
/// use rxmvi_core::{CompositeDisposable, Disposable};
///
/// let scope = CompositeDisposable::new();
/// let first = Disposable::new();
/// scope.add(first.clone());
///
/// scope.dispose();
/// assert!(first.is_disposed());
///
/// let late = Disposable::new();
/// scope.add(late.clone());
/// assert!(late.is_disposed());
/// ```
#[derive(Debug, Default)]
pub struct CompositeDisposable {
    disposed: AtomicBool,
    handles: Mutex<Vec<Disposable>>,
}

impl CompositeDisposable {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle to the scope.
    pub fn add(&self, handle: Disposable) {
        let mut handles = lock(&self.handles);
        if self.disposed.load(Ordering::Acquire) {
            drop(handles);
            handle.dispose();
            return;
        }
        handles.retain(|held| !held.is_disposed());
        handles.push(handle);
    }

    /// Dispose every held handle and close the scope. Idempotent.
    pub fn dispose(&self) {
        let handles = {
            let mut handles = lock(&self.handles);
            if self.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *handles)
        };

        for handle in handles {
            handle.dispose();
        }
    }

    /// Whether the scope was disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Number of handles currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.handles).len()
    }

    /// Whether the scope holds no handles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn dispose_aborts_attached_task() {
        let task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let handle = Disposable::from_task(task.abort_handle());

        handle.dispose();

        let result = task.await;
        assert!(result.is_err_and(|error| error.is_cancelled()));
    }

    #[tokio::test]
    async fn attach_after_dispose_aborts_immediately() {
        let handle = Disposable::disposed();
        let task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        handle.attach(task.abort_handle());

        assert!(task.await.is_err_and(|error| error.is_cancelled()));
    }

    #[test]
    fn composite_prunes_disposed_handles() {
        let scope = CompositeDisposable::new();
        let first = Disposable::new();
        scope.add(first.clone());
        first.dispose();

        scope.add(Disposable::new());

        assert_eq!(scope.len(), 1);
        assert!(!scope.is_disposed());
    }

    #[test]
    fn composite_dispose_is_idempotent() {
        let scope = CompositeDisposable::new();
        let handle = Disposable::new();
        scope.add(handle.clone());

        scope.dispose();
        scope.dispose();

        assert!(handle.is_disposed());
        assert!(scope.is_empty());
    }
}
