//! Metric names recorded by the store runtime.
//!
//! The runtime records through the `metrics` facade only. Installing a
//! recorder (Prometheus, statsd, ...) is left to the application; without one
//! every call is a no-op.
//!
//! # Example
//!
//! ```
//! // Register descriptions once, after the application installed its recorder
//! rxmvi_runtime::metrics::describe_metrics();
//! ```

use metrics::{Unit, describe_counter, describe_histogram};

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Actions queued through `dispatch`/`dispatch_events`.
pub const ACTIONS_DISPATCHED: &str = "rxmvi.store.actions.dispatched";

/// Actions reduced by the pipeline.
pub const ACTIONS_REDUCED: &str = "rxmvi.store.actions.reduced";

/// Queued dispatches skipped because their handle was disposed.
pub const DISPATCHES_CANCELLED: &str = "rxmvi.store.dispatches.cancelled";

/// Dispatch thunks or event mappers that panicked.
pub const DISPATCHES_PANICKED: &str = "rxmvi.store.dispatches.panicked";

/// States published on the state relay.
pub const STATES_PUBLISHED: &str = "rxmvi.store.states.published";

/// States suppressed because they equal the previous one.
pub const STATES_SUPPRESSED: &str = "rxmvi.store.states.suppressed";

/// Actions emitted by middlewares.
pub const MIDDLEWARE_ACTIONS: &str = "rxmvi.store.middleware.actions";

/// Middleware streams that ended with a panic.
pub const MIDDLEWARE_PANICKED: &str = "rxmvi.store.middleware.panicked";

/// Reducer panics (fatal for the store pipeline).
pub const REDUCER_PANICKED: &str = "rxmvi.store.reducer.panicked";

/// Reducer execution time.
pub const REDUCER_DURATION: &str = "rxmvi.store.reducer.duration_seconds";

/// Stores released.
pub const STORES_RELEASED: &str = "rxmvi.store.released";

/// Register descriptions for every runtime metric.
pub fn describe_metrics() {
    describe_counter!(
        ACTIONS_DISPATCHED,
        Unit::Count,
        "Actions queued through dispatch or dispatch_events"
    );
    describe_counter!(ACTIONS_REDUCED, Unit::Count, "Actions reduced by the store pipeline");
    describe_counter!(
        DISPATCHES_CANCELLED,
        Unit::Count,
        "Queued dispatches skipped because their handle was disposed"
    );
    describe_counter!(
        DISPATCHES_PANICKED,
        Unit::Count,
        "Dispatch thunks or event mappers that panicked"
    );
    describe_counter!(STATES_PUBLISHED, Unit::Count, "States published to subscribers");
    describe_counter!(
        STATES_SUPPRESSED,
        Unit::Count,
        "States suppressed because they equal the previous state"
    );
    describe_counter!(MIDDLEWARE_ACTIONS, Unit::Count, "Actions emitted by middlewares");
    describe_counter!(
        MIDDLEWARE_PANICKED,
        Unit::Count,
        "Middleware streams that ended with a panic"
    );
    describe_counter!(REDUCER_PANICKED, Unit::Count, "Reducer panics");
    describe_histogram!(REDUCER_DURATION, Unit::Seconds, "Reducer execution time");
    describe_counter!(STORES_RELEASED, Unit::Count, "Stores released");
}
