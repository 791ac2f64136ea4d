//! Integration tests for the Store pipelines
//!
//! Covers state deduplication, replay of the latest state, dispatch ordering,
//! the middleware feedback loop, slow subscribers and cancellation.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use futures::{StreamExt, future};
use proptest::prelude::*;
use rxmvi_core::{ActionFeed, ActionStream, Middleware, Reducer, StateChannel, View, middlewares};
use rxmvi_macros::Action;
use rxmvi_runtime::{Store, StoreConfig};
use rxmvi_testing::{
    DEFAULT_WAIT, RecordingView, TestObserver, eventually, init_test_tracing,
    reducer_test::assertions,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
struct TestState {
    value: i32,
}

#[derive(Action, Debug, Clone, PartialEq)]
enum TestAction {
    #[intent]
    Action1,
    #[intent]
    Action2,
    #[intent]
    Set(i32),
    #[intent]
    Ignored,
    #[effect]
    Effect,
}

struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;

    fn reduce(&self, state: &TestState, action: &TestAction) -> TestState {
        match action {
            TestAction::Action1 => TestState {
                value: state.value + 1,
            },
            TestAction::Set(value) => TestState { value: *value },
            TestAction::Action2 | TestAction::Ignored | TestAction::Effect => state.clone(),
        }
    }
}

/// Answers every `Action2` with an `Effect`
struct Feedback;

impl Middleware for Feedback {
    type State = TestState;
    type Action = TestAction;

    fn bind(
        &self,
        _state: StateChannel<TestState>,
        actions: ActionFeed<TestAction, TestState>,
    ) -> ActionStream<TestAction> {
        actions
            .filter_map(|action| {
                future::ready((action == TestAction::Action2).then_some(TestAction::Effect))
            })
            .boxed()
    }
}

/// Long enough for a few hundred actions to pile up behind a stalled consumer
const STALL: Duration = Duration::from_millis(50);

/// More values than a bounded relay would have buffered
const BURST: i32 = 600;

/// Answers every `Action2` with `Action1`, stalling before the first answer
struct Stalling;

impl Middleware for Stalling {
    type State = TestState;
    type Action = TestAction;

    fn bind(
        &self,
        _state: StateChannel<TestState>,
        actions: ActionFeed<TestAction, TestState>,
    ) -> ActionStream<TestAction> {
        let mut first = true;
        actions
            .filter(|action| future::ready(*action == TestAction::Action2))
            .then(move |_| {
                let stall = std::mem::replace(&mut first, false);
                async move {
                    if stall {
                        tokio::time::sleep(STALL).await;
                    }
                    TestAction::Action1
                }
            })
            .boxed()
    }
}

/// Blocks its first render, then records every value
#[derive(Default)]
struct SlowView {
    stalled: AtomicBool,
    renders: Mutex<Vec<i32>>,
}

impl View<TestState> for SlowView {
    fn render(&self, state: &TestState) {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            std::thread::sleep(STALL);
        }
        self.renders.lock().unwrap().push(state.value);
    }
}

fn store() -> Store<TestState, TestAction> {
    init_test_tracing();
    Store::new(TestReducer, TestState::default(), middlewares![])
}

/// Dispatch an identity action and wait until the pipeline reduced it
async fn flush(store: &Store<TestState, TestAction>) {
    store
        .dispatch_and_wait_for(
            || TestAction::Ignored,
            |action| *action == TestAction::Ignored,
            Duration::from_secs(1),
        )
        .await
        .expect("pipeline should reduce the flush action");
}

const QUIET: Duration = Duration::from_millis(30);

// ============================================================================
// State publication
// ============================================================================

#[tokio::test]
async fn test_equal_state_is_not_republished() {
    let store = store();
    let states = TestObserver::new(store.state().subscribe());

    store.dispatch(|| TestAction::Ignored);
    store.dispatch(|| TestAction::Set(0));
    flush(&store).await;

    assert_eq!(states.await_quiet(QUIET).await, vec![TestState::default()]);
}

#[tokio::test]
async fn test_late_subscriber_receives_latest_state_first() {
    let store = store();
    store.dispatch(|| TestAction::Set(7));
    flush(&store).await;

    let states = TestObserver::new(store.state().subscribe());
    store.dispatch(|| TestAction::Action1);

    assert_eq!(
        states.await_count(2).await,
        vec![TestState { value: 7 }, TestState { value: 8 }]
    );
}

#[tokio::test]
async fn test_dispatch_is_reduced_and_published() {
    let store = store();
    let states = TestObserver::new(store.state().subscribe());

    store.dispatch(|| TestAction::Action1);

    assert_eq!(
        states.await_count(2).await,
        vec![TestState { value: 0 }, TestState { value: 1 }]
    );
}

#[tokio::test]
async fn test_dispatches_are_reduced_in_order() {
    let store = store();
    let states = TestObserver::new(store.state().subscribe());

    for value in 1..=5 {
        store.dispatch(move || TestAction::Set(value));
    }

    let published: Vec<i32> = states
        .await_count(6)
        .await
        .into_iter()
        .map(|state| state.value)
        .collect();
    assert_eq!(published, vec![0, 1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_thunk_observes_earlier_reductions() {
    let store = store();
    let reader = store.clone();

    store.dispatch(|| TestAction::Set(41));
    let outcome = store
        .dispatch_and_wait_for(
            move || TestAction::Set(reader.current_state().value + 1),
            |action| matches!(action, TestAction::Set(_)),
            Duration::from_secs(1),
        )
        .await;

    assert!(outcome.is_ok());
    flush(&store).await;
    assert_eq!(store.current_state().value, 42);
}

// ============================================================================
// Middleware feedback
// ============================================================================

#[tokio::test]
async fn test_middleware_effect_follows_its_trigger() {
    let store = Store::new(TestReducer, TestState::default(), middlewares![Feedback]);
    let actions = TestObserver::new(store.actions().subscribe());

    store.dispatch(|| TestAction::Action2);

    assert_eq!(
        actions.await_count(2).await,
        vec![TestAction::Action2, TestAction::Effect]
    );
    assert_eq!(
        actions.await_quiet(QUIET).await,
        vec![TestAction::Action2, TestAction::Effect]
    );
}

#[tokio::test]
async fn test_middleware_sees_every_action_once() {
    let store = Store::new(
        TestReducer,
        TestState::default(),
        middlewares![Feedback, Feedback],
    );
    let actions = TestObserver::new(store.actions().subscribe());

    store.dispatch(|| TestAction::Action2);

    let effects = actions
        .await_quiet(QUIET)
        .await
        .into_iter()
        .filter(|action| *action == TestAction::Effect)
        .count();
    assert_eq!(effects, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stalled_middleware_answers_every_action() {
    init_test_tracing();
    let store = Store::new(TestReducer, TestState::default(), middlewares![Stalling]);

    for _ in 0..BURST {
        store.dispatch(|| TestAction::Action2);
    }

    assert!(eventually(DEFAULT_WAIT, || store.current_state().value == BURST).await);
    tokio::time::sleep(QUIET).await;
    assert_eq!(store.current_state().value, BURST);
}

// ============================================================================
// Event streams
// ============================================================================

#[tokio::test]
async fn test_event_stream_maps_each_element() {
    let store = store();
    let states = TestObserver::new(store.state().subscribe());

    store.dispatch_events(futures::stream::iter(vec![3, 3, 9]), TestAction::Set);

    let published: Vec<i32> = states
        .await_quiet(QUIET)
        .await
        .into_iter()
        .map(|state| state.value)
        .collect();
    assert_eq!(published, vec![0, 3, 9]);
}

#[tokio::test]
async fn test_disposed_event_stream_stops_dispatching() {
    let store = store();
    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel::<i32>();
    let events = futures::stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|value| (value, receiver))
    });

    let handle = store.dispatch_events(events, TestAction::Set);
    sender.send(1).unwrap();
    assert!(eventually(Duration::from_secs(1), || store.current_state().value == 1).await);

    handle.dispose();
    let _ = sender.send(2);
    flush(&store).await;

    assert!(handle.is_disposed());
    assert_eq!(store.current_state().value, 1);
}

#[tokio::test]
async fn test_finished_event_stream_reports_disposed_after_its_actions() {
    let store = store();

    let handle = store.dispatch_events(futures::stream::iter(vec![1, 2, 3]), TestAction::Set);

    assert!(eventually(Duration::from_secs(1), || handle.is_disposed()).await);
    assert_eq!(store.current_state().value, 3);
}

// ============================================================================
// Views and lifecycle
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_view_renders_every_published_state() {
    let store = store();
    let view = Arc::new(SlowView::default());
    let _binding = store.bind(view.clone());

    for _ in 0..BURST {
        store.dispatch(|| TestAction::Action1);
    }

    let expected: Vec<i32> = (0..=BURST).collect();
    assert!(
        eventually(DEFAULT_WAIT, || view.renders.lock().unwrap().len() == expected.len()).await
    );
    assert_eq!(*view.renders.lock().unwrap(), expected);
}

#[tokio::test]
async fn test_bound_view_renders_current_then_updates() {
    let store = store();
    let view = Arc::new(RecordingView::new());

    let binding = store.bind(view.clone());
    store.dispatch(|| TestAction::Action1);

    assert_eq!(
        view.await_renders(2).await,
        vec![TestState { value: 0 }, TestState { value: 1 }]
    );

    binding.dispose();
    store.dispatch(|| TestAction::Action1);
    flush(&store).await;
    tokio::time::sleep(QUIET).await;

    assert_eq!(view.renders().len(), 2);
}

#[tokio::test]
async fn test_released_store_ignores_dispatches() {
    let store = store();
    let view = Arc::new(RecordingView::new());
    let _binding = store.bind(view.clone());
    view.await_renders(1).await;

    store.release();
    store.dispatch(|| TestAction::Action1);
    tokio::time::sleep(QUIET).await;

    assert_eq!(view.renders(), vec![TestState::default()]);
    assert_eq!(store.current_state(), TestState::default());
}

#[tokio::test]
async fn test_dropping_last_handle_releases_store() {
    let store = store();
    let states = store.state();
    let observer = TestObserver::new(states.subscribe());
    drop(store);

    tokio::time::sleep(QUIET).await;
    assert_eq!(observer.values(), vec![TestState::default()]);
    assert_eq!(states.value(), TestState::default());
}

#[tokio::test]
async fn test_custom_config_is_accepted() {
    let config = StoreConfig::default()
        .with_action_backlog_warning(4)
        .with_state_backlog_warning(4);
    let store = Store::with_config(TestReducer, TestState::default(), middlewares![], config);

    store.dispatch(|| TestAction::Action1);
    flush(&store).await;

    assert_eq!(store.current_state().value, 1);
}

// ============================================================================
// Properties
// ============================================================================

fn published_values(steps: Vec<i32>) -> Vec<i32> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async move {
        let store = store();
        let states = TestObserver::new(store.state().subscribe());

        for value in steps {
            store.dispatch(move || TestAction::Set(value));
        }
        flush(&store).await;

        states
            .await_quiet(Duration::from_millis(10))
            .await
            .into_iter()
            .map(|state| state.value)
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn published_states_are_the_deduplicated_reductions(
        steps in prop::collection::vec(0..3_i32, 0..40)
    ) {
        let mut expected = vec![0];
        for value in &steps {
            if expected.last() != Some(value) {
                expected.push(*value);
            }
        }

        let published = published_values(steps);

        assertions::assert_distinct_consecutive(&published);
        prop_assert_eq!(published, expected);
    }
}
