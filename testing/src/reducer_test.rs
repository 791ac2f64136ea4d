//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use rxmvi_core::reducer::Reducer;

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S, &S)>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// Actions given to [`when_action`](Self::when_action) are folded in order,
/// the way the store would reduce them.
///
/// # Example
///
/// ```ignore
/// use rxmvi_testing::ReducerTest;
///
/// ReducerTest::new(CounterReducer)
///     .given_state(CounterState::default())
///     .when_action(CounterAction::IncrementSuccess(3))
///     .then_state(|state| {
///         assert_eq!(state.result, 3);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A>
where
    R: Reducer<State = S, Action = A>,
{
    reducer: R,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
}

impl<R, S, A> ReducerTest<R, S, A>
where
    R: Reducer<State = S, Action = A>,
    S: Clone + PartialEq + std::fmt::Debug + 'static,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
        }
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Append an action to reduce (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Append several actions to reduce, in order (When)
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions
            .push(Box::new(move |_initial, state| assertion(state)));
        self
    }

    /// Assert that the resulting state equals the initial one (Then)
    ///
    /// An unchanged state is what the store suppresses instead of publishing.
    #[must_use]
    pub fn then_unchanged(mut self) -> Self {
        self.state_assertions.push(Box::new(|initial, state| {
            assertions::assert_unchanged(initial, state);
        }));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state or action is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let initial = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "Action must be set with when_action()"
        );

        // Execute reducer
        let state = self
            .actions
            .iter()
            .fold(initial.clone(), |state, action| self.reducer.reduce(&state, action));

        // Run state assertions
        for assertion in self.state_assertions {
            assertion(&initial, &state);
        }
    }
}

/// Helper assertions for reducer outcomes
pub mod assertions {
    use std::fmt::Debug;

    /// Assert that a reduction left the state untouched
    ///
    /// # Panics
    ///
    /// Panics if the states differ.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_unchanged<S: PartialEq + Debug>(before: &S, after: &S) {
        assert_eq!(
            before, after,
            "Expected the state to be unchanged, but it became {after:?}"
        );
    }

    /// Assert that a sequence of published states holds no equal neighbours
    ///
    /// # Panics
    ///
    /// Panics on the first pair of equal consecutive states.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_distinct_consecutive<S: PartialEq + Debug>(states: &[S]) {
        for pair in states.windows(2) {
            assert!(
                pair[0] != pair[1],
                "Expected distinct consecutive states, but {:?} was published twice",
                pair[0]
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Increment,
        Decrement,
        Ignored,
    }

    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;

        fn reduce(&self, state: &TestState, action: &TestAction) -> TestState {
            match action {
                TestAction::Increment => TestState {
                    count: state.count + 1,
                },
                TestAction::Decrement => TestState {
                    count: state.count - 1,
                },
                TestAction::Ignored => state.clone(),
            }
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(TestReducer)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_folds_actions_in_order() {
        ReducerTest::new(TestReducer)
            .given_state(TestState { count: 5 })
            .when_actions([
                TestAction::Decrement,
                TestAction::Decrement,
                TestAction::Increment,
            ])
            .then_state(|state| {
                assert_eq!(state.count, 4);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_unchanged() {
        ReducerTest::new(TestReducer)
            .given_state(TestState { count: 2 })
            .when_action(TestAction::Ignored)
            .then_unchanged()
            .run();
    }

    #[test]
    fn test_assertions_distinct_consecutive() {
        assertions::assert_distinct_consecutive(&[1, 2, 1, 3]);
        assertions::assert_distinct_consecutive::<i32>(&[]);
    }

    #[test]
    #[should_panic(expected = "published twice")]
    fn test_assertions_distinct_consecutive_rejects_repeats() {
        assertions::assert_distinct_consecutive(&[1, 1]);
    }
}
