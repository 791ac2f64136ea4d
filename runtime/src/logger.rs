//! Middleware that logs every action together with the state it produced.
//!
//! Entries are emitted through `tracing` with target [`TARGET`]:
//!
//! ```text
//! action type = Increment; current state = { CounterState { result: 1, .. } }
//! ```

use futures::StreamExt;
use rxmvi_core::middleware::{Middleware, with_latest_state};
use rxmvi_core::{Action, ActionFeed, ActionStream, StateChannel};
use std::fmt::Debug;
use std::marker::PhantomData;

/// Tracing target of every log entry.
pub const TARGET: &str = "rxmvi-logger";

/// Format a single log entry.
#[must_use]
pub fn format_entry<A: Action, S: Debug>(action: &A, state: &S) -> String {
    format!(
        "action type = {}; current state = {{ {state:?} }}",
        action.describe()
    )
}

/// Logs each action with the state its reduction produced; never emits actions.
///
/// [`LoggerMiddleware::new`] is silent in release builds, mirroring a
/// debug-only logger. Use [`LoggerMiddleware::always`] to log regardless of the
/// build profile.
pub struct LoggerMiddleware<S, A> {
    enabled: bool,
    _marker: PhantomData<fn() -> (S, A)>,
}

impl<S, A> LoggerMiddleware<S, A> {
    /// Logger active in debug builds only
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: cfg!(debug_assertions),
            _marker: PhantomData,
        }
    }

    /// Logger active in every build
    #[must_use]
    pub const fn always() -> Self {
        Self {
            enabled: true,
            _marker: PhantomData,
        }
    }

    /// Whether entries are written
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl<S, A> Default for LoggerMiddleware<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> Debug for LoggerMiddleware<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerMiddleware")
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl<S, A> Middleware for LoggerMiddleware<S, A>
where
    S: Clone + Debug + Send + Sync + 'static,
    A: Action,
{
    type State = S;
    type Action = A;

    fn bind(&self, _state: StateChannel<S>, actions: ActionFeed<A, S>) -> ActionStream<A> {
        if !self.enabled {
            return Box::pin(futures::stream::empty());
        }

        with_latest_state(actions)
            .filter_map(|(action, latest)| {
                tracing::info!(target: TARGET, "{}", format_entry(&action, &latest));
                futures::future::ready(None::<A>)
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxmvi_core::channel::{ActionRelay, StateRelay};
    use std::sync::{Arc, Mutex, PoisonError};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Debug, Clone, PartialEq)]
    enum Ping {
        Ping,
    }

    impl Action for Ping {
        fn describe(&self) -> &'static str {
            "Ping"
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Pongs {
        count: u32,
    }

    #[test]
    fn entry_format() {
        let entry = format_entry(&Ping::Ping, &Pongs { count: 3 });
        assert_eq!(entry, "action type = Ping; current state = { Pongs { count: 3 } }");
    }

    #[test]
    fn always_is_enabled() {
        assert!(LoggerMiddleware::<Pongs, Ping>::always().is_enabled());
        assert_eq!(
            LoggerMiddleware::<Pongs, Ping>::new().is_enabled(),
            cfg!(debug_assertions)
        );
    }

    #[tokio::test]
    async fn emits_no_actions() {
        let feed = ActionRelay::new();
        let state = StateRelay::new(Pongs { count: 0 });
        let logger = LoggerMiddleware::always();

        let output = logger.bind(state.channel(), ActionFeed::new(feed.subscribe()));
        feed.accept((Ping::Ping, Pongs { count: 0 }));
        drop(feed);

        let emitted: Vec<Ping> = output.collect().await;
        assert!(emitted.is_empty());
    }

    /// Collects the formatted message of every event
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<String>>>);

    impl<Sub: tracing::Subscriber> tracing_subscriber::Layer<Sub> for Captured {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, Sub>,
        ) {
            struct Message<'a>(&'a mut Vec<String>);

            impl tracing::field::Visit for Message<'_> {
                fn record_debug(
                    &mut self,
                    field: &tracing::field::Field,
                    value: &dyn std::fmt::Debug,
                ) {
                    if field.name() == "message" {
                        self.0.push(format!("{value:?}"));
                    }
                }
            }

            if event.metadata().target() != TARGET {
                return;
            }
            let mut entries = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            event.record(&mut Message(&mut entries));
        }
    }

    #[test]
    fn logs_the_state_captured_with_each_action() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::registry().with(captured.clone());

        tracing::subscriber::with_default(subscriber, || {
            tokio_test::block_on(async {
                let feed = ActionRelay::new();
                // The relay already moved on; the logger must not read it
                let state = StateRelay::new(Pongs { count: 99 });
                let output = LoggerMiddleware::always()
                    .bind(state.channel(), ActionFeed::new(feed.subscribe()));

                feed.accept((Ping::Ping, Pongs { count: 1 }));
                feed.accept((Ping::Ping, Pongs { count: 2 }));
                drop(feed);
                let _: Vec<Ping> = output.collect().await;
            });
        });

        let entries = captured.0.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert_eq!(
            entries,
            vec![
                "action type = Ping; current state = { Pongs { count: 1 } }",
                "action type = Ping; current state = { Pongs { count: 2 } }",
            ]
        );
    }
}
