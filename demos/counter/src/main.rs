//! Counter example binary
//!
//! Reads commands from stdin and renders every published state:
//!
//! - `+` increments (after the middleware's delay)
//! - `-` decrements
//! - `h` toggles the hint
//! - `q` quits

use counter::{CounterReducer, CounterState, CounterViewModel, IncrementMiddleware};
use futures::channel::mpsc;
use rxmvi_core::{View, middlewares};
use rxmvi_runtime::{LoggerMiddleware, Store, StoreConfig};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prints each state on its own line
struct TerminalView;

impl View<CounterState> for TerminalView {
    fn render(&self, state: &CounterState) {
        let mut line = format!("result = {}", state.result);
        if state.is_calculating {
            line.push_str("  (calculating...)");
        }
        if state.is_hint_displayed {
            line.push_str("  hint: '+' increments, '-' decrements, 'q' quits");
        }
        println!("{line}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter=info,rxmvi_runtime=info,rxmvi-logger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Counter Example: rxmvi ===\n");
    println!("Commands: '+' increment, '-' decrement, 'h' hint, 'q' quit\n");

    let store = Store::with_config(
        CounterReducer::new(),
        CounterState::default(),
        middlewares![IncrementMiddleware::new(), LoggerMiddleware::new()],
        StoreConfig::from_env()?,
    );

    let mut view_model = CounterViewModel::new(store);
    view_model.activate(Arc::new(TerminalView))?;

    let (increments, increment_clicks) = mpsc::unbounded();
    let (decrements, decrement_clicks) = mpsc::unbounded();
    let (hints, hint_clicks) = mpsc::unbounded();
    view_model.increment_counter(increment_clicks);
    view_model.decrement_counter(decrement_clicks);
    view_model.show_hint(hint_clicks);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "+" => increments.unbounded_send(())?,
            "-" => decrements.unbounded_send(())?,
            "h" => hints.unbounded_send(())?,
            "q" => break,
            "" => {},
            other => println!("Unknown command: {other}"),
        }
    }

    view_model.terminate();
    tracing::info!("Counter example finished");
    Ok(())
}
