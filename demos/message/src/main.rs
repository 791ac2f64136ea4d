//! Message example binary
//!
//! Simulates a few button clicks and prints every rendered state.

use futures::stream;
use message::{MainState, MainViewModel, main_store};
use rxmvi_core::View;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CLICKS: u32 = 3;
const CLICK_INTERVAL: Duration = Duration::from_millis(300);

/// Prints the message, or a placeholder before the first click
struct TerminalView;

impl View<MainState> for TerminalView {
    fn render(&self, state: &MainState) {
        if state.message.is_empty() {
            println!("(press the button)");
        } else {
            println!("{}", state.message);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "message=info,rxmvi-logger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut view_model = MainViewModel::new(main_store());
    view_model.activate(Arc::new(TerminalView))?;

    let clicks = stream::unfold(0_u32, |sent| async move {
        if sent == CLICKS {
            return None;
        }
        tokio::time::sleep(CLICK_INTERVAL).await;
        tracing::info!(click = sent + 1, "Button clicked");
        Some(((), sent + 1))
    });
    view_model.show_message(clicks);

    tokio::time::sleep(CLICK_INTERVAL * (CLICKS + 1)).await;
    view_model.terminate();
    Ok(())
}
