//! Posts example binary
//!
//! Fetches posts from JSONPlaceholder (or `POSTS_BASE_URL`) and prints them.

use futures::{StreamExt, future};
use posts::{PostsState, PostsViewModel, TypicodeClient, posts_store};
use rxmvi_core::View;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SHOWN_POSTS: usize = 5;
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Prints progress, errors and the first posts
struct TerminalView;

impl View<PostsState> for TerminalView {
    fn render(&self, state: &PostsState) {
        if state.loading {
            println!("Loading posts...");
        } else if state.loaded {
            if let Some(error) = &state.error {
                println!("Error: {error}");
            }
            println!("{} posts", state.posts.len());
            for post in state.posts.iter().take(SHOWN_POSTS) {
                println!("  #{:<3} {}", post.id, post.title);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "posts=info,rxmvi_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let client = std::env::var("POSTS_BASE_URL")
        .map_or_else(|_| TypicodeClient::new(), TypicodeClient::with_base_url);
    tracing::info!(url = %client.posts_url(), "Starting posts example");

    let mut view_model = PostsViewModel::new(posts_store(Arc::new(client)));
    view_model.activate(Arc::new(TerminalView))?;

    let mut finished = view_model
        .state()
        .subscribe()
        .filter(|state| future::ready(state.loaded));
    view_model.load_posts();

    if tokio::time::timeout(LOAD_TIMEOUT, finished.next()).await.is_err() {
        tracing::warn!(timeout = ?LOAD_TIMEOUT, "Gave up waiting for posts");
    }

    view_model.terminate();
    Ok(())
}
