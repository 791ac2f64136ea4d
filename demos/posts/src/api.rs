//! JSONPlaceholder posts API

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/";

/// A post as served by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEntity {
    /// Author id
    pub user_id: u64,
    /// Post id
    pub id: u64,
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
}

/// Errors that can occur when fetching posts
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport or decoding failure
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API error (status {0})")]
    Status(u16),
}

/// Boxed future returned by [`PostsApi::posts`].
pub type PostsFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<PostEntity>, FetchError>> + Send + 'a>>;

/// Source of posts
pub trait PostsApi: Send + Sync {
    /// Fetch every post
    fn posts(&self) -> PostsFuture<'_>;
}

/// [`PostsApi`] over HTTP
#[derive(Debug, Clone)]
pub struct TypicodeClient {
    client: Client,
    base_url: String,
}

impl TypicodeClient {
    /// Client for [`DEFAULT_BASE_URL`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client for another API root
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// URL of the posts collection
    #[must_use]
    pub fn posts_url(&self) -> String {
        format!("{}/posts", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_posts(&self) -> Result<Vec<PostEntity>, FetchError> {
        let url = self.posts_url();
        tracing::debug!(%url, "Fetching posts");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Posts request rejected");
            return Err(FetchError::Status(status.as_u16()));
        }

        let posts = response.json::<Vec<PostEntity>>().await?;
        tracing::debug!(count = posts.len(), "Posts fetched");
        Ok(posts)
    }
}

impl Default for TypicodeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PostsApi for TypicodeClient {
    fn posts(&self) -> PostsFuture<'_> {
        Box::pin(self.fetch_posts())
    }
}
