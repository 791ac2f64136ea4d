//! # Posts Example
//!
//! Loads posts from a remote API through a middleware.
//!
//! `Load` is an intent the reducer ignores. `LoadingPosts` answers it with
//! `Loading`, then `Loaded(posts)` or `Failed(reason)`; fetch failures become
//! data, never errors of the store.

use futures::{StreamExt, future};
use rxmvi_core::effect::framed;
use rxmvi_core::middleware::Middleware;
use rxmvi_core::{ActionFeed, ActionStream, Disposable, Reducer, StateChannel, View};
use rxmvi_macros::Action;
use rxmvi_runtime::{BinderError, Store, ViewModel};
use std::sync::Arc;

pub mod api;

pub use api::{FetchError, PostEntity, PostsApi, TypicodeClient};

/// A post as shown on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Post id
    pub id: u64,
    /// Author id
    pub user_id: u64,
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
}

impl From<PostEntity> for Post {
    fn from(entity: PostEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            title: entity.title,
            body: entity.body,
        }
    }
}

/// Posts screen state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostsState {
    /// A request is in flight
    pub loading: bool,
    /// The last request finished, successfully or not
    pub loaded: bool,
    /// Posts of the last successful request
    pub posts: Vec<Post>,
    /// Reason the last request failed
    pub error: Option<String>,
}

/// Posts actions
#[derive(Action, Debug, Clone, PartialEq, Eq)]
pub enum PostsAction {
    /// Ask for posts
    #[intent]
    Load,
    /// A request started
    #[effect]
    Loading,
    /// A request succeeded
    #[effect]
    Loaded(Vec<Post>),
    /// A request failed
    #[effect]
    Failed(String),
}

/// Posts reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct PostsReducer;

impl Reducer for PostsReducer {
    type State = PostsState;
    type Action = PostsAction;

    fn reduce(&self, state: &PostsState, action: &PostsAction) -> PostsState {
        match action {
            PostsAction::Load => state.clone(),
            PostsAction::Loading => PostsState {
                loading: true,
                loaded: false,
                error: None,
                ..state.clone()
            },
            PostsAction::Loaded(posts) => PostsState {
                loading: false,
                loaded: true,
                posts: posts.clone(),
                error: None,
            },
            PostsAction::Failed(reason) => PostsState {
                loading: false,
                loaded: true,
                error: Some(reason.clone()),
                ..state.clone()
            },
        }
    }
}

/// Fetches posts for every `Load`
///
/// Requests triggered by consecutive loads run concurrently.
#[derive(Clone)]
pub struct LoadingPosts {
    api: Arc<dyn PostsApi>,
}

impl LoadingPosts {
    /// Middleware over a posts source
    #[must_use]
    pub fn new(api: Arc<dyn PostsApi>) -> Self {
        Self { api }
    }
}

impl std::fmt::Debug for LoadingPosts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingPosts").finish_non_exhaustive()
    }
}

impl Middleware for LoadingPosts {
    type State = PostsState;
    type Action = PostsAction;

    fn bind(
        &self,
        _state: StateChannel<PostsState>,
        actions: ActionFeed<PostsAction, PostsState>,
    ) -> ActionStream<PostsAction> {
        let api = Arc::clone(&self.api);

        actions
            .filter(|action| future::ready(*action == PostsAction::Load))
            .flat_map_unordered(None, move |_| {
                let api = Arc::clone(&api);
                let request = async move { api.posts().await };

                framed(
                    request,
                    PostsAction::Loading,
                    |entities| PostsAction::Loaded(entities.into_iter().map(Post::from).collect()),
                    |error: FetchError| {
                        tracing::warn!(%error, "Loading posts failed");
                        PostsAction::Failed(error.to_string())
                    },
                )
            })
            .boxed()
    }
}

/// Build the posts store
#[must_use]
pub fn posts_store(api: Arc<dyn PostsApi>) -> Store<PostsState, PostsAction> {
    Store::new(
        PostsReducer,
        PostsState::default(),
        rxmvi_core::middlewares![LoadingPosts::new(api)],
    )
}

/// View model of the posts screen
pub struct PostsViewModel {
    binder: ViewModel<PostsState, PostsAction>,
}

impl PostsViewModel {
    /// Wrap a posts store
    #[must_use]
    pub fn new(store: Store<PostsState, PostsAction>) -> Self {
        Self {
            binder: ViewModel::new(store),
        }
    }

    /// Ask for posts
    pub fn load_posts(&self) -> Disposable {
        self.binder.dispatch(|| PostsAction::Load)
    }

    /// Attach a view
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::Terminated`] after [`terminate`](Self::terminate).
    pub fn activate<V>(&mut self, view: Arc<V>) -> Result<(), BinderError>
    where
        V: View<PostsState> + ?Sized + 'static,
    {
        self.binder.activate(view)
    }

    /// Detach the view
    pub fn deactivate(&mut self) {
        self.binder.deactivate();
    }

    /// Release the store
    pub fn terminate(&mut self) {
        self.binder.terminate();
    }

    /// Read-only state channel
    #[must_use]
    pub fn state(&self) -> StateChannel<PostsState> {
        self.binder.state()
    }
}
