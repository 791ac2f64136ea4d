//! Integration tests for the message screen

#![allow(clippy::unwrap_used)] // Test code can use unwrap

use futures::stream;
use message::{MESSAGE, MainAction, MainState, MainViewModel, main_store};
use rxmvi_testing::{RecordingView, TestObserver};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_click_shows_message() {
    let view_model = MainViewModel::new(main_store());
    let states = TestObserver::new(view_model.state().subscribe());

    view_model.show_message(stream::iter([()]));

    assert_eq!(
        states.await_count(2).await,
        vec![
            MainState::default(),
            MainState {
                message: MESSAGE.to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_repeated_clicks_render_once() {
    let mut view_model = MainViewModel::new(main_store());
    let view = Arc::new(RecordingView::new());
    view_model.activate(view.clone()).unwrap();

    view_model.show_message(stream::iter([(), (), ()]));
    view.await_renders(2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(view.renders().len(), 2);
    assert_eq!(view.last_render().unwrap().message, MESSAGE);
}

#[tokio::test]
async fn test_every_click_still_reaches_the_action_channel() {
    let store = main_store();
    let actions = TestObserver::new(store.actions().subscribe());

    store.dispatch_events(stream::iter([(), ()]), |()| {
        MainAction::ShowMessage(MESSAGE.to_string())
    });

    assert_eq!(actions.await_count(2).await.len(), 2);
}
