//! Behavior of the pending-result handle: bounded waits, error replay,
//! status queries, and best-effort cancellation.

use super::TestError;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tower_async_dispatch::Dispatcher;

#[tokio::test]
async fn get_timeout_yields_timeout_not_failure() {
    let dispatcher = Dispatcher::on(Handle::current());
    let handle = dispatcher.dispatch(async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok::<_, TestError>(())
    });

    let err = handle.get_timeout(Duration::from_millis(20)).await.unwrap_err();
    assert!(err.is_timeout());
    assert!(!err.is_cancelled());
    assert_eq!(err.into_inner(), None);
}

#[tokio::test]
async fn execution_error_is_replayed_to_the_consumer() {
    let dispatcher = Dispatcher::on(Handle::current());
    let handle =
        dispatcher.dispatch(async { Err::<(), _>(TestError("backend down".to_string())) });

    let err = handle.get().await.unwrap_err();
    assert!(!err.is_timeout());
    assert_eq!(err.into_inner(), Some(TestError("backend down".to_string())));
}

#[tokio::test]
async fn handle_becomes_done_exactly_once() {
    let dispatcher = Dispatcher::on(Handle::current());
    let handle = dispatcher.dispatch(async { Ok::<_, TestError>("done") });

    let deadline = Instant::now() + Duration::from_secs(30);
    while !handle.is_done() {
        assert!(Instant::now() < deadline, "call never settled");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Done stays set; the value is still retrievable afterwards.
    assert!(handle.is_done());
    assert_eq!(handle.get().await.unwrap(), "done");
}

#[tokio::test]
async fn soft_cancel_is_best_effort_and_may_always_fail() {
    let dispatcher = Dispatcher::on(Handle::current());
    let mut handle = dispatcher.dispatch(async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        Ok::<_, TestError>("completed")
    });

    // Without interruption a running call is never cancelled.
    assert!(!handle.cancel(false));
    assert!(!handle.is_cancelled());
    assert_eq!(
        handle.get_timeout(Duration::from_secs(30)).await.unwrap(),
        "completed"
    );
}

#[tokio::test]
async fn interrupting_cancel_aborts_a_pending_call() {
    let dispatcher = Dispatcher::on(Handle::current());
    let mut handle = dispatcher.dispatch(async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok::<_, TestError>(())
    });

    assert!(handle.cancel(true));
    assert!(handle.is_cancelled());

    let err = handle.get_timeout(Duration::from_secs(30)).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn handle_is_a_future() {
    let dispatcher = Dispatcher::on(Handle::current());
    let handle = dispatcher.dispatch(async { Ok::<_, TestError>(7) });

    // Awaiting the handle directly is equivalent to get().
    assert_eq!(handle.await.unwrap(), 7);
}
