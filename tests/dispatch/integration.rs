//! End-to-end flows through the Tower layer: dispatch modes, event
//! listeners, and composition with other layers.

use super::TestError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::{service_fn, Layer, Service, ServiceBuilder, ServiceExt};
use tower_async_dispatch::{AsyncDispatchLayer, ReturnKind, WorkerPool};

#[tokio::test]
async fn void_mode_never_blocks_the_caller() {
    let pool = WorkerPool::builder().worker_threads(1).build().unwrap();
    let svc = service_fn(|_req: ()| async {
        // A slow call: in void mode the caller must not wait for it.
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok::<_, TestError>(())
    });

    let mut service = AsyncDispatchLayer::new(pool).layer(svc);

    let start = Instant::now();
    let outcome = service.ready().await.unwrap().call(()).await.unwrap();
    assert!(outcome.is_detached());
    assert!(
        start.elapsed() < Duration::from_secs(1),
        "void-mode dispatch blocked the caller"
    );
}

#[tokio::test]
async fn completion_event_fires_for_detached_calls() {
    let completed = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&completed);

    let pool = WorkerPool::builder().worker_threads(1).build().unwrap();
    let svc = service_fn(|_req: ()| async { Ok::<_, TestError>(()) });

    let mut service = AsyncDispatchLayer::builder()
        .executor(pool)
        .name("audit")
        .on_complete(move |_duration| {
            cc.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .layer(svc);

    service.ready().await.unwrap().call(()).await.unwrap();

    let deadline = Instant::now() + Duration::from_secs(30);
    while completed.load(Ordering::SeqCst) == 0 {
        assert!(Instant::now() < deadline, "completion event never arrived");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn failure_of_detached_call_is_only_visible_through_events() {
    let failed = Arc::new(AtomicUsize::new(0));
    let fc = Arc::clone(&failed);

    let pool = WorkerPool::builder().worker_threads(1).build().unwrap();
    let svc =
        service_fn(|_req: ()| async { Err::<(), _>(TestError("write failed".to_string())) });

    let mut service = AsyncDispatchLayer::builder()
        .executor(pool)
        .return_kind(ReturnKind::Void)
        .on_error(move |_duration| {
            fc.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .layer(svc);

    // The caller still sees a detached success.
    let outcome = service.ready().await.unwrap().call(()).await.unwrap();
    assert!(outcome.is_detached());

    let deadline = Instant::now() + Duration::from_secs(30);
    while failed.load(Ordering::SeqCst) == 0 {
        assert!(Instant::now() < deadline, "failure event never arrived");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn shared_pool_across_cloned_services() {
    let pool = WorkerPool::builder().worker_threads(2).build().unwrap();
    let svc = service_fn(|req: u32| async move { Ok::<_, TestError>(req + 1) });

    let service = ServiceBuilder::new()
        .layer(
            AsyncDispatchLayer::builder()
                .executor(pool)
                .return_kind(ReturnKind::Handle)
                .build(),
        )
        .service(svc);

    let mut tasks = Vec::new();
    for i in 0..10 {
        let mut svc = service.clone();
        tasks.push(tokio::spawn(async move {
            let dispatched = svc.ready().await.unwrap().call(i).await.unwrap();
            dispatched
                .into_handle()
                .unwrap()
                .get_timeout(Duration::from_secs(30))
                .await
                .unwrap()
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        assert_eq!(task.await.unwrap(), i as u32 + 1);
    }
}
