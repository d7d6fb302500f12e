//! Return-type contract tests: a call declared to return anything other
//! than void or a handle must fail fast, before any background work.

use super::TestError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{service_fn, Layer, Service, ServiceExt};
use tower_async_dispatch::{AsyncDispatchLayer, DispatchError, ReturnKind, WorkerPool};

#[tokio::test]
async fn primitive_return_kind_is_rejected() {
    let pool = WorkerPool::builder().worker_threads(1).build().unwrap();
    let svc = service_fn(|_req: ()| async { Ok::<_, TestError>(0_i32) });

    let mut service = AsyncDispatchLayer::builder()
        .executor(pool)
        .return_kind(ReturnKind::Other("i32"))
        .build()
        .layer(svc);

    let err = service.ready().await.unwrap().call(()).await.unwrap_err();
    assert_eq!(err, DispatchError::UnsupportedReturnType { declared: "i32" });
}

#[tokio::test]
async fn rejection_happens_before_any_dispatch() {
    let invoked = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&invoked);

    let pool = WorkerPool::builder().worker_threads(1).build().unwrap();
    let svc = service_fn(move |_req: ()| {
        let flag = Arc::clone(&flag);
        async move {
            flag.store(true, Ordering::SeqCst);
            Ok::<_, TestError>(())
        }
    });

    let mut service = AsyncDispatchLayer::builder()
        .executor(pool)
        .return_kind(ReturnKind::Other("Vec<u8>"))
        .build()
        .layer(svc);

    for _ in 0..3 {
        let result = service.ready().await.unwrap().call(()).await;
        assert!(result.is_err());
    }

    // Give a would-be background task every chance to run before checking.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(
        !invoked.load(Ordering::SeqCst),
        "inner service ran despite the contract violation"
    );
}

#[tokio::test]
async fn rejection_emits_event_with_declared_type() {
    let rejected = Arc::new(AtomicUsize::new(0));
    let rc = Arc::clone(&rejected);

    let pool = WorkerPool::builder().worker_threads(1).build().unwrap();
    let svc = service_fn(|_req: ()| async { Ok::<_, TestError>(()) });

    let mut service = AsyncDispatchLayer::builder()
        .executor(pool)
        .return_kind(ReturnKind::Other("i32"))
        .on_rejected(move |declared| {
            assert_eq!(declared, "i32");
            rc.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .layer(svc);

    let _ = service.ready().await.unwrap().call(()).await;
    // Emitted synchronously within the rejected call.
    assert_eq!(rejected.load(Ordering::SeqCst), 1);
}

#[test]
fn supported_kinds() {
    assert!(ReturnKind::Void.is_supported());
    assert!(ReturnKind::Handle.is_supported());
    assert!(!ReturnKind::Other("String").is_supported());
}
