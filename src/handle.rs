//! Pending-result handle for dispatched calls.

use crate::Executor;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Errors observable through an [`AsyncHandle`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TaskError<E> {
    /// The background call finished with an error, replayed here.
    #[error("background call failed: {0}")]
    Failed(E),
    /// The background call was cancelled, or its task panicked, before
    /// producing a result.
    #[error("background call was cancelled before completing")]
    Cancelled,
    /// The bounded wait elapsed before the background call finished.
    #[error("timed out after {limit:?} waiting for background call")]
    Timeout {
        /// The bound that was exceeded.
        limit: Duration,
    },
}

impl<E> TaskError<E> {
    /// Returns true if this is a timeout of the bounded wait.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::Timeout { .. })
    }

    /// Returns true if the background call was cancelled or panicked.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskError::Cancelled)
    }

    /// Returns the replayed error of the background call, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            TaskError::Failed(e) => Some(e),
            _ => None,
        }
    }
}

pin_project! {
    /// A handle to a call running in the background.
    ///
    /// The handle becomes done exactly once, when the background call
    /// finishes, and then exposes the call's return value or replays its
    /// failure. Consumers wait by calling [`get`](AsyncHandle::get) or
    /// [`get_timeout`](AsyncHandle::get_timeout), or by awaiting the handle
    /// directly since it implements [`Future`].
    ///
    /// # Cancellation
    ///
    /// Cancellation is best effort. `cancel(false)` never interrupts a call
    /// that is already running and always reports `false`; `cancel(true)`
    /// aborts the backing task if it has not finished yet. Dropping the
    /// handle does not cancel the call.
    pub struct AsyncHandle<T, E> {
        #[pin]
        rx: oneshot::Receiver<Result<T, E>>,
        task: JoinHandle<()>,
        done: Arc<AtomicBool>,
        cancelled: bool,
    }
}

impl<T, E> AsyncHandle<T, E> {
    /// Returns true once the background call has finished, with either a
    /// value or a failure.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Returns true if the handle was cancelled via [`cancel`](Self::cancel).
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Attempts to cancel the background call.
    ///
    /// Returns true if the call was cancelled. A call that already finished
    /// can no longer be cancelled. With `interrupt` set to false a running
    /// call is never interrupted, so the attempt always reports false.
    pub fn cancel(&mut self, interrupt: bool) -> bool {
        if self.cancelled || self.is_done() || !interrupt {
            return false;
        }
        self.task.abort();
        self.cancelled = true;
        true
    }

    /// Waits for the background call and returns its value, or replays its
    /// failure.
    pub async fn get(self) -> Result<T, TaskError<E>> {
        self.await
    }

    /// Waits for the background call, bounded by `limit`.
    ///
    /// Exceeding the bound yields [`TaskError::Timeout`], distinct from a
    /// failure of the call itself.
    pub async fn get_timeout(self, limit: Duration) -> Result<T, TaskError<E>> {
        match tokio::time::timeout(limit, self).await {
            Ok(result) => result,
            Err(_elapsed) => Err(TaskError::Timeout { limit }),
        }
    }
}

impl<T, E> std::fmt::Debug for AsyncHandle<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncHandle")
            .field("done", &self.is_done())
            .field("cancelled", &self.cancelled)
            .finish_non_exhaustive()
    }
}

impl<T, E> Future for AsyncHandle<T, E> {
    type Output = Result<T, TaskError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match this.rx.poll(cx) {
            Poll::Ready(Ok(Ok(value))) => Poll::Ready(Ok(value)),
            Poll::Ready(Ok(Err(err))) => Poll::Ready(Err(TaskError::Failed(err))),
            // The sender was dropped without sending: the task was aborted
            // or panicked before producing a result.
            Poll::Ready(Err(_)) => Poll::Ready(Err(TaskError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Spawns `future` on `executor` and returns a handle to its result.
///
/// `on_settled` runs on the worker after the call finishes, with the call
/// duration and whether it succeeded. The done flag is set before the result
/// is sent so `is_done` never races ahead of the value.
pub(crate) fn dispatch_on<X, F, T, E, C>(executor: &X, future: F, on_settled: C) -> AsyncHandle<T, E>
where
    X: Executor,
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    C: FnOnce(Duration, bool) + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let done = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&done);

    let task = executor.spawn(async move {
        let start = Instant::now();
        let result = future.await;
        let ok = result.is_ok();
        flag.store(true, Ordering::Release);
        // The send fails only when the handle was dropped, in which case
        // there is no consumer left to inform.
        let _ = tx.send(result);
        on_settled(start.elapsed(), ok);
    });

    AsyncHandle {
        rx,
        task,
        done,
        cancelled: false,
    }
}
