//! Decorator-style dispatch API.
//!
//! [`Dispatcher`] is the plain-function rendition of the middleware: instead
//! of wrapping a Tower service, it takes the call itself as a future and
//! either detaches it or returns an [`AsyncHandle`]. The void-vs-handle
//! contract is enforced by the type system here: `spawn` only accepts work
//! with no result, `dispatch` always produces a handle.

use crate::events::{DispatchEvent, EventListener, EventListeners};
use crate::handle::{dispatch_on, AsyncHandle};
use crate::{Executor, WorkerPool};
use std::fmt::Display;
use std::future::Future;
use std::io;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::warn;

/// Dispatches futures onto an executor, fire-and-forget or with a handle.
///
/// # Example
///
/// ```rust,no_run
/// use tower_async_dispatch::Dispatcher;
///
/// # async fn example() {
/// let dispatcher = Dispatcher::new().unwrap();
///
/// // Fire and forget: the caller is never blocked.
/// dispatcher.spawn(async {
///     println!("runs on a worker thread");
/// });
///
/// // Dispatch with a handle to the eventual result.
/// let handle = dispatcher.dispatch(async { Ok::<_, std::io::Error>(2 + 2) });
/// assert_eq!(handle.get().await.unwrap(), 4);
/// # }
/// ```
#[derive(Clone)]
pub struct Dispatcher<X = WorkerPool> {
    executor: X,
    name: String,
    event_listeners: EventListeners,
}

impl Dispatcher<WorkerPool> {
    /// Creates a dispatcher backed by a default [`WorkerPool`].
    ///
    /// # Errors
    ///
    /// Returns an error if the pool's runtime cannot be created.
    pub fn new() -> io::Result<Self> {
        Ok(Self::on(WorkerPool::new()?))
    }
}

impl<X> Dispatcher<X>
where
    X: Executor,
{
    /// Creates a dispatcher on the given executor.
    pub fn on(executor: X) -> Self {
        Self {
            executor,
            name: String::from("<unnamed>"),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name of this dispatcher instance for observability.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers an event listener.
    pub fn with_listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Runs `future` on the executor, fire-and-forget.
    ///
    /// Returns immediately; the caller never observes the outcome. A panic
    /// in the future aborts only its own task.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listeners = self.event_listeners.clone();
        let name = self.name.clone();
        self.emit_submitted();
        self.executor.spawn(async move {
            let start = Instant::now();
            future.await;
            listeners.emit(&DispatchEvent::Completed {
                pattern_name: name,
                timestamp: Instant::now(),
                duration: start.elapsed(),
            });
        });
    }

    /// Runs fallible `future` on the executor, fire-and-forget.
    ///
    /// An `Err` outcome is emitted as a [`DispatchEvent::Failed`] event and,
    /// with the `tracing` feature, logged at warn level. It is never
    /// surfaced to the caller.
    pub fn spawn_result<F, E>(&self, future: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let listeners = self.event_listeners.clone();
        let name = self.name.clone();
        self.emit_submitted();
        self.executor.spawn(async move {
            let start = Instant::now();
            match future.await {
                Ok(()) => {
                    listeners.emit(&DispatchEvent::Completed {
                        pattern_name: name,
                        timestamp: Instant::now(),
                        duration: start.elapsed(),
                    });
                }
                Err(_err) => {
                    listeners.emit(&DispatchEvent::Failed {
                        pattern_name: name.clone(),
                        timestamp: Instant::now(),
                        duration: start.elapsed(),
                    });

                    #[cfg(feature = "tracing")]
                    warn!(
                        dispatcher = %name,
                        error = %_err,
                        "Detached call failed"
                    );
                }
            }
        });
    }

    /// Runs `future` on the executor and returns a handle to its result.
    pub fn dispatch<F, T, E>(&self, future: F) -> AsyncHandle<T, E>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let listeners = self.event_listeners.clone();
        let name = self.name.clone();
        self.emit_submitted();
        dispatch_on(&self.executor, future, move |duration, ok| {
            let event = if ok {
                DispatchEvent::Completed {
                    pattern_name: name,
                    timestamp: Instant::now(),
                    duration,
                }
            } else {
                DispatchEvent::Failed {
                    pattern_name: name,
                    timestamp: Instant::now(),
                    duration,
                }
            };
            listeners.emit(&event);
        })
    }

    fn emit_submitted(&self) {
        self.event_listeners.emit(&DispatchEvent::Submitted {
            pattern_name: self.name.clone(),
            timestamp: Instant::now(),
        });
    }
}
