//! Service implementation for the dispatch middleware.

use crate::config::{DispatchConfig, ReturnKind};
use crate::events::DispatchEvent;
use crate::handle::{dispatch_on, AsyncHandle};
use crate::{DispatchError, Executor};
use futures::future::{ready, Ready};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower_service::Service;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_histogram, histogram};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// The synchronous outcome of a dispatched call.
///
/// Which variant a service produces is fixed by its configured
/// [`ReturnKind`]: void-mode services always return
/// [`Detached`](Dispatched::Detached), handle-mode services always return
/// [`Pending`](Dispatched::Pending).
#[derive(Debug)]
pub enum Dispatched<T, E> {
    /// The call was detached; its outcome is not observable by the caller.
    Detached,
    /// The call is running in the background; the handle yields its result.
    Pending(AsyncHandle<T, E>),
}

impl<T, E> Dispatched<T, E> {
    /// Returns true if the call was detached.
    pub fn is_detached(&self) -> bool {
        matches!(self, Dispatched::Detached)
    }

    /// Returns the pending-result handle, if the call produced one.
    pub fn into_handle(self) -> Option<AsyncHandle<T, E>> {
        match self {
            Dispatched::Pending(handle) => Some(handle),
            Dispatched::Detached => None,
        }
    }
}

/// A service that dispatches each call to a worker pool.
///
/// The call to `call` itself never suspends the caller: the returned future
/// is always immediately ready, carrying either [`Dispatched::Detached`],
/// a [`Dispatched::Pending`] handle, or the synchronous contract error for
/// an unsupported return kind.
///
/// # Requirements
///
/// The inner service must implement `Clone` so that each dispatched task
/// can own its own instance, the standard pattern for Tower services shared
/// across tasks.
pub struct AsyncDispatch<S, X> {
    inner: S,
    config: Arc<DispatchConfig<X>>,
}

impl<S: Clone, X> Clone for AsyncDispatch<S, X> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, X> AsyncDispatch<S, X> {
    /// Creates a new dispatch service around `inner`.
    pub(crate) fn new(inner: S, config: Arc<DispatchConfig<X>>) -> Self {
        #[cfg(feature = "metrics")]
        {
            describe_counter!(
                "async_dispatch_calls_total",
                "Total number of dispatched calls (completed, failed, or rejected)"
            );
            describe_histogram!(
                "async_dispatch_task_duration_seconds",
                "Duration of background calls on the worker pool"
            );
        }

        Self { inner, config }
    }

    /// Returns a reference to the inner service.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the inner service.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consumes the service and returns the inner service.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, X, Req> Service<Req> for AsyncDispatch<S, X>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    X: Executor,
    Req: Send + 'static,
{
    type Response = Dispatched<S::Response, S::Error>;
    type Error = DispatchError<S::Error>;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(DispatchError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let config = Arc::clone(&self.config);

        // Contract check first, before anything is spawned.
        if let ReturnKind::Other(declared) = config.return_kind {
            config.event_listeners.emit(&DispatchEvent::Rejected {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                declared,
            });

            #[cfg(feature = "metrics")]
            counter!("async_dispatch_calls_total", "dispatcher" => config.name.clone(), "result" => "rejected")
                .increment(1);

            #[cfg(feature = "tracing")]
            warn!(
                dispatcher = %config.name,
                declared,
                "Rejected call: declared return type is neither void nor a handle"
            );

            return ready(Err(DispatchError::UnsupportedReturnType { declared }));
        }

        config.event_listeners.emit(&DispatchEvent::Submitted {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
        });

        // Each dispatched task owns its own clone of the inner service.
        let mut inner = self.inner.clone();

        if config.return_kind == ReturnKind::Handle {
            let cfg = Arc::clone(&config);
            let handle = dispatch_on(
                &config.executor,
                async move { inner.call(req).await },
                move |duration, ok| settle(&cfg, duration, ok),
            );
            ready(Ok(Dispatched::Pending(handle)))
        } else {
            // ReturnKind::Void: detach entirely.
            let cfg = Arc::clone(&config);
            config.executor.spawn(async move {
                let start = Instant::now();
                let ok = inner.call(req).await.is_ok();
                settle(&cfg, start.elapsed(), ok);
            });
            ready(Ok(Dispatched::Detached))
        }
    }
}

/// Records the outcome of a background call: events, metrics, tracing.
/// Runs on the worker thread after the call finishes.
fn settle<X>(config: &DispatchConfig<X>, duration: std::time::Duration, ok: bool) {
    let event = if ok {
        DispatchEvent::Completed {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            duration,
        }
    } else {
        DispatchEvent::Failed {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            duration,
        }
    };
    config.event_listeners.emit(&event);

    #[cfg(feature = "metrics")]
    {
        let result = if ok { "completed" } else { "failed" };
        counter!("async_dispatch_calls_total", "dispatcher" => config.name.clone(), "result" => result)
            .increment(1);
        histogram!("async_dispatch_task_duration_seconds", "dispatcher" => config.name.clone())
            .record(duration.as_secs_f64());
    }

    #[cfg(feature = "tracing")]
    {
        if ok {
            debug!(
                dispatcher = %config.name,
                duration_ms = duration.as_millis(),
                "Background call completed"
            );
        } else {
            warn!(
                dispatcher = %config.name,
                duration_ms = duration.as_millis(),
                "Background call failed; error is not observable by the caller"
            );
        }
    }
}
