//! Tower layer for the dispatch middleware.

use crate::config::{DispatchConfig, ReturnKind};
use crate::events::{EventListener, EventListeners, FnListener};
use crate::service::AsyncDispatch;
use crate::{DispatchEvent, Executor};
use std::sync::Arc;
use std::time::Duration;
use tower_layer::Layer;

/// A Tower layer that dispatches each call to a worker pool.
///
/// Depending on the configured [`ReturnKind`], the wrapped service either
/// runs fire-and-forget or hands back an
/// [`AsyncHandle`](crate::AsyncHandle); an unsupported return kind is
/// rejected at call time, before anything is spawned.
///
/// # Example
///
/// ```rust,no_run
/// use tower_async_dispatch::{AsyncDispatchLayer, ReturnKind, WorkerPool};
///
/// let pool = WorkerPool::new().unwrap();
/// let layer = AsyncDispatchLayer::builder()
///     .executor(pool)
///     .return_kind(ReturnKind::Handle)
///     .name("report-builder")
///     .build();
/// ```
pub struct AsyncDispatchLayer<X> {
    config: Arc<DispatchConfig<X>>,
}

impl<X> Clone for AsyncDispatchLayer<X> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<X> AsyncDispatchLayer<X>
where
    X: Executor,
{
    /// Creates a layer with the given executor and default settings
    /// (fire-and-forget dispatch, no listeners).
    pub fn new(executor: X) -> Self {
        Self::builder().executor(executor).build()
    }

    /// Creates a builder for configuring the layer.
    pub fn builder() -> AsyncDispatchLayerBuilder<X> {
        AsyncDispatchLayerBuilder::new()
    }
}

impl AsyncDispatchLayer<tokio::runtime::Handle> {
    /// Creates a layer that dispatches onto the current tokio runtime.
    ///
    /// Useful in tests and in single-runtime deployments where a dedicated
    /// [`WorkerPool`](crate::WorkerPool) would be overkill.
    ///
    /// # Panics
    ///
    /// Panics if called from outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl<S, X> Layer<S> for AsyncDispatchLayer<X>
where
    X: Executor,
{
    type Service = AsyncDispatch<S, X>;

    fn layer(&self, service: S) -> Self::Service {
        AsyncDispatch::new(service, Arc::clone(&self.config))
    }
}

/// Builder for configuring an [`AsyncDispatchLayer`].
pub struct AsyncDispatchLayerBuilder<X> {
    executor: Option<X>,
    return_kind: ReturnKind,
    name: String,
    event_listeners: EventListeners,
}

impl<X> AsyncDispatchLayerBuilder<X>
where
    X: Executor,
{
    fn new() -> Self {
        Self {
            executor: None,
            return_kind: ReturnKind::Void,
            name: String::from("<unnamed>"),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the executor that runs dispatched calls.
    pub fn executor(mut self, executor: X) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Sets the declared return shape of the wrapped call.
    ///
    /// Default: [`ReturnKind::Void`]
    pub fn return_kind(mut self, kind: ReturnKind) -> Self {
        self.return_kind = kind;
        self
    }

    /// Sets the name of this dispatcher instance for observability.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers an event listener.
    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Registers a callback invoked when a background call completes
    /// successfully.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let DispatchEvent::Completed { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback invoked when a background call fails.
    ///
    /// For fire-and-forget calls this is the only way, besides tracing, to
    /// observe a failure.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let DispatchEvent::Failed { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback invoked when a call is rejected for its declared
    /// return type.
    pub fn on_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(&'static str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let DispatchEvent::Rejected { declared, .. } = event {
                f(declared);
            }
        }));
        self
    }

    /// Builds the layer.
    ///
    /// # Panics
    ///
    /// Panics if no executor was configured.
    pub fn build(self) -> AsyncDispatchLayer<X> {
        AsyncDispatchLayer {
            config: Arc::new(DispatchConfig {
                executor: self.executor.expect("executor must be configured"),
                return_kind: self.return_kind,
                name: self.name,
                event_listeners: self.event_listeners,
            }),
        }
    }
}

impl AsyncDispatchLayerBuilder<tokio::runtime::Handle> {
    /// Uses the current tokio runtime as the executor.
    ///
    /// # Panics
    ///
    /// Panics if called from outside a tokio runtime.
    pub fn current(mut self) -> Self {
        self.executor = Some(tokio::runtime::Handle::current());
        self
    }
}
