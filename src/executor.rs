//! Worker pool and executor abstraction.

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

/// Default thread name prefix for [`WorkerPool`] threads.
pub const DEFAULT_THREAD_PREFIX: &str = "async-dispatch";

/// Trait for executors that can spawn futures.
///
/// This trait abstracts over different execution strategies, allowing
/// dispatched calls to run on a dedicated [`WorkerPool`], on an existing
/// tokio runtime, or on any custom spawning strategy.
///
/// # Example
///
/// ```rust,no_run
/// use tower_async_dispatch::Executor;
/// use tokio::runtime::Handle;
///
/// // Tokio Handle implements Executor
/// let handle = Handle::current();
/// ```
pub trait Executor: Clone + Send + Sync + 'static {
    /// Spawns a future onto this executor.
    ///
    /// Returns a handle that can be used to await the result.
    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static;
}

/// Executor implementation for tokio's runtime Handle.
///
/// This spawns futures as new tasks on the tokio runtime.
impl Executor for Handle {
    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        Handle::spawn(self, future)
    }
}

/// A dedicated pool of named worker threads for dispatched calls.
///
/// The pool owns its own multi-threaded tokio runtime whose worker threads
/// are named `<prefix>-<n>`, so work running on the pool is distinguishable
/// from the caller's thread by name alone.
///
/// Cloning is cheap; all clones share the same runtime. When the last clone
/// is dropped, the runtime shuts down in the background without blocking,
/// so a pool can be dropped from inside an async context.
///
/// # Example
///
/// ```rust
/// use tower_async_dispatch::WorkerPool;
///
/// let pool = WorkerPool::builder()
///     .worker_threads(4)
///     .thread_name_prefix("bg-work")
///     .build()
///     .unwrap();
/// assert_eq!(pool.thread_name_prefix(), "bg-work");
/// ```
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    runtime: Option<Runtime>,
    handle: Handle,
    prefix: String,
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        // shutdown_background never blocks, so dropping the pool from an
        // async context is safe. In-flight tasks run to completion on the
        // pool threads.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl WorkerPool {
    /// Creates a pool with default settings.
    ///
    /// Threads are named `async-dispatch-<n>` and the thread count follows
    /// the tokio runtime default (one per CPU core).
    pub fn new() -> io::Result<Self> {
        Self::builder().build()
    }

    /// Creates a builder for configuring the pool.
    pub fn builder() -> WorkerPoolBuilder {
        WorkerPoolBuilder::new()
    }

    /// Returns the prefix used for worker thread names.
    pub fn thread_name_prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Returns a handle to the pool's runtime.
    pub fn handle(&self) -> &Handle {
        &self.inner.handle
    }
}

impl Executor for WorkerPool {
    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.inner.handle.spawn(future)
    }
}

/// Builder for configuring a [`WorkerPool`].
pub struct WorkerPoolBuilder {
    worker_threads: Option<usize>,
    prefix: String,
}

impl WorkerPoolBuilder {
    fn new() -> Self {
        Self {
            worker_threads: None,
            prefix: String::from(DEFAULT_THREAD_PREFIX),
        }
    }

    /// Sets the number of worker threads.
    ///
    /// Default: the tokio runtime default (one per CPU core).
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = Some(count);
        self
    }

    /// Sets the prefix for worker thread names.
    ///
    /// Threads are named `<prefix>-<n>` with `n` counting up from zero.
    ///
    /// Default: `"async-dispatch"`
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Builds the worker pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying runtime cannot be created, for
    /// example when the process is out of threads.
    pub fn build(self) -> io::Result<WorkerPool> {
        let prefix = self.prefix;
        let name_prefix = prefix.clone();
        let next_id = Arc::new(AtomicUsize::new(0));

        let mut builder = Builder::new_multi_thread();
        if let Some(count) = self.worker_threads {
            builder.worker_threads(count);
        }
        let runtime = builder
            .thread_name_fn(move || {
                let id = next_id.fetch_add(1, Ordering::Relaxed);
                format!("{}-{}", name_prefix, id)
            })
            .enable_all()
            .build()?;

        let handle = runtime.handle().clone();
        Ok(WorkerPool {
            inner: Arc::new(PoolInner {
                runtime: Some(runtime),
                handle,
                prefix,
            }),
        })
    }
}

impl Default for WorkerPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
