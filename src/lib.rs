//! Asynchronous dispatch middleware for Tower services.
//!
//! This crate moves a call off the caller's thread and onto a dedicated,
//! named worker pool. A dispatched call either runs fire-and-forget, so the
//! caller returns immediately and never observes the outcome, or hands back
//! an [`AsyncHandle`]: a pending-result handle with blocking retrieval,
//! bounded waits, status queries, and best-effort cancellation. A call whose
//! declared return shape is neither of those is rejected synchronously,
//! before any background work is scheduled.
//!
//! Two surfaces expose the same behavior:
//!
//! - [`AsyncDispatchLayer`] / [`AsyncDispatch`]: the Tower middleware,
//!   configured with a [`ReturnKind`] describing the wrapped call.
//! - [`Dispatcher`]: a decorator-style API that takes the call as a future;
//!   here the void-vs-handle contract is enforced at compile time.
//!
//! # Tower Example
//!
//! ```rust,no_run
//! use tower_async_dispatch::{AsyncDispatchLayer, ReturnKind, WorkerPool};
//! use tower::{Service, ServiceBuilder, ServiceExt};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = WorkerPool::builder()
//!     .worker_threads(4)
//!     .thread_name_prefix("report-pool")
//!     .build()?;
//!
//! let service = tower::service_fn(|req: String| async move {
//!     Ok::<_, std::convert::Infallible>(format!("report for {}", req))
//! });
//!
//! let mut service = ServiceBuilder::new()
//!     .layer(
//!         AsyncDispatchLayer::builder()
//!             .executor(pool)
//!             .return_kind(ReturnKind::Handle)
//!             .build(),
//!     )
//!     .service(service);
//!
//! // The call returns a handle immediately; the work runs on the pool.
//! let dispatched = service.ready().await?.call("Q3".to_string()).await?;
//! let handle = dispatched.into_handle().expect("handle mode");
//! let report = handle.get().await?;
//! assert_eq!(report, "report for Q3");
//! # Ok(())
//! # }
//! ```
//!
//! # Fire-and-Forget
//!
//! With [`ReturnKind::Void`] (the default) the caller gets
//! [`Dispatched::Detached`] back immediately and the call's outcome is only
//! observable through event listeners or, with the `tracing` feature,
//! through logs:
//!
//! ```rust,no_run
//! use tower_async_dispatch::{AsyncDispatchLayer, WorkerPool};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let layer = AsyncDispatchLayer::builder()
//!     .executor(WorkerPool::new()?)
//!     .name("audit-log")
//!     .on_error(|duration| {
//!         eprintln!("audit write failed after {:?}", duration);
//!     })
//!     .build();
//! # Ok(())
//! # }
//! ```
//!
//! # Contract Errors
//!
//! A layer configured with [`ReturnKind::Other`] models a misconfigured
//! interception: every call fails fast with
//! [`DispatchError::UnsupportedReturnType`] and the inner service is never
//! invoked.
//!
//! # Service Requirements
//!
//! The wrapped service must implement `Clone` so every dispatched task can
//! own its own instance. Most Tower services already do; for those that
//! don't, wrap them with `Buffer` first.

mod config;
mod dispatcher;
mod error;
mod events;
mod executor;
mod handle;
mod layer;
mod service;

pub use config::ReturnKind;
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use events::{DispatchEvent, EventListener, EventListeners, FnListener};
pub use executor::{Executor, WorkerPool, WorkerPoolBuilder, DEFAULT_THREAD_PREFIX};
pub use handle::{AsyncHandle, TaskError};
pub use layer::{AsyncDispatchLayer, AsyncDispatchLayerBuilder};
pub use service::{AsyncDispatch, Dispatched};
