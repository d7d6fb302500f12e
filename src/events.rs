//! Event system for dispatch observability.
//!
//! Events are the only channel through which the outcome of a detached
//! (fire-and-forget) call can be observed; the original caller never sees
//! its result.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Events emitted by the dispatch middleware.
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// A call was handed to the worker pool.
    Submitted {
        /// Name of the dispatcher instance.
        pattern_name: String,
        /// When the call was submitted.
        timestamp: Instant,
    },
    /// A background call finished successfully.
    Completed {
        /// Name of the dispatcher instance.
        pattern_name: String,
        /// When the call finished.
        timestamp: Instant,
        /// How long the call ran on the worker.
        duration: Duration,
    },
    /// A background call finished with an error.
    Failed {
        /// Name of the dispatcher instance.
        pattern_name: String,
        /// When the call finished.
        timestamp: Instant,
        /// How long the call ran on the worker.
        duration: Duration,
    },
    /// A call was rejected before dispatch because of its declared return
    /// type.
    Rejected {
        /// Name of the dispatcher instance.
        pattern_name: String,
        /// When the call was rejected.
        timestamp: Instant,
        /// The unsupported declared return type.
        declared: &'static str,
    },
}

impl DispatchEvent {
    /// Returns the type of event (e.g. `"completed"`).
    pub fn event_type(&self) -> &'static str {
        match self {
            DispatchEvent::Submitted { .. } => "submitted",
            DispatchEvent::Completed { .. } => "completed",
            DispatchEvent::Failed { .. } => "failed",
            DispatchEvent::Rejected { .. } => "rejected",
        }
    }

    /// Returns the name of the dispatcher instance that emitted this event.
    pub fn pattern_name(&self) -> &str {
        match self {
            DispatchEvent::Submitted { pattern_name, .. }
            | DispatchEvent::Completed { pattern_name, .. }
            | DispatchEvent::Failed { pattern_name, .. }
            | DispatchEvent::Rejected { pattern_name, .. } => pattern_name,
        }
    }

    /// Returns when this event occurred.
    pub fn timestamp(&self) -> Instant {
        match self {
            DispatchEvent::Submitted { timestamp, .. }
            | DispatchEvent::Completed { timestamp, .. }
            | DispatchEvent::Failed { timestamp, .. }
            | DispatchEvent::Rejected { timestamp, .. } => *timestamp,
        }
    }
}

/// Trait for listening to dispatch events.
pub trait EventListener: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &DispatchEvent);
}

/// A collection of event listeners.
#[derive(Clone, Default)]
pub struct EventListeners {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventListeners {
    /// Creates a new empty event listener collection.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Adds a listener to the collection.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Emits an event to all registered listeners.
    ///
    /// If a listener panics, the panic is caught and the remaining listeners
    /// will still be called.
    pub fn emit(&self, event: &DispatchEvent) {
        for listener in &self.listeners {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
        }
    }

    /// Returns true if there are no listeners.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Returns the number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

/// A simple function-based event listener.
pub struct FnListener<F>
where
    F: Fn(&DispatchEvent) + Send + Sync,
{
    f: F,
}

impl<F> FnListener<F>
where
    F: Fn(&DispatchEvent) + Send + Sync,
{
    /// Creates a new function-based listener.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventListener for FnListener<F>
where
    F: Fn(&DispatchEvent) + Send + Sync,
{
    fn on_event(&self, event: &DispatchEvent) {
        (self.f)(event)
    }
}
