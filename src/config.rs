//! Configuration for the dispatch middleware.

use crate::events::EventListeners;

/// The declared return shape of an intercepted call.
///
/// This is the dynamic rendition of a method signature: a call either
/// returns nothing to its caller ([`Void`](ReturnKind::Void)), returns a
/// pending-result handle ([`Handle`](ReturnKind::Handle)), or declares
/// something else entirely, which the dispatcher rejects at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// The call is fire-and-forget; the caller sees nothing.
    Void,
    /// The call returns an [`AsyncHandle`](crate::AsyncHandle) synchronously.
    Handle,
    /// Any other declared return type, named for diagnostics. Always
    /// rejected.
    Other(&'static str),
}

impl ReturnKind {
    /// Returns true if calls with this return shape can be dispatched.
    pub fn is_supported(&self) -> bool {
        !matches!(self, ReturnKind::Other(_))
    }
}

/// Shared configuration for an [`AsyncDispatch`](crate::AsyncDispatch)
/// service, held behind an `Arc` by the layer and every service it builds.
pub struct DispatchConfig<X> {
    pub(crate) executor: X,
    pub(crate) return_kind: ReturnKind,
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners,
}
