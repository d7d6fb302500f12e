//! Error types for the dispatch middleware.

/// Errors returned by [`AsyncDispatch`](crate::AsyncDispatch).
///
/// Execution errors of handle-mode calls are not represented here: they
/// travel through the returned [`AsyncHandle`](crate::AsyncHandle) as
/// [`TaskError`](crate::TaskError), so the service-level error covers only
/// what can be known before the call leaves the caller's thread.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError<E> {
    /// The declared return type is neither void nor a dispatch handle.
    ///
    /// This is a configuration error, raised synchronously before any
    /// background work is scheduled.
    #[error("declared return type `{declared}` is neither void nor a dispatch handle")]
    UnsupportedReturnType {
        /// The declared return type that was rejected.
        declared: &'static str,
    },
    /// The inner service reported an error while becoming ready.
    #[error("service error: {0}")]
    Inner(E),
}

impl<E> DispatchError<E> {
    /// Returns true if the call was rejected for its declared return type.
    pub fn is_unsupported_return_type(&self) -> bool {
        matches!(self, DispatchError::UnsupportedReturnType { .. })
    }

    /// Returns the inner service error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            DispatchError::Inner(e) => Some(e),
            _ => None,
        }
    }
}
