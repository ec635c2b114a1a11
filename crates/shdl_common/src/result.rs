//! Result and error types for internal (non-user-facing) failures.

/// Result type for fallible internal operations.
///
/// `Err` means a bug in the toolchain, never a problem with the user's design.
/// User-facing problems are reported through the diagnostic sink and the
/// operation still returns `Ok` with a possibly degraded value.
pub type ShdlResult<T> = Result<T, InternalError>;

/// An internal compiler error: an invariant the pipeline relies on was
/// violated.
#[derive(Debug, thiserror::Error)]
#[error("internal compiler error: {message}")]
pub struct InternalError {
    /// What went wrong.
    pub message: String,
}

impl InternalError {
    /// Creates an internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
