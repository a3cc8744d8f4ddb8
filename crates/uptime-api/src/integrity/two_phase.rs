//! Outcome of a write that spans two records.

use crate::error::ApiError;

/// Result of a two-step write, keeping "first step committed" apart from
/// both clean outcomes.
#[derive(Debug)]
pub enum TwoPhase<T> {
    /// Both steps committed.
    Complete(T),
    /// The first step committed and the second did not; needs
    /// reconciliation.
    FirstOnly { value: T, cause: ApiError },
    /// The first step failed; nothing was written.
    Failed(ApiError),
}

impl<T> TwoPhase<T> {
    /// Collapse into a `Result`, letting the caller describe a half-done
    /// write.
    pub fn into_result<F>(self, on_partial: F) -> Result<T, ApiError>
    where
        F: FnOnce(T, ApiError) -> ApiError,
    {
        match self {
            Self::Complete(value) => Ok(value),
            Self::FirstOnly { value, cause } => Err(on_partial(value, cause)),
            Self::Failed(cause) => Err(cause),
        }
    }
}
