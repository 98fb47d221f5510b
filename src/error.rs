//! Error type shared by the transcoder, the plan cache and the dispatcher.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DftError {
    /// The request does not satisfy the eligibility rules; the caller should
    /// fall back to an unaccelerated implementation.
    #[error("request is not eligible for acceleration: {0}")]
    Ineligible(&'static str),
    /// The cache has no slot to build into and nothing to evict.
    #[error("plan cache has zero capacity")]
    ZeroCapacity,
    /// A scratch or snapshot allocation could not be satisfied.
    #[error("failed to allocate {0} elements")]
    Allocation(usize),
    #[error("invalid transform shape {rows}x{cols}")]
    InvalidShape { rows: usize, cols: usize },
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A slice passed for execution is not the buffer the plan was keyed on.
    #[error("buffer does not match the identity the plan was built for")]
    BufferMismatch,
    #[error("transform engine failure: {0}")]
    Transform(String),
}
