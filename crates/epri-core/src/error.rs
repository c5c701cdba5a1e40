//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The caller supplied missing or malformed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller lacks the administrative credential.
    #[error("unauthorized")]
    Unauthorized,

    /// The store reported a broken invariant, such as an unexpected unique or
    /// check constraint violation.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// The store or the entropy source is unavailable.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
