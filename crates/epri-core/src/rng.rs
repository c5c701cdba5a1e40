//! Entropy source abstraction for session identifiers.
//!
//! Production code reads from the operating system CSPRNG. Tests inject a
//! deterministic or failing implementation.

use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::error::DomainError;

/// Abstraction over a cryptographically secure byte source.
pub trait SessionEntropy: Send + Sync {
    /// Fill `dest` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the source cannot produce
    /// bytes. Implementations must never fall back to a weaker generator.
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), DomainError>;
}

/// Entropy drawn from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl SessionEntropy for OsEntropy {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), DomainError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| DomainError::Infrastructure(format!("os random source unavailable: {e}")))
    }
}
