//! Deterministic `SessionEntropy` sources for tests.

use epri_core::error::DomainError;
use epri_core::rng::SessionEntropy;

/// Fills every buffer with a single byte value that increases on each call,
/// so consecutive session ids are predictable and distinct.
#[derive(Debug, Default)]
pub struct CountingEntropy {
    next: u8,
}

impl CountingEntropy {
    /// Create a new `CountingEntropy` whose first buffer is filled with
    /// `start`.
    #[must_use]
    pub fn starting_at(start: u8) -> Self {
        Self { next: start }
    }
}

impl SessionEntropy for CountingEntropy {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), DomainError> {
        dest.fill(self.next);
        self.next = self.next.wrapping_add(1);
        Ok(())
    }
}

/// An entropy source that is always unavailable. Useful for testing the
/// session issuer's failure path.
#[derive(Debug)]
pub struct FailingEntropy;

impl SessionEntropy for FailingEntropy {
    fn fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("entropy source unavailable".into()))
    }
}
