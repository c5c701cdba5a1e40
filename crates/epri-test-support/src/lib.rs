//! Shared test mocks and utilities for the EPRI visitor statistics service.

mod clock;
mod repository;
mod rng;

pub use clock::FixedClock;
pub use repository::{FailingVisitRepository, InMemoryVisitRepository};
pub use rng::{CountingEntropy, FailingEntropy};
