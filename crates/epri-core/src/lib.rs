//! Shared abstractions for the EPRI visitor statistics service.
//!
//! Traits and types the visitor statistics context and its infrastructure
//! agree on: time, entropy, errors, commands, and the visit repository.
//! No infrastructure code lives here.

pub mod clock;
pub mod command;
pub mod error;
pub mod repository;
pub mod rng;
pub mod stats;
