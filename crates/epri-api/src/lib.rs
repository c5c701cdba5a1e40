//! EPRI visitor statistics HTTP API.
//!
//! Exposed as a library so integration tests can build the same router the
//! binary serves.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;
