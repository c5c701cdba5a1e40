//! Domain layer for the Visitor Statistics context.

pub mod commands;
pub mod visit;
