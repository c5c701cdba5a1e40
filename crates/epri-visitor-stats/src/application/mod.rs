//! Application layer for the Visitor Statistics context.

pub mod command_handlers;
pub mod query_handlers;
pub mod session_issuer;
