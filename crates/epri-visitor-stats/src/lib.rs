//! Visitor Statistics bounded context: visit tracking, counters and session ids.
//!
//! Responsible for issuing anonymous session ids, recording deduplicated
//! page visits, and reporting, resetting and reconciling the site-wide
//! visit counters.

pub mod application;
pub mod domain;
