//! Carbon-intensity reporting and verification engine.
//!
//! Aggregates scope 1/2/3 emission inputs into a certified carbon-intensity
//! value, derives its rating and regulatory compliance flags, and governs the
//! supplier/auditor verification lifecycle with an append-only audit trail.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
