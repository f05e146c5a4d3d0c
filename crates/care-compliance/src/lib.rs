//! Compliance-status evaluation for adult family home records.
//!
//! The [`evaluation`] module turns raw vitals readings, staff credentials, and
//! medication administration logs into classified statuses and roll-up
//! summaries. Every evaluation is a pure function of its inputs; `today` is
//! always supplied by the caller. [`config`], [`error`] and [`telemetry`] are
//! host-side helpers shared by the bundled API service, and
//! [`evaluation::compliance_router`] exposes the engine over HTTP.

pub mod config;
pub mod error;
pub mod evaluation;
pub mod telemetry;

pub use evaluation::{
    classify, combine, ComplianceEngine, EvaluationError, EvaluationInput, EvaluationReport,
    Status, ThresholdRegistry,
};
