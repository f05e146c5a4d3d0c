//! Rule engine for clinical and administrative compliance statuses.
//!
//! Leaves first: the [`ThresholdRegistry`] supplies per-metric ranges,
//! [`classify`] grades a single reading, [`combine`] reduces several statuses
//! to the worst one, [`ExpirationPolicy`] grades credential lifecycles, and the
//! aggregation helpers roll readings and medication logs into
//! [`AggregateSummary`] values. [`ComplianceEngine`] ties them together for a
//! report host, and [`compliance_router`] serves it over HTTP.

mod aggregate;
mod classifier;
mod compound;
mod dates;
pub mod domain;
mod engine;
mod error;
mod expiration;
mod medication;
mod router;
mod summary;
mod thresholds;

#[cfg(test)]
mod tests;

pub use aggregate::{aggregate_readings, round_to, MetricTally, ReadingAggregate};
pub use classifier::{assess, classify, classify_value};
pub use compound::{combine, combine_assessments};
pub use dates::facility_today;
pub use domain::{
    Assessment, Credential, CredentialStatus, MedicationLog, MedicationStatus, Reading,
    ReadingValue, ReportingPeriod, Status, SummaryScope, VitalSign, VitalsRecord,
};
pub use engine::{
    ComplianceEngine, CredentialStatusEntry, EvaluationInput, EvaluationReport, EvaluationRequest,
    FacilitySummary, PerRecordStatus, ReadingStatus, VitalsRecordStatus,
};
pub use error::{EvaluationError, ThresholdError};
pub use expiration::{
    classify_expiration, days_until, expiring_within, CredentialTally, ExpirationPolicy,
    ExpiringCredential, DEFAULT_EXPIRING_WINDOW_DAYS,
};
pub use medication::{
    compliance_by_day, compliance_by_resident, ComplianceRate, MedicationCompliance,
};
pub use router::compliance_router;
pub use summary::AggregateSummary;
pub use thresholds::{MetricThreshold, ThresholdRegistry};
