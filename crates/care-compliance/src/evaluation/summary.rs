use super::aggregate::{MetricTally, ReadingAggregate};
use super::domain::{ReportingPeriod, Status, SummaryScope};
use super::expiration::CredentialTally;
use super::medication::{ComplianceRate, MedicationCompliance};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Roll-up for one resident, staff member, or the facility over a period.
///
/// Resident and facility summaries carry vitals and medication figures; staff
/// summaries carry credential figures. Sections that do not apply to a scope
/// are zeroed, with `rate` left at `N/A`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub scope: SummaryScope,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub counts: BTreeMap<Status, usize>,
    pub rate: ComplianceRate,
    pub averages: BTreeMap<String, Option<f64>>,
    pub alerts: BTreeMap<String, MetricTally>,
    pub worst_status: Status,
    pub medication: MedicationCompliance,
    pub credentials: CredentialTally,
}

impl AggregateSummary {
    pub fn new(scope: SummaryScope, period: &ReportingPeriod) -> Self {
        Self {
            scope,
            period_start: period.start,
            period_end: period.end,
            counts: Status::ordered().into_iter().map(|status| (status, 0)).collect(),
            rate: ComplianceRate::NotApplicable,
            averages: BTreeMap::new(),
            alerts: BTreeMap::new(),
            worst_status: Status::Normal,
            medication: MedicationCompliance::default(),
            credentials: CredentialTally::default(),
        }
    }

    pub fn with_readings(mut self, aggregate: &ReadingAggregate) -> Self {
        self.counts = aggregate.status_counts();
        self.averages = aggregate.averages();
        self.alerts = aggregate.tallies().clone();
        self.worst_status = aggregate.worst();
        self
    }

    pub fn with_medication(mut self, medication: MedicationCompliance) -> Self {
        self.rate = medication.rate;
        self.medication = medication;
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialTally) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn count(&self, status: Status) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}
