use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregate::{aggregate_readings, ReadingAggregate};
use super::compound::combine;
use super::dates::{deserialize_date, deserialize_optional_date};
use super::domain::{
    Assessment, Credential, CredentialStatus, MedicationLog, Reading, ReportingPeriod, Status,
    SummaryScope, VitalSign, VitalsRecord,
};
use super::error::{EvaluationError, ThresholdError};
use super::expiration::{days_until, expiring_within, ExpirationPolicy, ExpiringCredential};
use super::medication::{compliance_by_day, compliance_by_resident, MedicationCompliance};
use super::summary::AggregateSummary;
use super::thresholds::ThresholdRegistry;
use crate::config::EvaluationSettings;

/// Everything a report host hands over for one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationInput {
    pub period: ReportingPeriod,
    #[serde(deserialize_with = "deserialize_date")]
    pub today: NaiveDate,
    #[serde(default)]
    pub readings: Vec<Reading>,
    #[serde(default)]
    pub vitals: Vec<VitalsRecord>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
    #[serde(default)]
    pub medication_logs: Vec<MedicationLog>,
}

impl EvaluationInput {
    pub fn new(period: ReportingPeriod, today: NaiveDate) -> Self {
        Self {
            period,
            today,
            readings: Vec::new(),
            vitals: Vec::new(),
            credentials: Vec::new(),
            medication_logs: Vec::new(),
        }
    }
}

/// Wire shape accepted by hosts. `today` may be left out, in which case the
/// host's clock supplies it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub period: ReportingPeriod,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub today: Option<NaiveDate>,
    #[serde(default)]
    pub readings: Vec<Reading>,
    #[serde(default)]
    pub vitals: Vec<VitalsRecord>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
    #[serde(default)]
    pub medication_logs: Vec<MedicationLog>,
}

impl EvaluationRequest {
    pub fn into_input(self, fallback_today: NaiveDate) -> EvaluationInput {
        EvaluationInput {
            period: self.period,
            today: self.today.unwrap_or(fallback_today),
            readings: self.readings,
            vitals: self.vitals,
            credentials: self.credentials,
            medication_logs: self.medication_logs,
        }
    }
}

/// Status view of one vitals encounter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsRecordStatus {
    pub record_id: Option<String>,
    pub resident_id: String,
    pub recorded_at: NaiveDateTime,
    /// Graded vitals keyed by metric. Weight and pain level only appear when
    /// the registry carries a range for them.
    pub metrics: BTreeMap<String, Assessment>,
    pub blood_pressure: Status,
    pub overall: Status,
}

impl VitalsRecordStatus {
    pub fn metric(&self, sign: VitalSign) -> Option<Assessment> {
        self.metrics.get(sign.key()).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStatus {
    pub subject_id: String,
    pub metric_key: String,
    pub observed_at: NaiveDateTime,
    pub value: Option<f64>,
    /// `false` for metrics charted without a clinical range.
    pub graded: bool,
    pub assessment: Assessment,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatusEntry {
    pub credential_id: Option<String>,
    pub holder_id: String,
    pub credential_type: String,
    pub expiration_date: Option<NaiveDate>,
    pub status: CredentialStatus,
    pub days_until: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerRecordStatus {
    pub vitals: Vec<VitalsRecordStatus>,
    pub readings: Vec<ReadingStatus>,
    pub credentials: Vec<CredentialStatusEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitySummary {
    pub summary: AggregateSummary,
    pub expiring_soon: Vec<ExpiringCredential>,
    pub residents_with_alerts: usize,
    pub medication_by_day: BTreeMap<NaiveDate, MedicationCompliance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub per_record_status: PerRecordStatus,
    pub per_entity_summary: Vec<AggregateSummary>,
    pub facility_summary: FacilitySummary,
}

impl EvaluationReport {
    pub fn summary_for(&self, scope: &SummaryScope) -> Option<&AggregateSummary> {
        self.per_entity_summary
            .iter()
            .find(|summary| &summary.scope == scope)
    }

    pub fn resident(&self, resident_id: &str) -> Option<&AggregateSummary> {
        self.summary_for(&SummaryScope::Resident {
            id: resident_id.to_string(),
        })
    }

    pub fn staff(&self, holder_id: &str) -> Option<&AggregateSummary> {
        self.summary_for(&SummaryScope::Staff {
            id: holder_id.to_string(),
        })
    }
}

/// Stateless evaluator over a threshold table and an expiration policy.
///
/// Holds no per-run state, so one engine can be shared across request handlers.
#[derive(Debug, Clone)]
pub struct ComplianceEngine {
    registry: ThresholdRegistry,
    expiration: ExpirationPolicy,
}

impl ComplianceEngine {
    pub fn new(registry: ThresholdRegistry, expiration: ExpirationPolicy) -> Self {
        Self {
            registry,
            expiration,
        }
    }

    pub fn standard() -> Self {
        Self::new(ThresholdRegistry::standard(), ExpirationPolicy::default())
    }

    /// Loads the configured threshold table, falling back to the built-in one.
    pub fn from_settings(settings: &EvaluationSettings) -> Result<Self, ThresholdError> {
        let registry = match &settings.thresholds_path {
            Some(path) => ThresholdRegistry::from_path(path)?,
            None => ThresholdRegistry::standard(),
        };
        Ok(Self::new(
            registry,
            ExpirationPolicy::new(settings.expiring_window_days),
        ))
    }

    pub fn registry(&self) -> &ThresholdRegistry {
        &self.registry
    }

    pub fn expiration(&self) -> &ExpirationPolicy {
        &self.expiration
    }

    /// Grades every charted vital of one encounter.
    pub fn classify_vitals(
        &self,
        record: &VitalsRecord,
    ) -> Result<VitalsRecordStatus, EvaluationError> {
        let mut metrics = BTreeMap::new();
        for sign in VitalSign::ordered() {
            let Some(value) = record.value(sign) else {
                continue;
            };
            if let Some(assessment) = self.registry.assess_charted(sign.key(), value.as_f64())? {
                metrics.insert(sign.key().to_string(), assessment);
            }
        }

        let status_of = |sign: VitalSign| {
            metrics
                .get(sign.key())
                .map_or(Status::Normal, |assessment: &Assessment| assessment.or_normal())
        };
        let blood_pressure = combine([
            status_of(VitalSign::BloodPressureSystolic),
            status_of(VitalSign::BloodPressureDiastolic),
        ]);
        let overall = combine(metrics.values().map(|assessment| assessment.or_normal()));

        Ok(VitalsRecordStatus {
            record_id: record.id.clone(),
            resident_id: record.resident_id.clone(),
            recorded_at: record.recorded_at,
            metrics,
            blood_pressure,
            overall,
        })
    }

    pub fn classify_reading(&self, reading: &Reading) -> Result<ReadingStatus, EvaluationError> {
        let value = reading.numeric_value();
        let graded = self.registry.assess_charted(&reading.metric_key, value)?;

        Ok(ReadingStatus {
            subject_id: reading.subject_id.clone(),
            metric_key: reading.metric_key.clone(),
            observed_at: reading.observed_at,
            value,
            graded: graded.is_some(),
            assessment: graded.unwrap_or(Assessment::NotEvaluated),
            status: graded.map_or(Status::Normal, Assessment::or_normal),
        })
    }

    pub fn credential_status(
        &self,
        credential: &Credential,
        today: NaiveDate,
    ) -> CredentialStatusEntry {
        CredentialStatusEntry {
            credential_id: credential.id.clone(),
            holder_id: credential.holder_id.clone(),
            credential_type: credential.credential_type.clone(),
            expiration_date: credential.expiration_date,
            status: self.expiration.classify_credential(credential, today),
            days_until: credential
                .expiration_date
                .map(|expiration| days_until(expiration, today)),
        }
    }

    /// Rolls loose readings into a summary for one scope.
    pub fn summarize_readings<'a, I>(
        &self,
        scope: SummaryScope,
        period: &ReportingPeriod,
        readings: I,
    ) -> Result<AggregateSummary, EvaluationError>
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        period.validate()?;
        let aggregate = aggregate_readings(readings, &self.registry, Some(period))?;
        Ok(AggregateSummary::new(scope, period).with_readings(&aggregate))
    }

    /// Classifies every record and rolls the results up per resident, per
    /// staff member and for the facility.
    ///
    /// Readings, vitals and medication logs outside `input.period` are ignored;
    /// credentials are graded against `input.today` regardless of the period.
    pub fn evaluate(&self, input: &EvaluationInput) -> Result<EvaluationReport, EvaluationError> {
        let period = &input.period;
        period.validate()?;

        debug!(
            readings = input.readings.len(),
            vitals = input.vitals.len(),
            credentials = input.credentials.len(),
            medication_logs = input.medication_logs.len(),
            start = %period.start,
            end = %period.end,
            "evaluating compliance snapshot"
        );

        let vitals: Vec<&VitalsRecord> = input
            .vitals
            .iter()
            .filter(|record| period.contains_timestamp(record.recorded_at))
            .collect();
        let readings: Vec<&Reading> = input
            .readings
            .iter()
            .filter(|reading| period.contains_timestamp(reading.observed_at))
            .collect();

        let per_record_status = PerRecordStatus {
            vitals: vitals
                .iter()
                .map(|record| self.classify_vitals(record))
                .collect::<Result<_, _>>()?,
            readings: readings
                .iter()
                .map(|reading| self.classify_reading(reading))
                .collect::<Result<_, _>>()?,
            credentials: input
                .credentials
                .iter()
                .map(|credential| self.credential_status(credential, input.today))
                .collect(),
        };

        let charted: Vec<Reading> = vitals.iter().flat_map(|record| record.readings()).collect();
        let mut by_resident: BTreeMap<String, ReadingAggregate> = BTreeMap::new();
        for reading in charted.iter().chain(readings.iter().copied()) {
            by_resident
                .entry(reading.subject_id.clone())
                .or_default()
                .record(reading, &self.registry)?;
        }
        let medication = compliance_by_resident(&input.medication_logs, period);

        let resident_ids: BTreeSet<&String> = by_resident.keys().chain(medication.keys()).collect();
        let empty = ReadingAggregate::new();
        let mut per_entity_summary: Vec<AggregateSummary> = resident_ids
            .into_iter()
            .map(|resident_id| {
                AggregateSummary::new(
                    SummaryScope::Resident {
                        id: resident_id.clone(),
                    },
                    period,
                )
                .with_readings(by_resident.get(resident_id).unwrap_or(&empty))
                .with_medication(medication.get(resident_id).copied().unwrap_or_default())
            })
            .collect();
        let residents_with_alerts = per_entity_summary
            .iter()
            .filter(|summary| summary.worst_status.is_alert())
            .count();

        per_entity_summary.extend(
            self.expiration
                .tally_by_holder(&input.credentials, input.today)
                .into_iter()
                .map(|(holder_id, tally)| {
                    AggregateSummary::new(SummaryScope::Staff { id: holder_id }, period)
                        .with_credentials(tally)
                }),
        );

        let facility_readings = by_resident
            .into_values()
            .fold(ReadingAggregate::new(), ReadingAggregate::merge);
        let summary = AggregateSummary::new(SummaryScope::Facility, period)
            .with_readings(&facility_readings)
            .with_medication(MedicationCompliance::for_period(
                &input.medication_logs,
                period,
            ))
            .with_credentials(self.expiration.tally(&input.credentials, input.today));

        let facility_summary = FacilitySummary {
            summary,
            expiring_soon: expiring_within(
                &input.credentials,
                input.today,
                self.expiration.expiring_window_days(),
            ),
            residents_with_alerts,
            medication_by_day: compliance_by_day(&input.medication_logs, period),
        };

        Ok(EvaluationReport {
            per_record_status,
            per_entity_summary,
            facility_summary,
        })
    }
}
