use super::aggregate::round_to;
use super::domain::{MedicationLog, MedicationStatus, ReportingPeriod};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

const NOT_APPLICABLE: &str = "N/A";

/// Share of scheduled doses given, as a percentage with one decimal place.
/// `NotApplicable` when nothing was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ComplianceRate {
    Percent(f64),
    #[default]
    NotApplicable,
}

impl ComplianceRate {
    pub fn from_counts(given: usize, total: usize) -> Self {
        if total == 0 {
            return Self::NotApplicable;
        }
        Self::Percent(round_to(given as f64 / total as f64 * 100.0, 1))
    }

    pub fn percent(&self) -> Option<f64> {
        match self {
            Self::Percent(value) => Some(*value),
            Self::NotApplicable => None,
        }
    }
}

impl fmt::Display for ComplianceRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(value) => write!(f, "{value:.1}%"),
            Self::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

impl Serialize for ComplianceRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Percent(value) => serializer.serialize_f64(*value),
            Self::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

impl<'de> Deserialize<'de> for ComplianceRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Percent(f64),
            Text(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Percent(value) => Ok(Self::Percent(value)),
            Wire::Text(text) if text == NOT_APPLICABLE => Ok(Self::NotApplicable),
            Wire::Text(text) => Err(serde::de::Error::custom(format!(
                "expected a percentage or \"{NOT_APPLICABLE}\", found '{text}'"
            ))),
        }
    }
}

/// Dose counts and compliance rate for a set of medication logs.
///
/// The same rollup serves a single resident and the whole facility; only the
/// set of logs differs. `missed` includes doses still pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicationCompliance {
    pub total: usize,
    pub given: usize,
    pub refused: usize,
    pub held: usize,
    pub missed: usize,
    pub rate: ComplianceRate,
}

impl MedicationCompliance {
    pub fn from_logs<'a, I>(logs: I) -> Self
    where
        I: IntoIterator<Item = &'a MedicationLog>,
    {
        logs.into_iter().fold(Self::default(), |mut compliance, log| {
            compliance.record(log.status);
            compliance
        })
    }

    /// Like [`MedicationCompliance::from_logs`], restricted to doses scheduled
    /// inside `period`.
    pub fn for_period<'a, I>(logs: I, period: &ReportingPeriod) -> Self
    where
        I: IntoIterator<Item = &'a MedicationLog>,
    {
        Self::from_logs(
            logs.into_iter()
                .filter(|log| period.contains_timestamp(log.scheduled_time)),
        )
    }

    pub fn record(&mut self, status: MedicationStatus) {
        self.total += 1;
        match status {
            MedicationStatus::Given => self.given += 1,
            MedicationStatus::Refused => self.refused += 1,
            MedicationStatus::Held => self.held += 1,
            MedicationStatus::Missed | MedicationStatus::Pending => self.missed += 1,
            MedicationStatus::Unrecognized => {}
        }
        self.rate = ComplianceRate::from_counts(self.given, self.total);
    }

    pub fn merge(&self, other: &MedicationCompliance) -> MedicationCompliance {
        let total = self.total + other.total;
        let given = self.given + other.given;
        MedicationCompliance {
            total,
            given,
            refused: self.refused + other.refused,
            held: self.held + other.held,
            missed: self.missed + other.missed,
            rate: ComplianceRate::from_counts(given, total),
        }
    }
}

/// Compliance per resident over `period`. Residents without a scheduled dose in
/// the period are left out.
pub fn compliance_by_resident<'a, I>(
    logs: I,
    period: &ReportingPeriod,
) -> BTreeMap<String, MedicationCompliance>
where
    I: IntoIterator<Item = &'a MedicationLog>,
{
    let mut by_resident: BTreeMap<String, MedicationCompliance> = BTreeMap::new();
    for log in logs {
        if period.contains_timestamp(log.scheduled_time) {
            by_resident
                .entry(log.resident_id.clone())
                .or_default()
                .record(log.status);
        }
    }
    by_resident
}

/// Compliance per scheduled day over `period`.
pub fn compliance_by_day<'a, I>(
    logs: I,
    period: &ReportingPeriod,
) -> BTreeMap<NaiveDate, MedicationCompliance>
where
    I: IntoIterator<Item = &'a MedicationLog>,
{
    let mut by_day: BTreeMap<NaiveDate, MedicationCompliance> = BTreeMap::new();
    for log in logs {
        let day = log.scheduled_time.date();
        if period.contains(day) {
            by_day.entry(day).or_default().record(log.status);
        }
    }
    by_day
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(statuses: &[MedicationStatus]) -> MedicationCompliance {
        let mut compliance = MedicationCompliance::default();
        for status in statuses {
            compliance.record(*status);
        }
        compliance
    }

    #[test]
    fn empty_set_is_not_applicable() {
        let compliance = MedicationCompliance::from_logs(&Vec::<MedicationLog>::new());
        assert_eq!(compliance.total, 0);
        assert_eq!(compliance.rate, ComplianceRate::NotApplicable);
        assert_eq!(
            serde_json::to_string(&compliance.rate).expect("serializes"),
            "\"N/A\""
        );
    }

    #[test]
    fn all_given_is_one_hundred_percent() {
        let compliance = statuses(&[MedicationStatus::Given; 4]);
        assert_eq!(compliance.rate, ComplianceRate::Percent(100.0));
    }

    #[test]
    fn none_given_is_zero_percent() {
        let compliance = statuses(&[MedicationStatus::Refused, MedicationStatus::Held]);
        assert_eq!(compliance.rate, ComplianceRate::Percent(0.0));
    }

    #[test]
    fn pending_counts_as_missed_and_unknown_only_as_total() {
        let compliance = statuses(&[
            MedicationStatus::Given,
            MedicationStatus::Pending,
            MedicationStatus::Missed,
            MedicationStatus::Unrecognized,
        ]);
        assert_eq!(compliance.total, 4);
        assert_eq!(compliance.missed, 2);
        assert_eq!(compliance.rate, ComplianceRate::Percent(25.0));
    }

    #[test]
    fn rate_rounds_to_one_decimal() {
        let compliance = statuses(&[
            MedicationStatus::Given,
            MedicationStatus::Given,
            MedicationStatus::Refused,
        ]);
        assert_eq!(compliance.rate, ComplianceRate::Percent(66.7));
        assert_eq!(compliance.rate.to_string(), "66.7%");
    }

    #[test]
    fn merged_rate_matches_union() {
        let left = statuses(&[MedicationStatus::Given, MedicationStatus::Refused]);
        let right = statuses(&[MedicationStatus::Given; 3]);
        let union = statuses(&[
            MedicationStatus::Given,
            MedicationStatus::Refused,
            MedicationStatus::Given,
            MedicationStatus::Given,
            MedicationStatus::Given,
        ]);
        assert_eq!(left.merge(&right), union);
    }

    #[test]
    fn rate_deserializes_both_shapes() {
        let rates: Vec<ComplianceRate> =
            serde_json::from_str(r#"[80.0, "N/A"]"#).expect("parses");
        assert_eq!(rates, vec![ComplianceRate::Percent(80.0), ComplianceRate::NotApplicable]);
    }
}
