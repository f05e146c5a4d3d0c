use super::dates::{
    deserialize_date, deserialize_optional_date, deserialize_optional_timestamp,
    deserialize_timestamp,
};
use super::error::EvaluationError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Severity of a single vital-sign reading. Ordered by precedence, so the
/// derived `Ord` puts `Critical` above `Warning` above `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Normal,
    Warning,
    Critical,
}

impl Status {
    pub const fn ordered() -> [Self; 3] {
        [Self::Normal, Self::Warning, Self::Critical]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }

    pub fn is_alert(self) -> bool {
        self != Self::Normal
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of grading a reading that may be missing.
///
/// Absent readings have always been shown as normal. `NotEvaluated` keeps that
/// case visible to callers that want to flag undocumented vitals instead;
/// [`Assessment::or_normal`] collapses it back to the historical behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Assessment {
    NotEvaluated,
    Evaluated(Status),
}

impl Assessment {
    pub fn or_normal(self) -> Status {
        match self {
            Self::Evaluated(status) => status,
            Self::NotEvaluated => Status::Normal,
        }
    }

    pub fn status(self) -> Option<Status> {
        match self {
            Self::Evaluated(status) => Some(status),
            Self::NotEvaluated => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotEvaluated => "not_evaluated",
            Self::Evaluated(Status::Normal) => "normal",
            Self::Evaluated(Status::Warning) => "warning",
            Self::Evaluated(Status::Critical) => "critical",
        }
    }
}

impl From<Status> for Assessment {
    fn from(status: Status) -> Self {
        Self::Evaluated(status)
    }
}

impl Serialize for Assessment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Assessment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "not_evaluated" => Ok(Self::NotEvaluated),
            "normal" => Ok(Self::Evaluated(Status::Normal)),
            "warning" => Ok(Self::Evaluated(Status::Warning)),
            "critical" => Ok(Self::Evaluated(Status::Critical)),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["not_evaluated", "normal", "warning", "critical"],
            )),
        }
    }
}

/// Lifecycle of a dated credential relative to the evaluation day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    Current,
    Expiring,
    Expired,
    NoExpiration,
}

impl CredentialStatus {
    pub const fn ordered() -> [Self; 4] {
        [Self::Current, Self::Expiring, Self::Expired, Self::NoExpiration]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Current => "Current",
            Self::Expiring => "Expiring Soon",
            Self::Expired => "Expired",
            Self::NoExpiration => "No Expiration",
        }
    }
}

/// The vitals captured together on one charting encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VitalSign {
    BloodPressureSystolic,
    BloodPressureDiastolic,
    HeartRate,
    Temperature,
    RespiratoryRate,
    OxygenSaturation,
    Weight,
    BloodSugar,
    PainLevel,
}

impl VitalSign {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::BloodPressureSystolic,
            Self::BloodPressureDiastolic,
            Self::HeartRate,
            Self::Temperature,
            Self::RespiratoryRate,
            Self::OxygenSaturation,
            Self::Weight,
            Self::BloodSugar,
            Self::PainLevel,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::BloodPressureSystolic => "bloodPressureSystolic",
            Self::BloodPressureDiastolic => "bloodPressureDiastolic",
            Self::HeartRate => "heartRate",
            Self::Temperature => "temperature",
            Self::RespiratoryRate => "respiratoryRate",
            Self::OxygenSaturation => "oxygenSaturation",
            Self::Weight => "weight",
            Self::BloodSugar => "bloodSugar",
            Self::PainLevel => "painLevel",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|sign| sign.key() == key)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::BloodPressureSystolic => "BP Systolic",
            Self::BloodPressureDiastolic => "BP Diastolic",
            Self::HeartRate => "Heart Rate",
            Self::Temperature => "Temperature",
            Self::RespiratoryRate => "Respiratory Rate",
            Self::OxygenSaturation => "SpO2",
            Self::Weight => "Weight",
            Self::BloodSugar => "Blood Sugar",
            Self::PainLevel => "Pain Level",
        }
    }

    /// Weight and pain level are charted without a clinical range; they are
    /// only graded when a deployment registers one.
    pub const fn requires_threshold(self) -> bool {
        !matches!(self, Self::Weight | Self::PainLevel)
    }

    /// Decimal places used when an average is shown on a report.
    pub const fn display_precision(self) -> u32 {
        match self {
            Self::Temperature => 1,
            _ => 0,
        }
    }
}

/// A reading as charted: a number, free text, or nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Number(f64),
    Text(String),
}

impl ReadingValue {
    /// Numeric view of the value. Text is read up to the first character that
    /// cannot continue a decimal number (`"120 mmHg"` reads as 120); text
    /// without a leading number and NaN read as absent.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => (!value.is_nan()).then_some(*value),
            Self::Text(raw) => leading_number(raw),
        }
    }
}

impl From<f64> for ReadingValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ReadingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

fn leading_number(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok()
}

/// One observed value for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub subject_id: String,
    pub metric_key: String,
    #[serde(default)]
    pub value: Option<ReadingValue>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub observed_at: NaiveDateTime,
}

impl Reading {
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.as_ref().and_then(ReadingValue::as_f64)
    }
}

/// All vitals charted for a resident during one encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub resident_id: String,
    #[serde(default)]
    pub recorded_by: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub recorded_at: NaiveDateTime,
    #[serde(default)]
    pub blood_pressure_systolic: Option<ReadingValue>,
    #[serde(default)]
    pub blood_pressure_diastolic: Option<ReadingValue>,
    #[serde(default)]
    pub heart_rate: Option<ReadingValue>,
    #[serde(default)]
    pub temperature: Option<ReadingValue>,
    #[serde(default)]
    pub respiratory_rate: Option<ReadingValue>,
    #[serde(default)]
    pub oxygen_saturation: Option<ReadingValue>,
    #[serde(default)]
    pub weight: Option<ReadingValue>,
    #[serde(default)]
    pub blood_sugar: Option<ReadingValue>,
    #[serde(default)]
    pub pain_level: Option<ReadingValue>,
}

impl VitalsRecord {
    pub fn new(resident_id: impl Into<String>, recorded_at: NaiveDateTime) -> Self {
        Self {
            id: None,
            resident_id: resident_id.into(),
            recorded_by: None,
            recorded_at,
            blood_pressure_systolic: None,
            blood_pressure_diastolic: None,
            heart_rate: None,
            temperature: None,
            respiratory_rate: None,
            oxygen_saturation: None,
            weight: None,
            blood_sugar: None,
            pain_level: None,
        }
    }

    pub fn value(&self, sign: VitalSign) -> Option<&ReadingValue> {
        match sign {
            VitalSign::BloodPressureSystolic => self.blood_pressure_systolic.as_ref(),
            VitalSign::BloodPressureDiastolic => self.blood_pressure_diastolic.as_ref(),
            VitalSign::HeartRate => self.heart_rate.as_ref(),
            VitalSign::Temperature => self.temperature.as_ref(),
            VitalSign::RespiratoryRate => self.respiratory_rate.as_ref(),
            VitalSign::OxygenSaturation => self.oxygen_saturation.as_ref(),
            VitalSign::Weight => self.weight.as_ref(),
            VitalSign::BloodSugar => self.blood_sugar.as_ref(),
            VitalSign::PainLevel => self.pain_level.as_ref(),
        }
    }

    pub fn set(&mut self, sign: VitalSign, value: impl Into<ReadingValue>) -> &mut Self {
        let slot = match sign {
            VitalSign::BloodPressureSystolic => &mut self.blood_pressure_systolic,
            VitalSign::BloodPressureDiastolic => &mut self.blood_pressure_diastolic,
            VitalSign::HeartRate => &mut self.heart_rate,
            VitalSign::Temperature => &mut self.temperature,
            VitalSign::RespiratoryRate => &mut self.respiratory_rate,
            VitalSign::OxygenSaturation => &mut self.oxygen_saturation,
            VitalSign::Weight => &mut self.weight,
            VitalSign::BloodSugar => &mut self.blood_sugar,
            VitalSign::PainLevel => &mut self.pain_level,
        };
        *slot = Some(value.into());
        self
    }

    /// Splits the encounter into one reading per charted vital. Vitals left
    /// blank on the chart produce no reading.
    pub fn readings(&self) -> Vec<Reading> {
        VitalSign::ordered()
            .into_iter()
            .filter_map(|sign| {
                self.value(sign).map(|value| Reading {
                    subject_id: self.resident_id.clone(),
                    metric_key: sign.key().to_string(),
                    value: Some(value.clone()),
                    observed_at: self.recorded_at,
                })
            })
            .collect()
    }
}

/// A staff certification or license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "teamMemberId")]
    pub holder_id: String,
    pub credential_type: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub expiration_date: Option<NaiveDate>,
}

/// Administration outcome recorded upstream for a scheduled dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MedicationStatus {
    Given,
    Refused,
    Held,
    Missed,
    Pending,
    /// Any status string this engine does not know; counted toward totals only.
    Unrecognized,
}

impl From<String> for MedicationStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "given" => Self::Given,
            "refused" => Self::Refused,
            "held" => Self::Held,
            "missed" => Self::Missed,
            "pending" => Self::Pending,
            _ => Self::Unrecognized,
        }
    }
}

/// One scheduled dose for one resident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationLog {
    #[serde(default)]
    pub id: Option<String>,
    pub resident_id: String,
    pub medication_id: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub scheduled_time: NaiveDateTime,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub administered_at: Option<NaiveDateTime>,
    pub status: MedicationStatus,
}

/// Inclusive date window a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    #[serde(deserialize_with = "deserialize_date")]
    pub start: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    pub end: NaiveDate,
}

impl ReportingPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, EvaluationError> {
        let period = Self { start, end };
        period.validate()?;
        Ok(period)
    }

    pub fn validate(&self) -> Result<(), EvaluationError> {
        if self.end < self.start {
            return Err(EvaluationError::InvalidPeriod {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn contains_timestamp(&self, at: NaiveDateTime) -> bool {
        self.contains(at.date())
    }
}

/// Whose records a summary rolls up.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryScope {
    Resident { id: String },
    Staff { id: String },
    Facility,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_values_read_their_leading_number() {
        assert_eq!(ReadingValue::from("98.6").as_f64(), Some(98.6));
        assert_eq!(ReadingValue::from(" 120 mmHg").as_f64(), Some(120.0));
        assert_eq!(ReadingValue::from("-3.5e1x").as_f64(), Some(-35.0));
        assert_eq!(ReadingValue::from("7.").as_f64(), Some(7.0));
        assert_eq!(ReadingValue::from(".5").as_f64(), Some(0.5));
        assert_eq!(ReadingValue::from("refused").as_f64(), None);
        assert_eq!(ReadingValue::from("").as_f64(), None);
        assert_eq!(ReadingValue::from("-").as_f64(), None);
        assert_eq!(ReadingValue::Number(f64::NAN).as_f64(), None);
    }

    #[test]
    fn medication_status_tolerates_unknown_values() {
        let log: MedicationLog = serde_json::from_str(
            r#"{"residentId":"r-1","medicationId":"m-1","scheduledTime":"2025-03-01T08:00:00Z","status":"Discontinued"}"#,
        )
        .expect("log parses");
        assert_eq!(log.status, MedicationStatus::Unrecognized);
        assert!(log.administered_at.is_none());
    }

    #[test]
    fn vitals_record_accepts_mixed_value_shapes() {
        let record: VitalsRecord = serde_json::from_str(
            r#"{
                "residentId": "r-1",
                "recordedBy": "staff-9",
                "recordedAt": "2025-03-01T08:00:00Z",
                "bloodPressureSystolic": 132,
                "temperature": "98.4",
                "heartRate": null
            }"#,
        )
        .expect("record parses");
        assert_eq!(record.heart_rate, None);
        let keys: Vec<String> = record.readings().into_iter().map(|r| r.metric_key).collect();
        assert_eq!(keys, vec!["bloodPressureSystolic", "temperature"]);
    }

    #[test]
    fn credential_accepts_team_member_alias_and_blank_dates() {
        let credential: Credential = serde_json::from_str(
            r#"{"teamMemberId":"staff-1","credentialType":"CPR","issueDate":"2024-01-10","expirationDate":""}"#,
        )
        .expect("credential parses");
        assert_eq!(credential.holder_id, "staff-1");
        assert!(credential.expiration_date.is_none());
    }

    #[test]
    fn assessment_serializes_flat() {
        let json = serde_json::to_string(&vec![
            Assessment::NotEvaluated,
            Assessment::Evaluated(Status::Critical),
        ])
        .expect("serializes");
        assert_eq!(json, r#"["not_evaluated","critical"]"#);
    }

    #[test]
    fn period_rejects_reversed_bounds() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date");
        let end = NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date");
        assert!(matches!(
            ReportingPeriod::new(start, end),
            Err(EvaluationError::InvalidPeriod { .. })
        ));
    }
}
