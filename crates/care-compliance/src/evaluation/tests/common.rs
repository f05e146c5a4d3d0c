use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::evaluation::{
    ComplianceEngine, Credential, EvaluationInput, MedicationLog, MedicationStatus, Reading,
    ReadingValue, ReportingPeriod, VitalSign, VitalsRecord,
};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 15).expect("valid date")
}

pub(super) fn period() -> ReportingPeriod {
    ReportingPeriod::new(
        NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date"),
        NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"),
    )
    .expect("valid period")
}

pub(super) fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .expect("valid timestamp")
}

pub(super) fn engine() -> ComplianceEngine {
    ComplianceEngine::standard()
}

pub(super) fn vitals(resident: &str, day: u32, values: &[(VitalSign, f64)]) -> VitalsRecord {
    let mut record = VitalsRecord::new(resident, at(day, 8));
    record.id = Some(format!("{resident}-vitals-{day:02}"));
    for (sign, value) in values {
        record.set(*sign, *value);
    }
    record
}

pub(super) fn reading(subject: &str, metric: &str, value: Option<f64>, day: u32) -> Reading {
    Reading {
        subject_id: subject.to_string(),
        metric_key: metric.to_string(),
        value: value.map(ReadingValue::Number),
        observed_at: at(day, 9),
    }
}

pub(super) fn dose(resident: &str, day: u32, status: MedicationStatus) -> MedicationLog {
    MedicationLog {
        id: None,
        resident_id: resident.to_string(),
        medication_id: "med-lisinopril".to_string(),
        scheduled_time: at(day, 8),
        administered_at: matches!(status, MedicationStatus::Given).then(|| at(day, 8)),
        status,
    }
}

pub(super) fn credential(holder: &str, kind: &str, days_from_today: Option<i64>) -> Credential {
    Credential {
        id: Some(format!("{holder}-{kind}")),
        holder_id: holder.to_string(),
        credential_type: kind.to_string(),
        issue_date: Some(today() - Duration::days(365)),
        expiration_date: days_from_today.map(|days| today() + Duration::days(days)),
    }
}

/// Two residents and two caregivers over the first two weeks of March.
pub(super) fn snapshot() -> EvaluationInput {
    let mut input = EvaluationInput::new(period(), today());

    input.vitals = vec![
        vitals(
            "res-ada",
            3,
            &[
                (VitalSign::BloodPressureSystolic, 185.0),
                (VitalSign::BloodPressureDiastolic, 70.0),
                (VitalSign::HeartRate, 72.0),
                (VitalSign::Weight, 142.4),
            ],
        ),
        vitals(
            "res-ada",
            10,
            &[
                (VitalSign::BloodPressureSystolic, 132.0),
                (VitalSign::BloodPressureDiastolic, 84.0),
                (VitalSign::HeartRate, 78.0),
            ],
        ),
        vitals("res-ben", 4, &[(VitalSign::OxygenSaturation, 97.0)]),
        // outside the period
        vitals("res-ben", 20, &[(VitalSign::OxygenSaturation, 85.0)]),
    ];
    input.readings = vec![reading("res-ben", "temperature", Some(100.1), 5)];

    let mut doses = Vec::new();
    for day in 1..=8 {
        doses.push(dose("res-ada", day, MedicationStatus::Given));
    }
    doses.push(dose("res-ada", 9, MedicationStatus::Refused));
    doses.push(dose("res-ada", 10, MedicationStatus::Missed));
    doses.push(dose("res-ben", 2, MedicationStatus::Given));
    input.medication_logs = doses;

    input.credentials = vec![
        credential("staff-cora", "CPR", Some(15)),
        credential("staff-cora", "FoodHandler", Some(200)),
        credential("staff-dev", "FirstAid", Some(-1)),
        credential("staff-dev", "BackgroundCheck", None),
    ];

    input
}
