use super::common::*;
use crate::evaluation::{
    ComplianceRate, CredentialStatus, EvaluationError, EvaluationInput, MedicationStatus,
    ReportingPeriod, Status, SummaryScope,
};
use chrono::NaiveDate;

#[test]
fn per_record_status_covers_period_records_only() {
    let report = engine().evaluate(&snapshot()).expect("evaluates");

    let records = &report.per_record_status;
    assert_eq!(records.vitals.len(), 3);
    assert!(records.vitals.iter().all(|status| status.recorded_at < at(15, 0)));
    assert_eq!(records.readings.len(), 1);
    assert_eq!(records.readings[0].status, Status::Warning);
    assert!(records.readings[0].graded);
    assert_eq!(records.credentials.len(), 4);
}

#[test]
fn resident_summaries_roll_up_vitals_and_doses() {
    let report = engine().evaluate(&snapshot()).expect("evaluates");

    let ada = report.resident("res-ada").expect("ada summary");
    assert_eq!(ada.worst_status, Status::Critical);
    assert_eq!(ada.count(Status::Critical), 1);
    assert_eq!(ada.averages["heartRate"], Some(75.0));
    assert_eq!(ada.averages["bloodPressureSystolic"], Some(158.5));
    assert_eq!(ada.averages["weight"], Some(142.4));
    assert_eq!(ada.averages["bloodSugar"], None);
    assert_eq!(ada.medication.total, 10);
    assert_eq!(ada.rate, ComplianceRate::Percent(80.0));

    let ben = report.resident("res-ben").expect("ben summary");
    assert_eq!(ben.worst_status, Status::Warning);
    assert_eq!(ben.averages["oxygenSaturation"], Some(97.0));
    assert_eq!(ben.rate, ComplianceRate::Percent(100.0));
}

#[test]
fn staff_summaries_carry_credential_tallies() {
    let report = engine().evaluate(&snapshot()).expect("evaluates");

    let cora = report.staff("staff-cora").expect("cora summary");
    assert_eq!(cora.credentials.expiring, 1);
    assert_eq!(cora.credentials.current, 1);
    assert_eq!(cora.rate, ComplianceRate::NotApplicable);

    let dev = report.staff("staff-dev").expect("dev summary");
    assert_eq!(dev.credentials.expired, 1);
    assert_eq!(dev.credentials.no_expiration, 1);

    let cpr = report
        .per_record_status
        .credentials
        .iter()
        .find(|entry| entry.credential_type == "CPR")
        .expect("cpr entry");
    assert_eq!(cpr.status, CredentialStatus::Expiring);
    assert_eq!(cpr.days_until, Some(15));
}

#[test]
fn facility_summary_matches_union_of_residents() {
    let report = engine().evaluate(&snapshot()).expect("evaluates");
    let facility = &report.facility_summary;

    assert_eq!(facility.summary.scope, SummaryScope::Facility);
    assert_eq!(facility.summary.medication.total, 11);
    assert_eq!(facility.summary.medication.given, 9);
    assert_eq!(facility.summary.rate, ComplianceRate::Percent(81.8));
    assert_eq!(facility.summary.worst_status, Status::Critical);
    assert_eq!(facility.residents_with_alerts, 2);
    assert_eq!(facility.summary.credentials.total, 4);
    assert_eq!(facility.expiring_soon.len(), 1);
    assert_eq!(facility.expiring_soon[0].holder_id, "staff-cora");
    assert_eq!(facility.medication_by_day.len(), 10);

    let resident_counts: usize = report
        .per_entity_summary
        .iter()
        .filter(|summary| matches!(summary.scope, SummaryScope::Resident { .. }))
        .map(|summary| summary.count(Status::Warning))
        .sum();
    assert_eq!(facility.summary.count(Status::Warning), resident_counts);
}

#[test]
fn input_order_does_not_change_the_report() {
    let input = snapshot();
    let mut shuffled = input.clone();
    shuffled.vitals.reverse();
    shuffled.medication_logs.reverse();
    shuffled.credentials.rotate_left(2);

    let first = engine().evaluate(&input).expect("evaluates");
    let second = engine().evaluate(&shuffled).expect("evaluates");

    assert_eq!(first.per_entity_summary, second.per_entity_summary);
    assert_eq!(first.facility_summary, second.facility_summary);
}

#[test]
fn empty_snapshot_reports_nulls_and_zeroes() {
    let input = EvaluationInput::new(period(), today());

    let report = engine().evaluate(&input).expect("evaluates");

    assert!(report.per_entity_summary.is_empty());
    let summary = &report.facility_summary.summary;
    assert!(summary.averages.values().all(Option::is_none));
    assert_eq!(summary.count(Status::Warning), 0);
    assert_eq!(summary.count(Status::Critical), 0);
    assert_eq!(summary.rate, ComplianceRate::NotApplicable);
}

#[test]
fn inverted_period_is_rejected() {
    let mut input = snapshot();
    input.period = ReportingPeriod {
        start: NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"),
        end: NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date"),
    };

    assert!(matches!(
        engine().evaluate(&input),
        Err(EvaluationError::InvalidPeriod { .. })
    ));
}

#[test]
fn unknown_loose_metric_fails_the_run() {
    let mut input = snapshot();
    input
        .readings
        .push(reading("res-ben", "cholesterol", Some(210.0), 6));

    match engine().evaluate(&input) {
        Err(EvaluationError::UnknownMetric { metric }) => assert_eq!(metric, "cholesterol"),
        other => panic!("expected unknown metric, got {other:?}"),
    }
}

#[test]
fn resident_with_doses_only_still_gets_a_summary() {
    let mut input = EvaluationInput::new(period(), today());
    input.medication_logs = vec![dose("res-cal", 2, MedicationStatus::Held)];

    let report = engine().evaluate(&input).expect("evaluates");

    let cal = report.resident("res-cal").expect("cal summary");
    assert_eq!(cal.rate, ComplianceRate::Percent(0.0));
    assert_eq!(cal.worst_status, Status::Normal);
}

#[test]
fn input_deserializes_from_host_json() {
    let input: EvaluationInput = serde_json::from_str(
        r#"{
            "period": {"start": "2025-03-01", "end": "2025-03-14"},
            "today": "2025-03-15T23:59:00Z",
            "vitals": [{
                "residentId": "res-ada",
                "recordedAt": "2025-03-03T08:00:00Z",
                "bloodPressureSystolic": "185",
                "bloodPressureDiastolic": 70
            }],
            "credentials": [{
                "teamMemberId": "staff-cora",
                "credentialType": "CPR",
                "expirationDate": "2025-03-30"
            }],
            "medicationLogs": [{
                "residentId": "res-ada",
                "medicationId": "med-1",
                "scheduledTime": "2025-03-02 08:00:00",
                "status": "GIVEN"
            }]
        }"#,
    )
    .expect("parses");

    assert_eq!(input.today, today());
    let report = engine().evaluate(&input).expect("evaluates");
    assert_eq!(report.per_record_status.vitals[0].blood_pressure, Status::Critical);
    assert_eq!(
        report.per_record_status.credentials[0].status,
        CredentialStatus::Expiring
    );
    assert_eq!(report.facility_summary.summary.rate, ComplianceRate::Percent(100.0));
}

#[test]
fn report_serializes_with_camel_case_keys() {
    let report = engine().evaluate(&snapshot()).expect("evaluates");

    let json = serde_json::to_value(&report).expect("serializes");

    assert!(json["perRecordStatus"]["vitals"].is_array());
    assert_eq!(json["facilitySummary"]["summary"]["scope"]["kind"], "facility");
    assert_eq!(json["facilitySummary"]["summary"]["worstStatus"], "critical");
    assert_eq!(json["perRecordStatus"]["vitals"][0]["bloodPressure"], "critical");
    let staff = json["perEntitySummary"]
        .as_array()
        .expect("array")
        .iter()
        .find(|summary| summary["scope"]["kind"] == "staff")
        .expect("staff summary");
    assert_eq!(staff["rate"], "N/A");
}

#[test]
fn summarize_readings_drops_readings_outside_the_period() {
    let readings = vec![
        reading("res-ada", "heartRate", Some(130.0), 2),
        reading("res-ada", "heartRate", Some(80.0), 14),
        reading("res-ada", "heartRate", Some(40.0), 15),
    ];

    let summary = engine()
        .summarize_readings(
            SummaryScope::Resident {
                id: "res-ada".to_string(),
            },
            &period(),
            &readings,
        )
        .expect("summarizes");

    assert_eq!(summary.averages["heartRate"], Some(105.0));
    assert_eq!(summary.count(Status::Critical), 1);
    assert_eq!(summary.worst_status, Status::Critical);
}
