use crate::infra::{build_engine, parse_date};
use care_compliance::config::AppConfig;
use care_compliance::error::AppError;
use care_compliance::evaluation::{
    facility_today, round_to, AggregateSummary, EvaluationReport, EvaluationRequest,
    MetricThreshold, SummaryScope, ThresholdRegistry, VitalSign,
};
use chrono::NaiveDate;
use clap::Args;
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// JSON snapshot with `period`, and optionally `today`, `readings`,
    /// `vitals`, `credentials` and `medicationLogs`
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// CSV or JSON threshold table to use instead of the configured one
    #[arg(long)]
    pub(crate) thresholds: Option<PathBuf>,
    /// Evaluation date (YYYY-MM-DD). Overrides the snapshot; defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the full report as JSON instead of the text summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ThresholdsArgs {
    /// CSV or JSON threshold table to use instead of the configured one
    #[arg(long)]
    pub(crate) thresholds: Option<PathBuf>,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        input,
        thresholds,
        today,
        json,
    } = args;

    let config = AppConfig::load()?;
    let engine = build_engine(&config, thresholds)?;

    let request: EvaluationRequest = serde_json::from_reader(BufReader::new(File::open(input)?))?;
    let mut input = request.into_input(today.unwrap_or_else(facility_today));
    if let Some(today) = today {
        input.today = today;
    }

    let report = engine.evaluate(&input)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report, input.today));
    }
    Ok(())
}

pub(crate) fn run_thresholds(args: ThresholdsArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let engine = build_engine(&config, args.thresholds)?;
    print!("{}", render_thresholds(engine.registry()));
    println!(
        "Credentials expiring within {} days are flagged.",
        engine.expiration().expiring_window_days()
    );
    Ok(())
}

/// Plain-text report for terminals. Averages use display precision.
pub(crate) fn render_report(report: &EvaluationReport, today: NaiveDate) -> String {
    let mut out = String::new();
    let facility = &report.facility_summary;
    let summary = &facility.summary;

    let _ = writeln!(
        out,
        "Compliance report {} to {} (as of {})",
        summary.period_start, summary.period_end, today
    );
    let _ = writeln!(
        out,
        "- Facility status: {} | {} resident(s) with alerts",
        summary.worst_status.label(),
        facility.residents_with_alerts
    );
    let _ = writeln!(
        out,
        "- Medication compliance: {} ({} of {} doses given, {} refused, {} held, {} missed)",
        summary.rate,
        summary.medication.given,
        summary.medication.total,
        summary.medication.refused,
        summary.medication.held,
        summary.medication.missed
    );
    let _ = writeln!(
        out,
        "- Credentials: {} current | {} expiring | {} expired | {} without expiration",
        summary.credentials.current,
        summary.credentials.expiring,
        summary.credentials.expired,
        summary.credentials.no_expiration
    );

    let residents: Vec<&AggregateSummary> = report
        .per_entity_summary
        .iter()
        .filter(|entry| matches!(entry.scope, SummaryScope::Resident { .. }))
        .collect();
    if !residents.is_empty() {
        let _ = writeln!(out, "\nResidents:");
        for resident in residents {
            let SummaryScope::Resident { id } = &resident.scope else {
                continue;
            };
            let _ = writeln!(
                out,
                "  - {}: {} | medication {}",
                id,
                resident.worst_status.label(),
                resident.rate
            );
            let averages = format_averages(resident);
            if !averages.is_empty() {
                let _ = writeln!(out, "      averages: {}", averages.join(", "));
            }
            for (metric, tally) in &resident.alerts {
                if tally.warning + tally.critical > 0 {
                    let _ = writeln!(
                        out,
                        "      {}: {} warning, {} critical",
                        metric_label(metric),
                        tally.warning,
                        tally.critical
                    );
                }
            }
        }
    }

    if !facility.expiring_soon.is_empty() {
        let _ = writeln!(out, "\nExpiring soon:");
        for credential in &facility.expiring_soon {
            let _ = writeln!(
                out,
                "  - {} {} expires {} ({} days)",
                credential.holder_id,
                credential.credential_type,
                credential.expiration_date,
                credential.days_remaining
            );
        }
    }

    out
}

pub(crate) fn render_thresholds(registry: &ThresholdRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Threshold table ({} metrics)", registry.len());
    for MetricThreshold {
        metric_key,
        low,
        high,
        critical_low,
        critical_high,
    } in registry.iter()
    {
        let _ = writeln!(
            out,
            "  - {}: normal {}-{} | critical below {} or above {}",
            metric_label(metric_key),
            low,
            high,
            critical_low,
            critical_high
        );
    }
    out
}

fn metric_label(metric_key: &str) -> String {
    VitalSign::from_key(metric_key)
        .map(|sign| sign.label().to_string())
        .unwrap_or_else(|| metric_key.to_string())
}

fn format_averages(summary: &AggregateSummary) -> Vec<String> {
    summary
        .averages
        .iter()
        .filter_map(|(metric, average)| {
            let average = (*average)?;
            let decimals = VitalSign::from_key(metric).map_or(1, VitalSign::display_precision);
            Some(format!(
                "{} {:.*}",
                metric_label(metric),
                decimals as usize,
                round_to(average, decimals)
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_compliance::evaluation::{
        EvaluationInput, MedicationLog, MedicationStatus, ReportingPeriod, VitalsRecord,
    };
    use care_compliance::ComplianceEngine;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).expect("valid date")
    }

    fn report() -> EvaluationReport {
        let period = ReportingPeriod::new(date(1), date(14)).expect("valid period");
        let mut input = EvaluationInput::new(period, date(15));

        let mut record = VitalsRecord::new(
            "res-ada",
            date(3).and_hms_opt(8, 0, 0).expect("valid time"),
        );
        record
            .set(VitalSign::BloodPressureSystolic, 185.0)
            .set(VitalSign::Temperature, 98.64);
        input.vitals.push(record);
        input.medication_logs.push(MedicationLog {
            id: None,
            resident_id: "res-ada".to_string(),
            medication_id: "med-1".to_string(),
            scheduled_time: date(2).and_hms_opt(8, 0, 0).expect("valid time"),
            administered_at: None,
            status: MedicationStatus::Given,
        });

        ComplianceEngine::standard()
            .evaluate(&input)
            .expect("evaluates")
    }

    #[test]
    fn text_report_lists_residents_and_rounds_averages() {
        let text = render_report(&report(), date(15));

        assert!(text.contains("Compliance report 2025-03-01 to 2025-03-14 (as of 2025-03-15)"));
        assert!(text.contains("Facility status: Critical | 1 resident(s) with alerts"));
        assert!(text.contains("Medication compliance: 100.0%"));
        assert!(text.contains("res-ada: Critical | medication 100.0%"));
        assert!(text.contains("Temperature 98.6"));
        assert!(text.contains("BP Systolic: 0 warning, 1 critical"));
        assert!(!text.contains("Expiring soon"));
    }

    #[test]
    fn threshold_listing_names_every_metric() {
        let text = render_thresholds(&ThresholdRegistry::standard());

        assert!(text.starts_with("Threshold table (7 metrics)"));
        assert!(text.contains("normal 95-100 | critical below 90 or above 100"));
    }
}
