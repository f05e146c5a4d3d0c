use care_compliance::config::AppConfig;
use care_compliance::error::AppError;
use care_compliance::ComplianceEngine;
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Builds the engine from configuration, letting a command-line table path win
/// over `CARE_THRESHOLDS_PATH`.
pub(crate) fn build_engine(
    config: &AppConfig,
    thresholds: Option<PathBuf>,
) -> Result<ComplianceEngine, AppError> {
    let mut settings = config.evaluation.clone();
    if let Some(path) = thresholds {
        settings.thresholds_path = Some(path);
    }

    let engine = ComplianceEngine::from_settings(&settings)?;
    let source = settings
        .thresholds_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());
    info!(
        metrics = engine.registry().len(),
        expiring_window_days = engine.expiration().expiring_window_days(),
        %source,
        "compliance engine ready"
    );
    Ok(engine)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
