use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

use super::dates::facility_today;
use super::domain::SummaryScope;
use super::engine::{ComplianceEngine, EvaluationReport, EvaluationRequest};
use crate::error::AppError;

/// Router exposing the engine to report hosts.
pub fn compliance_router(engine: Arc<ComplianceEngine>) -> Router {
    Router::new()
        .route("/api/v1/compliance/evaluate", post(evaluate_handler))
        .route("/api/v1/compliance/thresholds", get(thresholds_handler))
        .with_state(engine)
}

pub(crate) async fn evaluate_handler(
    State(engine): State<Arc<ComplianceEngine>>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<EvaluationReport>, AppError> {
    let input = request.into_input(facility_today());
    let report = engine.evaluate(&input)?;

    info!(
        residents = report
            .per_entity_summary
            .iter()
            .filter(|summary| matches!(summary.scope, SummaryScope::Resident { .. }))
            .count(),
        worst = %report.facility_summary.summary.worst_status,
        "compliance evaluation served"
    );
    Ok(Json(report))
}

pub(crate) async fn thresholds_handler(State(engine): State<Arc<ComplianceEngine>>) -> Json<Value> {
    Json(json!({
        "thresholds": engine.registry().to_json_value(),
        "expiringWindowDays": engine.expiration().expiring_window_days(),
    }))
}
