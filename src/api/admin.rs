use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde_json::Value;

use super::{performer, ApiResult, AppState};
use crate::bootstrap::SeedSummary;
use crate::grades::IntegrityReport;

pub async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "srs-ledger",
        "timestamp": chrono::Utc::now()
    }))
}

pub async fn init_ledger(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<(StatusCode, Json<SeedSummary>)> {
    let summary = state.contract.init_ledger(&performer(&headers), &state.seed).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn integrity_report(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<IntegrityReport>> {
    Ok(Json(state.contract.audit_results(&performer(&headers)).await?))
}
