use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde_json::{Map, Value};

use super::{performer, ApiResult, AppState};
use crate::audit::AuditEntry;
use crate::grades::{GradeReceipt, GradeResult};
use crate::records::ScanOutcome;

pub async fn submit_grade(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Map<String, Value>>,
) -> ApiResult<(StatusCode, Json<GradeReceipt>)> {
    let result = GradeResult::from_submission(payload)?;
    let receipt = state.contract.submit_grade(&performer(&headers), result).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list_results(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ScanOutcome<GradeResult>>> {
    Ok(Json(state.contract.list_results(&performer(&headers)).await?))
}

pub async fn get_result(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<GradeResult>> {
    Ok(Json(state.contract.get_result(&performer(&headers), &id).await?))
}

pub async fn verify_grade(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<GradeReceipt>> {
    Ok(Json(state.contract.verify_grade(&performer(&headers), &id).await?))
}

pub async fn audit_trail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<ScanOutcome<AuditEntry>>> {
    Ok(Json(state.contract.get_grade_audit_trail(&performer(&headers), &id).await?))
}
