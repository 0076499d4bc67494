use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde_json::{Map, Value};

use super::{performer, ApiResult, AppState};
use crate::records::{Course, Enrollment, Lecturer, Receipt, ScanOutcome, Student, Transcript};

type Created = (StatusCode, Json<Receipt>);

pub async fn create_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(student): Json<Student>,
) -> ApiResult<Created> {
    let receipt = state.contract.create_student(&performer(&headers), student).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list_students(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ScanOutcome<Student>>> {
    Ok(Json(state.contract.list_students(&performer(&headers)).await?))
}

pub async fn get_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Student>> {
    Ok(Json(state.contract.get_student(&performer(&headers), &id).await?))
}

pub async fn update_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> ApiResult<Json<Receipt>> {
    Ok(Json(state.contract.update_student(&performer(&headers), &id, patch).await?))
}

pub async fn deactivate_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Receipt>> {
    Ok(Json(state.contract.deactivate_student(&performer(&headers), &id).await?))
}

pub async fn list_transcripts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<ScanOutcome<Transcript>>> {
    Ok(Json(state.contract.list_transcripts(&performer(&headers), &id).await?))
}

pub async fn create_lecturer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(lecturer): Json<Lecturer>,
) -> ApiResult<Created> {
    let receipt = state.contract.create_lecturer(&performer(&headers), lecturer).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list_lecturers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ScanOutcome<Lecturer>>> {
    Ok(Json(state.contract.list_lecturers(&performer(&headers)).await?))
}

pub async fn get_lecturer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Lecturer>> {
    Ok(Json(state.contract.get_lecturer(&performer(&headers), &id).await?))
}

pub async fn deactivate_lecturer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Receipt>> {
    Ok(Json(state.contract.deactivate_lecturer(&performer(&headers), &id).await?))
}

pub async fn create_course(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(course): Json<Course>,
) -> ApiResult<Created> {
    let receipt = state.contract.create_course(&performer(&headers), course).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list_courses(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ScanOutcome<Course>>> {
    Ok(Json(state.contract.list_courses(&performer(&headers)).await?))
}

pub async fn get_course(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Course>> {
    Ok(Json(state.contract.get_course(&performer(&headers), &id).await?))
}

pub async fn create_enrollment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(enrollment): Json<Enrollment>,
) -> ApiResult<Created> {
    let receipt = state.contract.create_enrollment(&performer(&headers), enrollment).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list_enrollments(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ScanOutcome<Enrollment>>> {
    Ok(Json(state.contract.list_enrollments(&performer(&headers)).await?))
}

pub async fn get_enrollment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Enrollment>> {
    Ok(Json(state.contract.get_enrollment(&performer(&headers), &id).await?))
}

pub async fn generate_transcript(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(transcript): Json<Transcript>,
) -> ApiResult<Created> {
    let receipt = state.contract.generate_transcript(&performer(&headers), transcript).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
