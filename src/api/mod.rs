//! HTTP gateway
//!
//! Thin axum routes over [`RecordsContract`]. The caller names itself in the
//! `x-srs-identity` header; there is no authentication at this layer.

pub mod admin;
pub mod error;
pub mod grades;
pub mod records;

use axum::{
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::bootstrap::SeedSnapshot;
use crate::contract::RecordsContract;

pub use error::{ApiError, ApiResult};

pub const IDENTITY_HEADER: &str = "x-srs-identity";
pub const ANONYMOUS: &str = "anonymous";

#[derive(Clone)]
pub struct AppState {
    pub contract: RecordsContract,
    /// Snapshot written by `POST /admin/init`
    pub seed: Arc<SeedSnapshot>,
}

impl AppState {
    pub fn new(contract: RecordsContract, seed: SeedSnapshot) -> Self {
        Self {
            contract,
            seed: Arc::new(seed),
        }
    }
}

/// Performer identity of a request.
pub fn performer(headers: &HeaderMap) -> String {
    headers
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(admin::health_check))
        .route("/students", post(records::create_student).get(records::list_students))
        .route(
            "/students/:id",
            get(records::get_student)
                .patch(records::update_student)
                .delete(records::deactivate_student),
        )
        .route("/students/:id/transcripts", get(records::list_transcripts))
        .route("/lecturers", post(records::create_lecturer).get(records::list_lecturers))
        .route(
            "/lecturers/:id",
            get(records::get_lecturer).delete(records::deactivate_lecturer),
        )
        .route("/courses", post(records::create_course).get(records::list_courses))
        .route("/courses/:id", get(records::get_course))
        .route("/enrollments", post(records::create_enrollment).get(records::list_enrollments))
        .route("/enrollments/:id", get(records::get_enrollment))
        .route("/transcripts", post(records::generate_transcript))
        .route("/grades", post(grades::submit_grade).get(grades::list_results))
        .route("/grades/:id", get(grades::get_result))
        .route("/grades/:id/verify", post(grades::verify_grade))
        .route("/grades/:id/audit", get(grades::audit_trail))
        .route("/admin/init", post(admin::init_ledger))
        .route("/admin/integrity", get(admin::integrity_report))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).into_inner())
        .with_state(state)
}
