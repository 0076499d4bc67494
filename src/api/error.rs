use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::LedgerError;

/// A [`LedgerError`] rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::DuplicateKey(_) | LedgerError::InvalidState(_) | LedgerError::Conflict(_) => {
            StatusCode::CONFLICT
        }
        LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::Integrity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::MissingKey(_) | LedgerError::InvalidKey(_) | LedgerError::Validation(_) => {
            StatusCode::BAD_REQUEST
        }
        LedgerError::Parse(_) | LedgerError::Storage(_) | LedgerError::Config(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected ({}): {}", status, self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&LedgerError::DuplicateKey("student:1".into())), StatusCode::CONFLICT);
        assert_eq!(status_for(&LedgerError::NotFound("student:1".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&LedgerError::MissingKey("studentId".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&LedgerError::Validation("yearOfStudy".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&LedgerError::Integrity {
                result_id: "10".into(),
                stored: "a".into(),
                recomputed: "b".into(),
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&LedgerError::Parse("bad".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
