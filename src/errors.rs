use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("a submission for this booking is already in progress")]
    SubmissionInProgress,

    #[error("booking submission failed: {0}")]
    Submission(String),

    #[error("availability lookup failed: {0}")]
    Availability(String),

    #[error("profile provider error: {0}")]
    Profile(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::SubmissionInProgress => StatusCode::CONFLICT,
            AppError::Submission(_) => StatusCode::BAD_GATEWAY,
            AppError::Availability(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Profile(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "retryable": matches!(self, AppError::Submission(_) | AppError::Availability(_)),
        });
        (status, axum::Json(body)).into_response()
    }
}
