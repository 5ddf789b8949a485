use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

pub enum ApiError {
    Validation(String),
    Busy,
    NoResults(&'static str),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(detail) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_detail("validation_failed", &detail)),
            )
                .into_response(),
            ApiError::Busy => (
                StatusCode::CONFLICT,
                Json(ErrorResponse::with_detail(
                    "analysis_running",
                    "Analysis is already running",
                )),
            )
                .into_response(),
            ApiError::NoResults(detail) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::with_detail("no_results", detail)),
            )
                .into_response(),
            ApiError::Internal(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_detail("internal_error", &detail)),
            )
                .into_response(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn with_detail(error: &str, detail: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            detail: Some(detail.to_string()),
        }
    }
}
