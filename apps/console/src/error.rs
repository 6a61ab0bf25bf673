use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cantoria_core::AppError;
use serde::Serialize;
use tracing::{debug, error};
use ts_rs::TS;

/// Console error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Authorization and server details stay in the logs.
        let message = match &self.0 {
            AppError::Forbidden(detail) => {
                debug!(detail = %detail, "access denied");
                "access denied".to_owned()
            }
            AppError::Internal(detail) => {
                error!(detail = %detail, "request failed");
                "internal error".to_owned()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Standard console result type.
pub type ApiResult<T> = Result<T, ApiError>;
