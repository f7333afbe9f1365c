//! HTTP mapping for `SignalWatchError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use signalwatch_core::error::SignalWatchError;

/// Error returned by HTTP handlers.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub SignalWatchError);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SignalWatchError::BadRequest(_) | SignalWatchError::UnsupportedVersion => {
                StatusCode::BAD_REQUEST
            }
            SignalWatchError::Config(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SignalWatchError::NotAllowed(_) => StatusCode::CONFLICT,
            SignalWatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = Json(json!({
            "error": self.0.client_code().as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
