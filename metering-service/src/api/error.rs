use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::MeteringError;

/// HTTP face of [`MeteringError`].
#[derive(Debug)]
pub struct ApiError(pub MeteringError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl From<MeteringError> for ApiError {
    fn from(err: MeteringError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            MeteringError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            MeteringError::InvalidFormula(_) => (StatusCode::BAD_REQUEST, "invalid_formula"),
            MeteringError::NoData(_) => (StatusCode::BAD_REQUEST, "no_data"),
            MeteringError::ClassificationNotFound(_) => (StatusCode::NOT_FOUND, "classification_not_found"),
            MeteringError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            MeteringError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = match &self.0 {
            MeteringError::Store(e) => {
                tracing::error!(error = %e, "store failure while handling request");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
