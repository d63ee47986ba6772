use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rota_authz::AuthzError;
use tracing::warn;

use crate::models::ErrorResponse;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Authz(#[from] AuthzError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Authz(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::Authz(e) if e.is_indeterminate() => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Authz(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The scope question could not be answered; neither allow nor deny
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, ApiError::Authz(e) if e.is_indeterminate())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let indeterminate = self.is_indeterminate();

        if indeterminate {
            warn!(error = %self, "Scope decision indeterminate");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
            indeterminate,
        });

        (status, body).into_response()
    }
}
