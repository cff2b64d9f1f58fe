use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::models::ErrorBody;
use crate::store::StoreError;

/// Failures reported to API callers. Internal causes are logged where they
/// are translated and never included in the response body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Server configuration error: API key missing.")]
    Configuration,
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("No response from recipe API. Check network connectivity.")]
    UpstreamUnavailable,
    #[error("Error preparing recipe API request.")]
    RequestSetup,
    #[error("Database error")]
    Storage,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        log::error!("storage failure: {err}");
        ApiError::Storage
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ApiError::Configuration
            | ApiError::UpstreamUnavailable
            | ApiError::RequestSetup
            | ApiError::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
