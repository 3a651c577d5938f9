use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dto::validation::first_message, state::lifecycle::ActionRejected, transport::TransportError,
};

/// Errors that can occur in service layer operations.
///
/// Display strings are shown to the operator as-is.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The game service refused or failed the request.
    #[error("{0}")]
    Upstream(#[source] TransportError),
    /// The operator's credentials expired.
    #[error("Unauthorized")]
    Unauthorized,
    /// Invalid input caught before any request was sent.
    #[error("{0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("{0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("{0}")]
    NotFound(String),
    /// The number does not appear on the inspected card.
    #[error("Number {0} is not on this card.")]
    NotOnCard(u32),
}

impl ServiceError {
    /// Whether this failure should be passed on as a session-expiry signal.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::Unauthorized)
    }
}

impl From<TransportError> for ServiceError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unauthorized => ServiceError::Unauthorized,
            TransportError::NotFound(message) => ServiceError::NotFound(message),
            other => ServiceError::Upstream(other),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidInput(first_message(&err))
    }
}

impl From<ActionRejected> for ServiceError {
    fn from(err: ActionRejected) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// The game service refused the operator's credentials.
    #[error("{0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Conflict with the current lifecycle phase.
    #[error("{0}")]
    Conflict(String),
    /// The game service failed or rejected the request.
    #[error("{0}")]
    BadGateway(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Upstream(_) => AppError::BadGateway(message),
            ServiceError::Unauthorized => AppError::Unauthorized(message),
            ServiceError::InvalidInput(_) | ServiceError::NotOnCard(_) => {
                AppError::BadRequest(message)
            }
            ServiceError::InvalidState(_) => AppError::Conflict(message),
            ServiceError::NotFound(_) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
