//! API error responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bankwire_core::{AccountServiceError, TransferError};
use bankwire_shared::AppError;
use serde::{Deserialize, Serialize};
use tracing::error;
use validator::ValidationErrors;

/// Error body: every human-readable problem with the request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// One message per problem.
    pub errors: Vec<String>,
}

/// An error leaving a handler.
#[derive(Debug)]
pub enum ApiError {
    /// A classified domain or infrastructure failure.
    App(AppError),
    /// Request fields failed validation.
    Invalid(Vec<String>),
}

impl ApiError {
    /// Returns the response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::App(err) => StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Shorthand for a single validation message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(vec![message.into()])
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        Self::App(err.into())
    }
}

impl From<AccountServiceError> for ApiError {
    fn from(err: AccountServiceError) -> Self {
        Self::App(err.into())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    error
                        .message
                        .as_ref()
                        .map_or_else(|| format!("{field} is invalid"), ToString::to_string)
                })
            })
            .collect();
        // Field order of the underlying map is unspecified.
        messages.sort();
        Self::Invalid(messages)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let errors = match self {
            Self::App(err) => {
                if err.is_server_error() {
                    error!(code = err.error_code(), error = %err, "Request failed");
                }
                vec![err.message().to_string()]
            }
            Self::Invalid(messages) => messages,
        };

        (status, Json(ErrorResponse { errors })).into_response()
    }
}
