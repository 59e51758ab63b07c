use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::{config::Environment, services::SignatureError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),

    #[error("Database connection string is not configured")]
    DatabaseNotConfigured,

    #[error("Request body exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Failed parsing request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("Failed parsing webhook event: {0}")]
    InvalidEvent(#[from] serde_json::Error),

    #[error("Webhook signing secret is not configured")]
    WebhookSecretMissing,

    #[error("Request timed out")]
    Timeout,

    #[error("Handler panicked: {0}")]
    Panic(String),

    #[error("Unexpected Error: {0}")]
    Custom(String),
}

/// Error messages for the API Responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMessages {
    Internal,
    DatabaseConnection,
    PayloadTooLarge,
    InvalidBody,
    InvalidSignature,
    InvalidEvent,
    Timeout,
    RouteNotFound,
    Generic,
}

impl fmt::Display for ErrorMessages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorMessages::Internal => "Internal server error",
            ErrorMessages::DatabaseConnection => "Database connection failed",
            ErrorMessages::PayloadTooLarge => "Payload too large",
            ErrorMessages::InvalidBody => "Invalid request body",
            ErrorMessages::InvalidSignature => "Invalid webhook signature",
            ErrorMessages::InvalidEvent => "Invalid webhook payload",
            ErrorMessages::Timeout => "Request timed out",
            ErrorMessages::RouteNotFound => "Route not found",
            ErrorMessages::Generic => "Something went wrong",
        };
        write!(f, "{message}")
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InvalidBody(_) | ApiError::Signature(_) | ApiError::InvalidEvent(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Database(_)
            | ApiError::DatabaseNotConfigured
            | ApiError::WebhookSecretMissing
            | ApiError::Panic(_)
            | ApiError::Custom(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn headline(&self) -> ErrorMessages {
        match self {
            ApiError::Database(_) | ApiError::DatabaseNotConfigured => {
                ErrorMessages::DatabaseConnection
            }
            ApiError::PayloadTooLarge { .. } => ErrorMessages::PayloadTooLarge,
            ApiError::InvalidBody(_) => ErrorMessages::InvalidBody,
            ApiError::Signature(_) => ErrorMessages::InvalidSignature,
            ApiError::InvalidEvent(_) => ErrorMessages::InvalidEvent,
            ApiError::Timeout => ErrorMessages::Timeout,
            ApiError::WebhookSecretMissing | ApiError::Panic(_) | ApiError::Custom(_) => {
                ErrorMessages::Internal
            }
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            status: self.status(),
            headline: self.headline(),
            detail: self.to_string(),
        }
    }
}

/// Error envelope returned to clients
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error carried on a response until the terminal error stage renders it
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub headline: ErrorMessages,
    pub detail: String,
}

impl ErrorReport {
    /// Builds the client-facing envelope, withholding the detail outside development
    pub fn envelope(&self, environment: &Environment) -> ErrorResponse {
        let message = if environment.exposes_error_details() {
            Some(self.detail.clone())
        } else if self.status.is_server_error() {
            Some(ErrorMessages::Generic.to_string())
        } else {
            None
        };

        ErrorResponse {
            error: self.headline.to_string(),
            message,
        }
    }

    pub fn render(&self, environment: &Environment) -> Response {
        (self.status, Json(self.envelope(environment))).into_response()
    }
}

// The body is filled in by the error-rendering middleware, which knows the environment
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report();
        let mut response = report.status.into_response();
        response.extensions_mut().insert(report);
        response
    }
}
