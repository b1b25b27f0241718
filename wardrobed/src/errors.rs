use crate::db::errors::DbError;
use crate::gateway::GatewayError;
use crate::storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Bearer credential missing, malformed, or failed verification
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Invalid request data (missing fields, empty uploads, bad parameters)
    #[error("{message}")]
    Validation { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Inference gateway failure: connection, invocation, or timeout
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Gateway responded but its payload matched no recognized shape
    #[error("unrecognized inference output: {detail}")]
    UnrecognizedOutput { detail: String },

    /// Fetching a gateway-produced or caller-supplied image URL failed
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Blob store operation error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Metadata store operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            // A gateway that answered with an unusable payload is our problem
            // to report; an unreachable or failing gateway is unavailability.
            Error::Gateway(GatewayError::Response { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Gateway(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::UnrecognizedOutput { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Fetch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::Validation { message } => message.clone(),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::Gateway(gw_err) => match gw_err {
                GatewayError::Timeout { .. } => "AI service timed out".to_string(),
                GatewayError::Response { .. } => "AI service returned no usable output".to_string(),
                _ => "AI service unavailable".to_string(),
            },
            Error::UnrecognizedOutput { .. } => "AI service returned no usable output".to_string(),
            Error::Fetch { .. } => "Failed to fetch image".to_string(),
            Error::Storage(_) => "Storage operation failed".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Storage(_) | Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::UnrecognizedOutput { .. } | Error::Fetch { .. } => {
                tracing::error!("Upstream result error: {:#}", self);
            }
            Error::Gateway(_) => {
                tracing::warn!("Inference gateway error: {}", self);
            }
            Error::Unauthenticated { .. } => {
                tracing::info!("Authentication error: {}", self);
            }
            Error::Validation { .. } | Error::NotFound { .. } | Error::Database(DbError::NotFound) => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let message = self.user_message();

        // Upstream failures carry the underlying detail so callers can distinguish
        // unavailability from bad output; everything else stays opaque.
        let body = match &self {
            Error::Gateway(_) | Error::UnrecognizedOutput { .. } | Error::Fetch { .. } => {
                json!({ "error": message, "details": self.to_string() })
            }
            _ => json!({ "error": message }),
        };

        (status, axum::response::Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
