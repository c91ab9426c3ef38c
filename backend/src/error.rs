//! Error handling for the Manufacturing ERP backend
//!
//! Validation-class errors (insufficient stock, empty formulation, bad
//! reference) are expected and user-facing; integrity-class failures
//! (database errors mid-transaction) roll back and surface generically.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use shared::{CostingError, Shortage, UnitMismatchError};

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Formulation {0} has no ingredients")]
    EmptyFormulation(Uuid),

    #[error("Insufficient inventory for {} item(s)", shortages.len())]
    InsufficientInventory { shortages: Vec<Shortage> },

    #[error("Cyclic formulation reference involving {formulation_id} (depth {depth})")]
    CyclicFormulation { formulation_id: Uuid, depth: usize },

    #[error("Unit mismatch: {0}")]
    UnitMismatch(#[from] UnitMismatchError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<CostingError> for AppError {
    fn from(err: CostingError) -> Self {
        match err {
            CostingError::UnknownFormulation(id) => {
                AppError::InvalidReference(format!("formulation {id}"))
            }
            CostingError::UnknownMaterial(id) => {
                AppError::InvalidReference(format!("raw material {id}"))
            }
            CostingError::UnknownBulkProduct(id) => {
                AppError::InvalidReference(format!("bulk product {id}"))
            }
            CostingError::EmptyFormulation(id) => AppError::EmptyFormulation(id),
            CostingError::CyclicFormulation {
                formulation_id,
                depth,
            } => AppError::CyclicFormulation {
                formulation_id,
                depth,
            },
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                    details: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                    details: None,
                },
            ),
            AppError::InvalidReference(what) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_REFERENCE".to_string(),
                    message: format!("Referenced {} does not exist", what),
                    field: None,
                    details: None,
                },
            ),
            AppError::EmptyFormulation(id) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "EMPTY_FORMULATION".to_string(),
                    message: format!("Formulation {} has no ingredients", id),
                    field: None,
                    details: None,
                },
            ),
            AppError::InsufficientInventory { shortages } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_INVENTORY".to_string(),
                    message: format!(
                        "Insufficient inventory for {} item(s)",
                        shortages.len()
                    ),
                    field: None,
                    details: serde_json::to_value(shortages).ok(),
                },
            ),
            AppError::CyclicFormulation {
                formulation_id, ..
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "CYCLIC_FORMULATION".to_string(),
                    message: format!(
                        "Formulation {} participates in a cyclic reference chain",
                        formulation_id
                    ),
                    field: None,
                    details: None,
                },
            ),
            AppError::UnitMismatch(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "UNIT_MISMATCH".to_string(),
                    message: err.to_string(),
                    field: None,
                    details: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message: format!("Configuration error: {}", msg),
                    field: None,
                    details: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                    details: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                    details: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                    details: None,
                },
            ),
        };

        // Integrity-class failures get full context in the log; validation
        // errors are routine and logged at debug
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => tracing::error!("Error: {:?}", self),
            _ => tracing::debug!("Request error: {:?}", self),
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;

/// Map a `&'static str` validation failure onto a field
pub fn validation_error(field: &str, message: &str) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}
