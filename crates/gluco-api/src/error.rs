//! API error handling
//!
//! Every failure leaves the API as an [`ApiError`] JSON body with a stable
//! machine-readable `code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gluco_core::{FeatureField, GlucoError, IncompleteExtraction, StructuralError};
use gluco_extractor::IncompleteRow;
use gluco_parser::ParserError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    #[schema(example = "INCOMPLETE_FEATURES")]
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Schema fields or dataset columns that could not be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<String>>,
    /// Schema fields that were resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_fields: Option<Vec<String>>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            missing_fields: None,
            found_fields: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_missing(mut self, fields: Vec<String>) -> Self {
        self.missing_fields = Some(fields);
        self
    }

    pub fn with_found(mut self, fields: Vec<String>) -> Self {
        self.found_fields = Some(fields);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

fn field_names(fields: &[FeatureField]) -> Vec<String> {
    fields.iter().map(|f| f.name().to_string()).collect()
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Validation(String),
    Structural(StructuralError),
    /// A text document resolved some but not all fields
    Incomplete(IncompleteExtraction),
    /// A dataset row could not be fully resolved
    IncompleteRow(IncompleteRow),
    /// A text document resolved no fields at all
    NoFeatures,
    Parse(String),
    ModelUnavailable,
    Model(String),
    Database(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::bad_request(msg)),
            AppError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("VALIDATION_ERROR", msg),
            ),
            AppError::Structural(err) => {
                let message = err.to_string();
                match err {
                    StructuralError::MissingColumns { missing } => (
                        StatusCode::BAD_REQUEST,
                        ApiError::new("MISSING_COLUMNS", message).with_missing(missing),
                    ),
                    StructuralError::UnreadableDocument { .. } => (
                        StatusCode::BAD_REQUEST,
                        ApiError::new("UNREADABLE_DOCUMENT", message),
                    ),
                }
            }
            AppError::Incomplete(err) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INCOMPLETE_FEATURES", err.to_string())
                    .with_details("Please ensure all 8 features are present in the document.")
                    .with_missing(field_names(&err.missing))
                    .with_found(field_names(&err.found)),
            ),
            AppError::IncompleteRow(err) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INCOMPLETE_FEATURES", err.to_string())
                    .with_details(format!("row {}", err.row))
                    .with_missing(field_names(&err.fields)),
            ),
            AppError::NoFeatures => (
                StatusCode::BAD_REQUEST,
                ApiError::new(
                    "NO_FEATURES",
                    "Could not extract any features from the document",
                )
                .with_details(
                    "Ensure the document contains text with values like: \
                     Pregnancies: 1, Glucose: 120, BloodPressure: 70",
                )
                .with_missing(field_names(&FeatureField::ALL)),
            ),
            AppError::Parse(msg) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("PARSE_ERROR", "Failed to read the uploaded file").with_details(msg),
            ),
            AppError::ModelUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new("MODEL_UNAVAILABLE", "Model not loaded"),
            ),
            AppError::Model(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("MODEL_ERROR", "Prediction failed").with_details(msg),
            ),
            AppError::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("DATABASE_ERROR", "Database operation failed").with_details(msg),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::internal_error().with_details(msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StructuralError> for AppError {
    fn from(err: StructuralError) -> Self {
        AppError::Structural(err)
    }
}

impl From<IncompleteExtraction> for AppError {
    fn from(err: IncompleteExtraction) -> Self {
        AppError::Incomplete(err)
    }
}

impl From<IncompleteRow> for AppError {
    fn from(err: IncompleteRow) -> Self {
        AppError::IncompleteRow(err)
    }
}

impl From<ParserError> for AppError {
    fn from(err: ParserError) -> Self {
        match err {
            ParserError::UnsupportedFormat(ext) => {
                AppError::BadRequest(format!("Unsupported file format: {ext}"))
            }
            other => AppError::Parse(other.to_string()),
        }
    }
}

impl From<GlucoError> for AppError {
    fn from(err: GlucoError) -> Self {
        match err {
            GlucoError::ValidationError(msg) => AppError::Validation(msg),
            GlucoError::Structural(err) => AppError::Structural(err),
            GlucoError::Incomplete(err) => AppError::Incomplete(err),
            GlucoError::ModelUnavailable(_) => AppError::ModelUnavailable,
            GlucoError::ModelError(msg) => AppError::Model(msg),
            GlucoError::DatabaseError(msg) => AppError::Database(msg),
            GlucoError::LlmError(msg) => AppError::Internal(format!("LLM error: {msg}")),
            GlucoError::ConfigError(msg) => {
                AppError::Internal(format!("Configuration error: {msg}"))
            }
            GlucoError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}
