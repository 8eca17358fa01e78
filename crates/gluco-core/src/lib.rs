//! Gluco Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout Gluco:
//! - The eight-field feature schema the classifier consumes
//! - Extraction results shared by the tabular and text adapters
//! - Common error types
//! - Traits for the predictor and LLM collaborators
//! - Configuration management
//! - Prediction record storage (SQLite)

pub mod config;
pub mod extraction;
pub mod records;
pub mod schema;

pub use config::{
    AppConfig, ConfigError, DatabaseConfig, ExtractionConfig, LlmConfig, LlmProvider,
    LoggingConfig, ModelConfig, ServerConfig,
};
pub use extraction::{ExtractionResult, ExtractionResultBuilder, IncompleteExtraction, StructuralError};
pub use records::{NewPatientRecord, PatientRecord, RecordRepository, SqliteRecordStore};
pub use schema::{FeatureField, FeatureKind, FeatureVector, PatientInput, ValueError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Gluco operations
#[derive(Error, Debug)]
pub enum GlucoError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Incomplete(#[from] IncompleteExtraction),

    #[error("Prediction model not loaded: {0}")]
    ModelUnavailable(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for GlucoError {
    fn from(err: ConfigError) -> Self {
        GlucoError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GlucoError>;

// ============================================================================
// Chat messages
// ============================================================================

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single chat message sent to an LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Binary diabetes risk classifier
///
/// Implementations only ever see complete, correctly ordered vectors.
pub trait Predictor: Send + Sync {
    /// Predict a label (0 = negative, 1 = positive)
    fn predict(&self, features: &FeatureVector) -> Result<u8>;

    /// Predict labels for a batch, in input order
    fn predict_batch(&self, rows: &[FeatureVector]) -> Result<Vec<u8>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Model name for logging
    fn name(&self) -> &str;
}

/// Trait for LLM clients
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a reply to a conversation
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Client name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
