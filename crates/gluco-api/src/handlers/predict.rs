//! Prediction handlers
//!
//! Every route checks for a loaded model before touching its input, so a
//! missing model is reported the same way regardless of what was uploaded.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    Json,
};
use gluco_core::{NewPatientRecord, PatientInput, StructuralError};
use gluco_extractor::{complete_rows, TabularAdapter, TextAdapter};
use gluco_parser::{CsvParser, DocumentParser, FileType, ParsedDocument, PdfParser};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use utoipa::ToSchema;

// ============================================================================
// Response Types
// ============================================================================

/// Single prediction response
#[derive(Debug, Serialize, ToSchema)]
pub struct PredictionResponse {
    /// Predicted label (0 = low risk, 1 = high risk)
    #[schema(example = 1)]
    pub diabetes_risk: u8,

    /// Id of the stored record
    #[schema(example = 42)]
    pub record_id: i64,
}

/// Batch prediction response
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchPredictionResponse {
    /// Number of rows predicted
    #[schema(example = 2)]
    pub count: usize,

    /// One label per dataset row, in row order
    #[schema(example = json!([1, 0]))]
    pub predictions: Vec<u8>,
}

/// Document prediction response
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentPredictionResponse {
    /// Predicted label
    pub prediction: u8,

    /// Values resolved from the document, keyed by field name
    pub features: BTreeMap<String, f64>,

    /// Characters of text extracted from the document
    pub extracted_text_length: usize,

    pub message: String,
}

/// Multipart upload form
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Predict from structured patient vitals
#[utoipa::path(
    post,
    path = "/predict",
    tag = "predict",
    request_body = PatientInput,
    responses(
        (status = 200, description = "Prediction stored", body = PredictionResponse),
        (status = 422, description = "Invalid input", body = crate::error::ApiError),
        (status = 503, description = "Model not loaded", body = crate::error::ApiError)
    )
)]
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PatientInput>,
) -> Result<Json<PredictionResponse>, AppError> {
    state.increment_requests();
    let predictor = state.predictor()?;

    let features = input.to_feature_vector()?;
    let label = predictor.predict(&features)?;

    let record = state
        .records
        .create_record(&NewPatientRecord::new(input, Some(label)))
        .await?;

    tracing::info!(record_id = record.id, diabetes_risk = label, "Stored prediction");

    Ok(Json(PredictionResponse {
        diabetes_risk: label,
        record_id: record.id,
    }))
}

/// Predict every row of a CSV dataset
///
/// Rows are not stored. Any row with an unresolvable field rejects the batch.
#[utoipa::path(
    post,
    path = "/predict/csv",
    tag = "predict",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Batch predictions", body = BatchPredictionResponse),
        (status = 400, description = "Missing columns or invalid rows", body = crate::error::ApiError),
        (status = 503, description = "Model not loaded", body = crate::error::ApiError)
    )
)]
pub async fn predict_csv(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<BatchPredictionResponse>, AppError> {
    state.increment_requests();
    let predictor = state.predictor()?.clone();

    let upload = read_upload(multipart, FileType::Csv).await?;

    let rows = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let table = CsvParser::new().read_table(&upload.bytes)?;
        Ok(TabularAdapter::new().extract(&table)?)
    })
    .await
    .map_err(|e| AppError::Internal(format!("CSV task failed: {e}")))??;

    let vectors = complete_rows(&rows)?;
    let predictions = predictor.predict_batch(&vectors)?;

    tracing::info!(rows = predictions.len(), "Predicted CSV batch");

    Ok(Json(BatchPredictionResponse {
        count: predictions.len(),
        predictions,
    }))
}

/// Predict from a PDF report
///
/// The upload is spooled to a temporary file that is removed on every exit
/// path. The result is not stored.
#[utoipa::path(
    post,
    path = "/predict/pdf",
    tag = "predict",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document prediction", body = DocumentPredictionResponse),
        (status = 400, description = "Unreadable document or incomplete features", body = crate::error::ApiError),
        (status = 503, description = "Model not loaded", body = crate::error::ApiError)
    )
)]
pub async fn predict_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<DocumentPredictionResponse>, AppError> {
    state.increment_requests();
    let predictor = state.predictor()?.clone();

    let upload = read_upload(multipart, FileType::Pdf).await?;
    let file_name = upload.file_name.clone();

    let doc = tokio::task::spawn_blocking(move || spool_and_parse_pdf(&upload))
        .await
        .map_err(|e| AppError::Internal(format!("PDF task failed: {e}")))??;

    let min_chars = state.config.extraction.min_text_chars;
    if !doc.is_readable(min_chars) {
        tracing::warn!(file = %file_name, chars = doc.char_count(), "PDF has no usable text");
        return Err(StructuralError::UnreadableDocument {
            length: doc.char_count(),
        }
        .into());
    }

    tracing::debug!(
        file = %file_name,
        preview = doc.preview(state.config.extraction.preview_chars),
        "PDF text preview"
    );

    let result = TextAdapter::new().extract(&doc.content);
    if result.is_empty() {
        return Err(AppError::NoFeatures);
    }

    let features = result.to_feature_vector()?;
    let prediction = predictor.predict(&features)?;

    tracing::info!(file = %file_name, prediction, "Predicted from PDF");

    Ok(Json(DocumentPredictionResponse {
        prediction,
        features: result
            .values()
            .map(|(field, value)| (field.name().to_string(), value))
            .collect(),
        extracted_text_length: doc.char_count(),
        message: "PDF processed successfully".to_string(),
    }))
}

// ============================================================================
// Upload helpers
// ============================================================================

struct Upload {
    file_name: String,
    bytes: Bytes,
}

/// Read the `file` field of a multipart form, checking its extension
async fn read_upload(mut multipart: Multipart, expected: FileType) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if FileType::from_file_name(&file_name) != expected {
            return Err(AppError::BadRequest(format!(
                "File must be a {}",
                expected.to_string().to_uppercase()
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;

        tracing::debug!(file = %file_name, bytes = bytes.len(), "Received upload");
        return Ok(Upload { file_name, bytes });
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

fn spool_and_parse_pdf(upload: &Upload) -> Result<ParsedDocument, AppError> {
    let io_error = |e: std::io::Error| AppError::Internal(format!("Failed to spool upload: {e}"));

    let mut spool = tempfile::Builder::new()
        .prefix("gluco-upload-")
        .suffix(".pdf")
        .tempfile()
        .map_err(io_error)?;
    spool.write_all(&upload.bytes).map_err(io_error)?;
    spool.flush().map_err(io_error)?;

    let mut doc = PdfParser::new().parse(spool.path())?;
    doc.file_name = upload.file_name.clone();
    Ok(doc)
}
