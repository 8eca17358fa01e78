//! Gluco Extractor - Feature extraction pipeline
//!
//! Maps raw inputs onto the eight-field feature schema:
//! - [`TabularAdapter`]: CSV datasets, one result per row
//! - [`TextAdapter`]: free text from PDFs, one result per document
//!
//! Both adapters are pure and stateless. Structural problems (missing columns,
//! unreadable documents) are errors; unresolved fields are data, reported on
//! each [`ExtractionResult`].

pub mod tabular;
pub mod text;

pub use tabular::TabularAdapter;
pub use text::TextAdapter;

use gluco_core::{ExtractionResult, FeatureField, FeatureVector, StructuralError};
use gluco_parser::{FileType, ParsedDocument};
use serde::Serialize;
use thiserror::Error;

/// Extraction output for a whole document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentExtraction {
    /// One result per dataset row
    Rows { rows: Vec<ExtractionResult> },
    /// A single result for a text document
    Text { result: ExtractionResult },
}

/// Route a parsed document to the matching adapter
///
/// Text documents shorter than `min_text_chars` (after trimming) are rejected
/// as unreadable before any matching is attempted.
pub fn extract_document(
    doc: &ParsedDocument,
    min_text_chars: usize,
) -> Result<DocumentExtraction, StructuralError> {
    match (&doc.table, doc.file_type) {
        (Some(table), _) => Ok(DocumentExtraction::Rows {
            rows: TabularAdapter::new().extract(table)?,
        }),
        (None, FileType::Csv) => Err(StructuralError::MissingColumns {
            missing: FeatureField::ALL
                .iter()
                .map(|f| f.column_name().to_string())
                .collect(),
        }),
        (None, _) => {
            if !doc.is_readable(min_text_chars) {
                return Err(StructuralError::UnreadableDocument {
                    length: doc.char_count(),
                });
            }
            Ok(DocumentExtraction::Text {
                result: TextAdapter::new().extract(&doc.content),
            })
        }
    }
}

/// A dataset row that could not be fully resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Row {row} has invalid values for: {}", .fields.iter().map(|f| f.name()).collect::<Vec<_>>().join(", "))]
pub struct IncompleteRow {
    /// 1-based data row number (header excluded)
    pub row: usize,
    pub fields: Vec<FeatureField>,
}

/// Feature vectors for a batch, or the first row that is incomplete
pub fn complete_rows(results: &[ExtractionResult]) -> Result<Vec<FeatureVector>, IncompleteRow> {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            result.to_feature_vector().map_err(|e| IncompleteRow {
                row: i + 1,
                fields: e.missing,
            })
        })
        .collect()
}
