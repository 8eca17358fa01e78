//! Extraction results shared by every input adapter
//!
//! An adapter either fails structurally ([`StructuralError`]) or returns an
//! [`ExtractionResult`] that records which fields it could resolve. Only a
//! complete result can become a [`FeatureVector`].

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::schema::{FeatureField, FeatureVector};

// ============================================================================
// Errors
// ============================================================================

/// The input as a whole cannot be extracted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// Required columns absent from a dataset header
    #[error("Missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// The document yielded effectively no text
    #[error("Document appears to be empty or unreadable. Extracted text length: {length} characters")]
    UnreadableDocument { length: usize },
}

/// A result with unresolved fields was asked for a feature vector
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required features: {}. Found: {}", join_fields(.missing), join_fields(.found))]
pub struct IncompleteExtraction {
    pub missing: Vec<FeatureField>,
    pub found: Vec<FeatureField>,
}

fn join_fields(fields: &[FeatureField]) -> String {
    if fields.is_empty() {
        return "none".to_string();
    }
    fields.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ")
}

// ============================================================================
// Result
// ============================================================================

/// Values resolved for each schema field
///
/// Immutable once built; use [`ExtractionResult::builder`] to assemble one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExtractionResult {
    values: [Option<f64>; FeatureField::COUNT],
}

impl ExtractionResult {
    pub fn builder() -> ExtractionResultBuilder {
        ExtractionResultBuilder::default()
    }

    /// Resolved value for a field
    pub fn get(&self, field: FeatureField) -> Option<f64> {
        self.values[field.index()]
    }

    /// Resolved `(field, value)` pairs in schema order
    pub fn values(&self) -> impl Iterator<Item = (FeatureField, f64)> + '_ {
        FeatureField::ALL
            .into_iter()
            .filter_map(|f| self.values[f.index()].map(|v| (f, v)))
    }

    pub fn found_fields(&self) -> Vec<FeatureField> {
        self.values().map(|(f, _)| f).collect()
    }

    /// Unresolved fields in schema order
    pub fn missing_fields(&self) -> Vec<FeatureField> {
        FeatureField::ALL
            .into_iter()
            .filter(|f| self.values[f.index()].is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    /// True when nothing at all was resolved
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Convert a complete result into a feature vector
    pub fn to_feature_vector(&self) -> Result<FeatureVector, IncompleteExtraction> {
        let incomplete = || IncompleteExtraction {
            missing: self.missing_fields(),
            found: self.found_fields(),
        };

        let mut values = [0.0; FeatureField::COUNT];
        for field in FeatureField::ALL {
            values[field.index()] = self.values[field.index()].ok_or_else(incomplete)?;
        }

        // Builder input is already checked per field
        FeatureVector::new(values).map_err(|_| incomplete())
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ExtractionResult", 2)?;
        state.serialize_field("values", &ResolvedValues(self))?;
        state.serialize_field("missingFields", &self.missing_fields())?;
        state.end()
    }
}

/// Serializes resolved values as a map in schema order
struct ResolvedValues<'a>(&'a ExtractionResult);

impl Serialize for ResolvedValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (field, value) in self.0.values() {
            map.serialize_entry(field.name(), &value)?;
        }
        map.end()
    }
}

/// Accumulates resolved fields for one extraction
#[derive(Debug, Default)]
pub struct ExtractionResultBuilder {
    values: [Option<f64>; FeatureField::COUNT],
}

impl ExtractionResultBuilder {
    /// Record a value; values violating the field's constraints stay unresolved
    pub fn resolve(&mut self, field: FeatureField, value: f64) -> &mut Self {
        self.values[field.index()] = field.check(value).ok();
        self
    }

    pub fn build(&self) -> ExtractionResult {
        ExtractionResult {
            values: self.values,
        }
    }
}
