//! Feature schema for the diabetes risk classifier
//!
//! The classifier consumes exactly eight numeric features in a fixed order.
//! Every adapter resolves its input against [`FeatureField::ALL`], and the
//! order of that array is the order the predictor was trained on. Reordering
//! it silently corrupts predictions.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

// ============================================================================
// Fields
// ============================================================================

/// One of the eight features the classifier consumes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FeatureField {
    Pregnancies,
    Glucose,
    BloodPressure,
    SkinThickness,
    Insulin,
    Bmi,
    DiabetesPedigreeFunction,
    Age,
}

/// Numeric kind of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Whole, non-negative counts (pregnancies, age)
    Integer,
    /// Real-valued measurements
    Real,
}

impl FeatureField {
    /// Number of features in the schema
    pub const COUNT: usize = 8;

    /// All fields in predictor order
    pub const ALL: [FeatureField; Self::COUNT] = [
        Self::Pregnancies,
        Self::Glucose,
        Self::BloodPressure,
        Self::SkinThickness,
        Self::Insulin,
        Self::Bmi,
        Self::DiabetesPedigreeFunction,
        Self::Age,
    ];

    /// Position of this field in the feature vector
    pub fn index(self) -> usize {
        self as usize
    }

    /// Internal snake_case name
    pub fn name(self) -> &'static str {
        match self {
            Self::Pregnancies => "pregnancies",
            Self::Glucose => "glucose",
            Self::BloodPressure => "blood_pressure",
            Self::SkinThickness => "skin_thickness",
            Self::Insulin => "insulin",
            Self::Bmi => "bmi",
            Self::DiabetesPedigreeFunction => "diabetes_pedigree_function",
            Self::Age => "age",
        }
    }

    /// Column name used by tabular datasets
    pub fn column_name(self) -> &'static str {
        match self {
            Self::Pregnancies => "Pregnancies",
            Self::Glucose => "Glucose",
            Self::BloodPressure => "BloodPressure",
            Self::SkinThickness => "SkinThickness",
            Self::Insulin => "Insulin",
            Self::Bmi => "BMI",
            Self::DiabetesPedigreeFunction => "DiabetesPedigreeFunction",
            Self::Age => "Age",
        }
    }

    pub fn kind(self) -> FeatureKind {
        match self {
            Self::Pregnancies | Self::Age => FeatureKind::Integer,
            _ => FeatureKind::Real,
        }
    }

    /// Look up a field by its internal name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Look up a field by its exact tabular column name
    pub fn from_column_name(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column_name() == column)
    }

    /// Check a value against the field's constraints
    pub fn check(self, value: f64) -> Result<f64, ValueError> {
        if !value.is_finite() {
            return Err(ValueError::NotFinite { field: self });
        }
        if value < 0.0 {
            return Err(ValueError::Negative { field: self, value });
        }
        if self.kind() == FeatureKind::Integer && value.fract() != 0.0 {
            return Err(ValueError::NotInteger { field: self, value });
        }
        Ok(value)
    }
}

impl std::fmt::Display for FeatureField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A feature value that violates the schema
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("{field} must be a finite number")]
    NotFinite { field: FeatureField },

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: FeatureField, value: f64 },

    #[error("{field} must be a whole number, got {value}")]
    NotInteger { field: FeatureField, value: f64 },
}

// ============================================================================
// Feature vector
// ============================================================================

/// Eight validated feature values in predictor order
///
/// This is the only shape the predictor accepts. It can be built from a
/// complete extraction or from a validated [`PatientInput`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; FeatureField::COUNT]);

impl FeatureVector {
    /// Build a vector, checking every value against its field
    pub fn new(values: [f64; FeatureField::COUNT]) -> Result<Self, ValueError> {
        for field in FeatureField::ALL {
            field.check(values[field.index()])?;
        }
        Ok(Self(values))
    }

    pub fn get(&self, field: FeatureField) -> f64 {
        self.0[field.index()]
    }

    pub fn as_array(&self) -> &[f64; FeatureField::COUNT] {
        &self.0
    }

    /// Iterate `(field, value)` pairs in predictor order
    pub fn iter(&self) -> impl Iterator<Item = (FeatureField, f64)> + '_ {
        FeatureField::ALL.into_iter().map(|f| (f, self.0[f.index()]))
    }
}

// ============================================================================
// Structured input
// ============================================================================

/// Patient vitals submitted as structured JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct PatientInput {
    #[validate(range(min = 0))]
    #[schema(example = 1)]
    pub pregnancies: i64,

    #[validate(range(min = 0.0))]
    #[schema(example = 120.0)]
    pub glucose: f64,

    #[validate(range(min = 0.0))]
    #[schema(example = 70.0)]
    pub blood_pressure: f64,

    #[validate(range(min = 0.0))]
    #[schema(example = 20.0)]
    pub skin_thickness: f64,

    #[validate(range(min = 0.0))]
    #[schema(example = 80.0)]
    pub insulin: f64,

    #[validate(range(min = 0.0))]
    #[schema(example = 25.0)]
    pub bmi: f64,

    #[validate(range(min = 0.0))]
    #[schema(example = 0.5)]
    pub diabetes_pedigree_function: f64,

    #[validate(range(min = 0))]
    #[schema(example = 30)]
    pub age: i64,

    /// Known ground-truth outcome, if any
    #[serde(default)]
    #[validate(range(min = 0, max = 1))]
    pub outcome: Option<i64>,
}

impl PatientInput {
    /// Validate and convert to a feature vector
    pub fn to_feature_vector(&self) -> crate::Result<FeatureVector> {
        self.validate()
            .map_err(|e| crate::GlucoError::ValidationError(e.to_string()))?;

        FeatureVector::new([
            self.pregnancies as f64,
            self.glucose,
            self.blood_pressure,
            self.skin_thickness,
            self.insulin,
            self.bmi,
            self.diabetes_pedigree_function,
            self.age as f64,
        ])
        .map_err(|e| crate::GlucoError::ValidationError(e.to_string()))
    }

    /// Build an input from a feature vector (no known outcome)
    pub fn from_feature_vector(vector: &FeatureVector) -> Self {
        Self {
            pregnancies: vector.get(FeatureField::Pregnancies) as i64,
            glucose: vector.get(FeatureField::Glucose),
            blood_pressure: vector.get(FeatureField::BloodPressure),
            skin_thickness: vector.get(FeatureField::SkinThickness),
            insulin: vector.get(FeatureField::Insulin),
            bmi: vector.get(FeatureField::Bmi),
            diabetes_pedigree_function: vector.get(FeatureField::DiabetesPedigreeFunction),
            age: vector.get(FeatureField::Age) as i64,
            outcome: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> PatientInput {
        PatientInput {
            pregnancies: 2,
            glucose: 120.5,
            blood_pressure: 70.0,
            skin_thickness: 19.0,
            insulin: 85.0,
            bmi: 23.4,
            diabetes_pedigree_function: 0.5,
            age: 45,
            outcome: None,
        }
    }

    #[test]
    fn test_schema_order_is_fixed() {
        let names: Vec<_> = FeatureField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "pregnancies",
                "glucose",
                "blood_pressure",
                "skin_thickness",
                "insulin",
                "bmi",
                "diabetes_pedigree_function",
                "age"
            ]
        );
        for (i, field) in FeatureField::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
        }
    }

    #[test]
    fn test_name_mapping_round_trips() {
        for field in FeatureField::ALL {
            assert_eq!(FeatureField::from_name(field.name()), Some(field));
            assert_eq!(FeatureField::from_column_name(field.column_name()), Some(field));
        }
        assert_eq!(FeatureField::from_column_name("bmi"), None);
        assert_eq!(FeatureField::from_name("BMI"), None);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&FeatureField::DiabetesPedigreeFunction).unwrap();
        assert_eq!(json, "\"diabetes_pedigree_function\"");
    }

    #[test]
    fn test_value_checks() {
        assert!(FeatureField::Glucose.check(120.5).is_ok());
        assert!(FeatureField::Age.check(45.0).is_ok());
        assert!(matches!(
            FeatureField::Age.check(45.5),
            Err(ValueError::NotInteger { .. })
        ));
        assert!(matches!(
            FeatureField::Insulin.check(-1.0),
            Err(ValueError::Negative { .. })
        ));
        assert!(matches!(
            FeatureField::Bmi.check(f64::NAN),
            Err(ValueError::NotFinite { .. })
        ));
    }

    #[test]
    fn test_patient_input_to_vector() {
        let vector = sample_input().to_feature_vector().unwrap();
        assert_eq!(
            vector.as_array(),
            &[2.0, 120.5, 70.0, 19.0, 85.0, 23.4, 0.5, 45.0]
        );
        assert_eq!(PatientInput::from_feature_vector(&vector), sample_input());
    }

    #[test]
    fn test_patient_input_rejects_negative_values() {
        let mut input = sample_input();
        input.glucose = -3.0;
        assert!(input.to_feature_vector().is_err());

        let mut input = sample_input();
        input.outcome = Some(2);
        assert!(input.to_feature_vector().is_err());
    }
}
