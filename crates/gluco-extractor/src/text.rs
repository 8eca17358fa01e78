//! Feature extraction from free text
//!
//! Text extracted from medical PDFs has no reliable layout, so each field is
//! found by a single regex search over the whole document:
//!
//! ```text
//! <key alternation> \s* [:=-]? \s* <number>
//! ```
//!
//! The first match anywhere in the text wins. Repeated mentions are not
//! disambiguated and matches are not anchored to any section, so an unrelated
//! phrase such as "page 3" can be read as `age = 3`. Numbers must be written
//! with ASCII digits: "Glucose: ١٢٠" leaves glucose unresolved.

use once_cell::sync::Lazy;
use regex::Regex;

use gluco_core::{ExtractionResult, FeatureField, FeatureKind};

// ASCII digits only; other scripts' numerals are not read
const INTEGER: &str = r"([0-9]+)";
const REAL: &str = r"([0-9]+(?:\.[0-9]+)?)";

/// Compiled pattern for one schema field
struct FieldPattern {
    field: FeatureField,
    regex: Regex,
}

/// Key alternations: full name, abbreviation, synonyms
fn field_keys(field: FeatureField) -> &'static str {
    match field {
        FeatureField::Pregnancies => r"pregnancies?|preg",
        FeatureField::Glucose => r"glucose|glu",
        FeatureField::BloodPressure => r"blood\s*pressure|bp|bloodpressure",
        FeatureField::SkinThickness => r"skin\s*thickness|skin|skinthickness",
        FeatureField::Insulin => r"insulin|ins",
        FeatureField::Bmi => r"bmi|body\s*mass\s*index",
        FeatureField::DiabetesPedigreeFunction => r"dpf|diabetes\s*pedigree\s*function|pedigree",
        FeatureField::Age => r"age",
    }
}

static FIELD_PATTERNS: Lazy<Vec<FieldPattern>> = Lazy::new(|| {
    FeatureField::ALL
        .into_iter()
        .map(|field| {
            let value = match field.kind() {
                FeatureKind::Integer => INTEGER,
                FeatureKind::Real => REAL,
            };
            let pattern = format!(r"(?:{})\s*[:=-]?\s*{value}", field_keys(field));
            FieldPattern {
                field,
                regex: Regex::new(&pattern).expect("field patterns are valid regexes"),
            }
        })
        .collect()
});

/// Maps unstructured text onto the feature schema
#[derive(Debug, Clone, Copy, Default)]
pub struct TextAdapter;

impl TextAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Resolve as many schema fields as the text mentions
    ///
    /// Rejecting trivially short text is the caller's job.
    pub fn extract(&self, text: &str) -> ExtractionResult {
        let normalized = text.to_lowercase();
        let mut builder = ExtractionResult::builder();

        for pattern in FIELD_PATTERNS.iter() {
            let value = pattern
                .regex
                .captures(&normalized)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok());

            match value {
                Some(v) => {
                    builder.resolve(pattern.field, v);
                }
                None => {
                    tracing::trace!(field = %pattern.field, "No usable match");
                }
            }
        }

        let result = builder.build();
        tracing::debug!(
            found = result.found_fields().len(),
            missing = ?result.missing_fields(),
            "Text extraction finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FULL_TEXT: &str = "GLUCOSE: 120, Age=45, bmi 23.4, Pregnancies:2, bp=70, \
                             Insulin 85, skin thickness: 19, DPF=0.5";

    #[test]
    fn test_resolves_all_fields_in_any_order_and_case() {
        let result = TextAdapter::new().extract(FULL_TEXT);

        assert!(result.is_complete());
        assert!(result.missing_fields().is_empty());
        assert_eq!(
            result.to_feature_vector().unwrap().as_array(),
            &[2.0, 120.0, 70.0, 19.0, 85.0, 23.4, 0.5, 45.0]
        );
    }

    #[test]
    fn test_single_missing_field() {
        let text = "Glucose: 120, BMI: 23.4, Pregnancies: 2, Blood Pressure: 70, \
                    Insulin: 85, Skin Thickness: 19, Diabetes Pedigree Function: 0.5";
        let result = TextAdapter::new().extract(text);

        assert_eq!(result.missing_fields(), vec![FeatureField::Age]);
        assert_eq!(result.values().count(), 7);
        assert_eq!(result.get(FeatureField::DiabetesPedigreeFunction), Some(0.5));
        assert_eq!(result.get(FeatureField::BloodPressure), Some(70.0));
    }

    #[test]
    fn test_decimal_glucose() {
        let result = TextAdapter::new().extract("glucose = 120.5");
        assert_eq!(result.get(FeatureField::Glucose), Some(120.5));
    }

    #[test]
    fn test_integer_fields_take_integer_part() {
        let result = TextAdapter::new().extract("Age: 45.5 Pregnancies 3.0");
        assert_eq!(result.get(FeatureField::Age), Some(45.0));
        assert_eq!(result.get(FeatureField::Pregnancies), Some(3.0));
    }

    #[test]
    fn test_non_ascii_digits_count_as_missing() {
        let result = TextAdapter::new().extract("Glucose: ١٢٠ BMI: 30");
        assert_eq!(result.get(FeatureField::Glucose), None);
        assert!(result.missing_fields().contains(&FeatureField::Glucose));
        assert_eq!(result.get(FeatureField::Bmi), Some(30.0));

        // not a match, so a later ASCII mention is still found
        let result = TextAdapter::new().extract("Glucose: ١٢٠, repeat glucose: 99");
        assert_eq!(result.get(FeatureField::Glucose), Some(99.0));
    }

    #[test]
    fn test_first_match_wins() {
        let result = TextAdapter::new().extract("Glucose: 90\nRepeat glucose: 140");
        assert_eq!(result.get(FeatureField::Glucose), Some(90.0));
    }

    #[test]
    fn test_unanchored_match_is_a_known_false_positive() {
        let result = TextAdapter::new().extract("See page 3 for details");
        assert_eq!(result.get(FeatureField::Age), Some(3.0));
    }

    #[test]
    fn test_synonyms_and_separators() {
        let text = "preg-1 glu 99 bloodpressure:72 skinthickness=30 ins 0 \
                    body mass index - 31.2 pedigree 0.627 age 50";
        let result = TextAdapter::new().extract(text);
        assert!(result.is_complete());
        assert_eq!(result.get(FeatureField::Pregnancies), Some(1.0));
        assert_eq!(result.get(FeatureField::Insulin), Some(0.0));
        assert_eq!(result.get(FeatureField::Bmi), Some(31.2));
        assert_eq!(result.get(FeatureField::DiabetesPedigreeFunction), Some(0.627));
    }

    #[test]
    fn test_empty_text_reports_every_field() {
        let result = TextAdapter::new().extract("");
        assert!(result.is_empty());
        assert_eq!(result.missing_fields(), FeatureField::ALL.to_vec());
    }

    #[test]
    fn test_case_insensitive_keys() {
        let adapter = TextAdapter::new();
        assert_eq!(adapter.extract("GLUCOSE=99"), adapter.extract("glucose=99"));
        assert_eq!(adapter.extract("GLUCOSE=99").get(FeatureField::Glucose), Some(99.0));
    }

    proptest! {
        #[test]
        fn prop_extraction_is_idempotent(text in "\\PC{0,200}") {
            let adapter = TextAdapter::new();
            prop_assert_eq!(adapter.extract(&text), adapter.extract(&text));
        }

        #[test]
        fn prop_ascii_case_does_not_change_result(text in "[a-zA-Z0-9 :=.,-]{0,120}") {
            let adapter = TextAdapter::new();
            prop_assert_eq!(
                adapter.extract(&text.to_uppercase()),
                adapter.extract(&text.to_lowercase())
            );
        }

        #[test]
        fn prop_real_values_round_trip(whole in 0u32..1000, frac in 0u32..100) {
            let text = format!("BMI: {whole}.{frac:02}");
            let expected: f64 = format!("{whole}.{frac:02}").parse().unwrap();
            prop_assert_eq!(TextAdapter::new().extract(&text).get(FeatureField::Bmi), Some(expected));
        }
    }
}
