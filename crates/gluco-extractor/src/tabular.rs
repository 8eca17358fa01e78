//! Feature extraction from tabular datasets
//!
//! Datasets name their columns with the external capitalization
//! (`BloodPressure`, `BMI`, ...). [`FeatureField::column_name`] is the
//! mapping table between those names and the internal schema.
//!
//! Empty cells are filled with zero instead of rejecting the row, matching
//! how the classifier's training data encodes unmeasured vitals.

use gluco_core::{ExtractionResult, FeatureField, StructuralError};
use gluco_parser::Table;

/// Maps a column-oriented dataset onto the feature schema
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularAdapter;

impl TabularAdapter {
    pub fn new() -> Self {
        Self
    }

    /// One result per data row, in row order
    ///
    /// Fails when any required column is absent; the error names every
    /// missing column. Cells that hold something other than a valid
    /// non-negative number leave that field unresolved for the row.
    pub fn extract(&self, table: &Table) -> Result<Vec<ExtractionResult>, StructuralError> {
        let columns = self.resolve_columns(table)?;

        let results: Vec<ExtractionResult> = (0..table.num_rows())
            .map(|row| {
                let mut builder = ExtractionResult::builder();
                for (field, column) in FeatureField::ALL.into_iter().zip(columns) {
                    match table.cell(row, column) {
                        None => {
                            builder.resolve(field, 0.0);
                        }
                        Some(text) => {
                            if let Ok(value) = text.parse::<f64>() {
                                builder.resolve(field, value);
                            }
                        }
                    }
                }
                builder.build()
            })
            .collect();

        let incomplete = results.iter().filter(|r| !r.is_complete()).count();
        tracing::debug!(rows = results.len(), incomplete, "Tabular extraction finished");

        Ok(results)
    }

    /// Column index of every schema field, in schema order
    fn resolve_columns(
        &self,
        table: &Table,
    ) -> Result<[usize; FeatureField::COUNT], StructuralError> {
        let mut columns = [0usize; FeatureField::COUNT];
        let mut missing = Vec::new();

        for field in FeatureField::ALL {
            match table.column_index(field.column_name()) {
                Some(index) => columns[field.index()] = index,
                None => missing.push(field.column_name().to_string()),
            }
        }

        if missing.is_empty() {
            Ok(columns)
        } else {
            tracing::warn!(?missing, "Dataset is missing required columns");
            Err(StructuralError::MissingColumns { missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gluco_parser::CsvParser;
    use proptest::prelude::*;

    const HEADER: &str =
        "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age";

    fn table(csv: &str) -> Table {
        CsvParser::new().read_table(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_one_row_per_input_row_in_schema_order() {
        let data = format!("{HEADER}\n6,148,72,35,0,33.6,0.627,50\n1,85,66,29,0,26.6,0.351,31\n");
        let results = TabularAdapter::new().extract(&table(&data)).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].to_feature_vector().unwrap().as_array(),
            &[6.0, 148.0, 72.0, 35.0, 0.0, 33.6, 0.627, 50.0]
        );
        assert_eq!(
            results[1].to_feature_vector().unwrap().as_array(),
            &[1.0, 85.0, 66.0, 29.0, 0.0, 26.6, 0.351, 31.0]
        );
    }

    #[test]
    fn test_column_order_and_extra_columns_are_irrelevant() {
        let data = "Outcome,Age,BMI,Insulin,Glucose,Pregnancies,SkinThickness,BloodPressure,\
                    DiabetesPedigreeFunction\n1,50,33.6,0,148,6,35,72,0.627\n";
        let results = TabularAdapter::new().extract(&table(data)).unwrap();

        assert_eq!(
            results[0].to_feature_vector().unwrap().as_array(),
            &[6.0, 148.0, 72.0, 35.0, 0.0, 33.6, 0.627, 50.0]
        );
    }

    #[test]
    fn test_empty_cells_are_filled_with_zero() {
        let data = format!("{HEADER}\n,148,,35,NA,33.6,,50\n");
        let results = TabularAdapter::new().extract(&table(&data)).unwrap();

        assert!(results[0].is_complete());
        assert_eq!(
            results[0].to_feature_vector().unwrap().as_array(),
            &[0.0, 148.0, 0.0, 35.0, 0.0, 33.6, 0.0, 50.0]
        );
    }

    #[test]
    fn test_short_rows_are_zero_filled() {
        let data = format!("{HEADER}\n2,120\n");
        let results = TabularAdapter::new().extract(&table(&data)).unwrap();
        assert_eq!(results[0].get(FeatureField::Glucose), Some(120.0));
        assert_eq!(results[0].get(FeatureField::Age), Some(0.0));
    }

    #[test]
    fn test_missing_columns_are_all_named() {
        let data = "Pregnancies,Glucose,SkinThickness,Insulin,DiabetesPedigreeFunction\n1,2,3,4,5\n";
        let err = TabularAdapter::new().extract(&table(data)).unwrap_err();

        assert_eq!(
            err,
            StructuralError::MissingColumns {
                missing: vec![
                    "BloodPressure".to_string(),
                    "BMI".to_string(),
                    "Age".to_string()
                ]
            }
        );
    }

    #[test]
    fn test_column_names_are_case_sensitive() {
        let data = "pregnancies,glucose,bloodpressure,skinthickness,insulin,bmi,\
                    diabetespedigreefunction,age\n1,2,3,4,5,6,7,8\n";
        let err = TabularAdapter::new().extract(&table(data)).unwrap_err();
        let StructuralError::MissingColumns { missing } = err else {
            panic!("expected missing columns");
        };
        assert_eq!(missing.len(), 8);
    }

    #[test]
    fn test_empty_dataset_names_every_column() {
        let err = TabularAdapter::new().extract(&table("")).unwrap_err();
        assert!(err.to_string().starts_with("Missing required columns: Pregnancies, Glucose"));
    }

    #[test]
    fn test_header_only_yields_no_rows() {
        let results = TabularAdapter::new().extract(&table(HEADER)).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_malformed_cells_leave_fields_unresolved() {
        let data = format!("{HEADER}\n1,high,-70,35,0,33.6,0.6,50.5\n");
        let results = TabularAdapter::new().extract(&table(&data)).unwrap();

        assert_eq!(
            results[0].missing_fields(),
            vec![
                FeatureField::Glucose,
                FeatureField::BloodPressure,
                FeatureField::Age
            ]
        );
    }

    #[test]
    fn test_whole_number_floats_accepted_for_integer_fields() {
        let data = format!("{HEADER}\n2.0,120,70,20,80,25,0.5,31.0\n");
        let results = TabularAdapter::new().extract(&table(&data)).unwrap();
        assert_eq!(results[0].get(FeatureField::Pregnancies), Some(2.0));
        assert_eq!(results[0].get(FeatureField::Age), Some(31.0));
    }

    proptest! {
        #[test]
        fn prop_extraction_is_idempotent(
            rows in prop::collection::vec(prop::collection::vec("[0-9]{0,3}(\\.[0-9]{1,2})?", 8), 0..10)
        ) {
            let mut data = String::from(HEADER);
            for row in &rows {
                data.push('\n');
                data.push_str(&row.join(","));
            }
            let t = table(&data);
            let adapter = TabularAdapter::new();
            let first = adapter.extract(&t).unwrap();
            prop_assert_eq!(first.len(), rows.len());
            prop_assert_eq!(first, adapter.extract(&t).unwrap());
        }
    }
}
