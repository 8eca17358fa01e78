//! Tree ensemble classifier
//!
//! Models are trained offline and exported as JSON:
//!
//! ```json
//! {
//!   "name": "diabetes-forest",
//!   "feature_names": ["pregnancies", "glucose", ...],
//!   "trees": [
//!     { "nodes": [
//!         { "feature": 1, "threshold": 127.5, "left": 1, "right": 2 },
//!         { "value": 0.1 },
//!         { "value": 0.8 }
//!     ] }
//!   ]
//! }
//! ```
//!
//! A split sends a sample left when `x[feature] <= threshold`. Leaves hold the
//! probability of the positive class. Nodes are stored parent-before-child,
//! so every child index is greater than its parent's; this is checked on load
//! and guarantees traversal terminates.

use serde::{Deserialize, Serialize};

use gluco_core::{FeatureField, FeatureVector, Predictor};

use crate::ModelError;

/// Mean probability above which a sample is labelled positive
pub const DECISION_THRESHOLD: f64 = 0.5;

/// A tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single decision tree, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    fn validate(&self, tree: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Invalid(format!("tree {tree} has no nodes")));
        }

        let len = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= FeatureField::COUNT {
                        return Err(ModelError::Invalid(format!(
                            "tree {tree} node {i}: feature index {feature} out of range"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ModelError::Invalid(format!(
                            "tree {tree} node {i}: threshold is not finite"
                        )));
                    }
                    for child in [left, right] {
                        if child <= i || child >= len {
                            return Err(ModelError::Invalid(format!(
                                "tree {tree} node {i}: child index {child} out of range"
                            )));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !(0.0..=1.0).contains(&value) {
                        return Err(ModelError::Invalid(format!(
                            "tree {tree} node {i}: leaf probability {value} outside [0, 1]"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Leaf probability reached by a sample
    fn evaluate(&self, features: &[f64; FeatureField::COUNT]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[feature] <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Validated tree ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    #[serde(default = "default_name")]
    name: String,

    /// Optional feature order recorded at training time
    #[serde(default)]
    feature_names: Vec<String>,

    trees: Vec<Tree>,
}

fn default_name() -> String {
    "forest".to_string()
}

impl ForestModel {
    /// Build and validate a forest
    pub fn new(name: impl Into<String>, trees: Vec<Tree>) -> Result<Self, ModelError> {
        let model = Self {
            name: name.into(),
            feature_names: Vec::new(),
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    /// Parse and validate a JSON export
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::Invalid("model has no trees".to_string()));
        }

        if !self.feature_names.is_empty() {
            let matches_schema = self.feature_names.len() == FeatureField::COUNT
                && self
                    .feature_names
                    .iter()
                    .zip(FeatureField::ALL)
                    .all(|(name, field)| name == field.name() || name == field.column_name());
            if !matches_schema {
                return Err(ModelError::Invalid(format!(
                    "feature order {:?} does not match the schema",
                    self.feature_names
                )));
            }
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i)?;
        }
        Ok(())
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean positive-class probability across trees
    pub fn predict_proba(&self, features: &FeatureVector) -> f64 {
        let values = features.as_array();
        let total: f64 = self.trees.iter().map(|tree| tree.evaluate(values)).sum();
        total / self.trees.len() as f64
    }
}

impl Predictor for ForestModel {
    fn predict(&self, features: &FeatureVector) -> gluco_core::Result<u8> {
        let probability = self.predict_proba(features);
        tracing::trace!(model = %self.name, probability, "Scored sample");
        Ok(u8::from(probability > DECISION_THRESHOLD))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> Tree {
        Tree::new(vec![
            Node::Split {
                feature,
                threshold,
                left: 1,
                right: 2,
            },
            Node::Leaf { value: low },
            Node::Leaf { value: high },
        ])
    }

    fn sample(glucose: f64, bmi: f64) -> FeatureVector {
        FeatureVector::new([1.0, glucose, 70.0, 20.0, 80.0, bmi, 0.5, 30.0]).unwrap()
    }

    #[test]
    fn test_split_goes_left_on_equal() {
        let model = ForestModel::new("t", vec![stump(1, 120.0, 0.0, 1.0)]).unwrap();
        assert_eq!(model.predict(&sample(120.0, 25.0)).unwrap(), 0);
        assert_eq!(model.predict(&sample(120.5, 25.0)).unwrap(), 1);
    }

    #[test]
    fn test_probabilities_are_averaged() {
        let model = ForestModel::new(
            "t",
            vec![stump(1, 120.0, 0.0, 0.75), stump(5, 30.0, 0.25, 0.5)],
        )
        .unwrap();

        let p = model.predict_proba(&sample(150.0, 25.0));
        assert!((p - 0.5).abs() < 1e-12);
        // A mean of exactly 0.5 is not positive
        assert_eq!(model.predict(&sample(150.0, 25.0)).unwrap(), 0);
        assert_eq!(model.predict(&sample(150.0, 35.0)).unwrap(), 1);
        assert_eq!(model.predict(&sample(100.0, 35.0)).unwrap(), 0);
    }

    #[test]
    fn test_parse_json_export() {
        let json = r#"{
            "name": "tiny",
            "feature_names": ["Pregnancies", "Glucose", "BloodPressure", "SkinThickness",
                              "Insulin", "BMI", "DiabetesPedigreeFunction", "Age"],
            "trees": [{ "nodes": [
                { "feature": 1, "threshold": 127.5, "left": 1, "right": 2 },
                { "value": 0.1 },
                { "value": 0.8 }
            ] }]
        }"#;
        let model = ForestModel::from_json(json).unwrap();
        assert_eq!(model.name(), "tiny");
        assert_eq!(model.num_trees(), 1);
        assert_eq!(model.predict(&sample(140.0, 25.0)).unwrap(), 1);
    }

    #[test]
    fn test_rejects_empty_forest() {
        let err = ForestModel::from_json(r#"{"trees": []}"#).unwrap_err();
        assert!(err.to_string().contains("no trees"));
    }

    #[test]
    fn test_rejects_out_of_range_feature() {
        let err = ForestModel::new("t", vec![stump(8, 1.0, 0.0, 1.0)]).unwrap_err();
        assert!(err.to_string().contains("feature index 8"));
    }

    #[test]
    fn test_rejects_backward_child() {
        let tree = Tree::new(vec![
            Node::Split {
                feature: 0,
                threshold: 1.0,
                left: 0,
                right: 1,
            },
            Node::Leaf { value: 0.5 },
        ]);
        assert!(ForestModel::new("t", vec![tree]).is_err());
    }

    #[test]
    fn test_rejects_dangling_child_and_bad_leaf() {
        assert!(ForestModel::new("t", vec![Tree::new(vec![Node::Split {
            feature: 0,
            threshold: 1.0,
            left: 1,
            right: 5,
        }])])
        .is_err());
        assert!(ForestModel::new("t", vec![Tree::new(vec![Node::Leaf { value: 1.5 }])]).is_err());
        assert!(ForestModel::new("t", vec![Tree::new(vec![])]).is_err());
    }

    #[test]
    fn test_rejects_mismatched_feature_order() {
        let json = r#"{
            "feature_names": ["Glucose", "Pregnancies", "BloodPressure", "SkinThickness",
                              "Insulin", "BMI", "DiabetesPedigreeFunction", "Age"],
            "trees": [{ "nodes": [{ "value": 0.1 }] }]
        }"#;
        assert!(matches!(
            ForestModel::from_json(json),
            Err(ModelError::Invalid(_))
        ));
    }

    #[test]
    fn test_bundled_model_loads() {
        let model = ForestModel::from_json(include_str!("../../../models/model.json")).unwrap();
        let high = FeatureVector::new([6.0, 148.0, 72.0, 35.0, 0.0, 33.6, 0.627, 50.0]).unwrap();
        let low = FeatureVector::new([1.0, 85.0, 66.0, 29.0, 0.0, 26.6, 0.351, 31.0]).unwrap();
        assert_eq!(model.predict(&high).unwrap(), 1);
        assert_eq!(model.predict(&low).unwrap(), 0);
    }

    proptest! {
        #[test]
        fn prop_probability_stays_in_unit_interval(
            glucose in 0.0f64..300.0,
            bmi in 0.0f64..70.0,
            leaves in prop::collection::vec((0.0f64..=1.0, 0.0f64..=1.0), 1..6)
        ) {
            let trees = leaves
                .into_iter()
                .map(|(low, high)| stump(1, 120.0, low, high))
                .collect();
            let model = ForestModel::new("p", trees).unwrap();
            let p = model.predict_proba(&sample(glucose, bmi));
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}
