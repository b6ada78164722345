//! Random forest of axis-aligned decision trees.
//!
//! Trees use the usual flat node layout: a sample goes to `left` when
//! `x[feature] <= threshold`, otherwise to `right`. Leaves carry per-class
//! weights, normalized at load; the forest averages the leaf distributions.

use serde::Deserialize;

use irisserve_core::FEATURE_COUNT;

use crate::classifier::Classifier;
use crate::result::InferenceError;
use crate::species::CLASS_COUNT;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeSpec {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeSpec {
    pub nodes: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RandomForestSpec {
    pub trees: Vec<TreeSpec>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf([f64; CLASS_COUNT]),
}

#[derive(Debug, Clone, PartialEq)]
struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn leaf(&self, x: &[f64; FEATURE_COUNT]) -> Result<&[f64; CLASS_COUNT], InferenceError> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf(dist)) => return Ok(dist),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).ok_or_else(|| {
                        InferenceError::MalformedModel(format!("split on unknown feature {feature}"))
                    })?;
                    idx = if *v <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(InferenceError::MalformedModel(format!("dangling node index {idx}")));
                }
            }
        }
    }
}

impl DecisionTree {
    fn build(tree_no: usize, spec: TreeSpec) -> Result<Self, String> {
        if spec.nodes.is_empty() {
            return Err(format!("tree {tree_no} has no nodes"));
        }

        let len = spec.nodes.len();
        let nodes = spec
            .nodes
            .into_iter()
            .enumerate()
            .map(|(i, node)| match node {
                NodeSpec::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= FEATURE_COUNT {
                        return Err(format!("tree {tree_no} node {i}: feature {feature} out of range"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("tree {tree_no} node {i}: threshold is not finite"));
                    }
                    // Children must point forward; this rules out cycles.
                    for child in [left, right] {
                        if child <= i || child >= len {
                            return Err(format!("tree {tree_no} node {i}: invalid child index {child}"));
                        }
                    }
                    Ok(Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    })
                }
                NodeSpec::Leaf { value } => {
                    let value: [f64; CLASS_COUNT] = value.try_into().map_err(|v: Vec<f64>| {
                        format!("tree {tree_no} node {i}: leaf has {} classes, expected {CLASS_COUNT}", v.len())
                    })?;
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(format!("tree {tree_no} node {i}: leaf weights must be finite and non-negative"));
                    }
                    let total: f64 = value.iter().sum();
                    if total <= 0.0 {
                        return Err(format!("tree {tree_no} node {i}: leaf weights sum to zero"));
                    }
                    Ok(Node::Leaf(value.map(|w| w / total)))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { nodes })
    }
}

/// Averaging ensemble of decision trees.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl TryFrom<RandomForestSpec> for RandomForest {
    type Error = String;

    fn try_from(spec: RandomForestSpec) -> Result<Self, Self::Error> {
        if spec.trees.is_empty() {
            return Err("random forest has no trees".to_string());
        }

        let trees = spec
            .trees
            .into_iter()
            .enumerate()
            .map(|(tree_no, spec)| DecisionTree::build(tree_no, spec))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { trees })
    }
}

impl Classifier for RandomForest {
    fn kind(&self) -> &'static str {
        "random_forest"
    }

    fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> Result<[f64; CLASS_COUNT], InferenceError> {
        let mut acc = [0.0; CLASS_COUNT];
        for tree in &self.trees {
            let leaf = tree.leaf(x)?;
            for (a, p) in acc.iter_mut().zip(leaf) {
                *a += p;
            }
        }

        let n = self.trees.len() as f64;
        Ok(acc.map(|a| a / n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn forest(value: serde_json::Value) -> Result<RandomForest, String> {
        let spec: RandomForestSpec = serde_json::from_value(value).unwrap();
        RandomForest::try_from(spec)
    }

    fn stump() -> serde_json::Value {
        json!({ "trees": [{ "nodes": [
            { "type": "split", "feature": 2, "threshold": 0.0, "left": 1, "right": 2 },
            { "type": "leaf", "value": [3, 1, 0] },
            { "type": "leaf", "value": [0, 0, 5] }
        ]}]})
    }

    #[test]
    fn threshold_is_inclusive_on_the_left() {
        let f = forest(stump()).unwrap();

        assert_eq!(f.predict_proba(&[0.0, 0.0, 0.0, 0.0]).unwrap(), [0.75, 0.25, 0.0]);
        assert_eq!(f.predict_proba(&[0.0, 0.0, 0.1, 0.0]).unwrap(), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn averages_across_trees() {
        let f = forest(json!({ "trees": [
            { "nodes": [{ "type": "leaf", "value": [1, 0, 0] }] },
            { "nodes": [{ "type": "leaf", "value": [0, 1, 1] }] }
        ]}))
        .unwrap();

        assert_eq!(f.n_trees(), 2);
        assert_eq!(f.predict_proba(&[0.0; 4]).unwrap(), [0.5, 0.25, 0.25]);
    }

    #[test]
    fn backward_child_pointers_are_rejected() {
        let err = forest(json!({ "trees": [{ "nodes": [
            { "type": "leaf", "value": [1, 0, 0] },
            { "type": "split", "feature": 0, "threshold": 0.0, "left": 0, "right": 1 }
        ]}]}))
        .unwrap_err();

        assert!(err.contains("invalid child index"), "{err}");
    }

    #[test]
    fn out_of_range_feature_is_rejected() {
        let err = forest(json!({ "trees": [{ "nodes": [
            { "type": "split", "feature": 4, "threshold": 0.0, "left": 1, "right": 2 },
            { "type": "leaf", "value": [1, 0, 0] },
            { "type": "leaf", "value": [1, 0, 0] }
        ]}]}))
        .unwrap_err();

        assert!(err.contains("feature 4"), "{err}");
    }

    #[test]
    fn leaf_arity_and_weights_are_checked() {
        assert!(forest(json!({ "trees": [{ "nodes": [{ "type": "leaf", "value": [1, 0] }] }] })).is_err());
        assert!(forest(json!({ "trees": [{ "nodes": [{ "type": "leaf", "value": [0, 0, 0] }] }] })).is_err());
        assert!(forest(json!({ "trees": [{ "nodes": [{ "type": "leaf", "value": [1, -1, 1] }] }] })).is_err());
    }

    #[test]
    fn empty_forest_is_rejected() {
        assert!(forest(json!({ "trees": [] })).is_err());
        assert!(forest(json!({ "trees": [{ "nodes": [] }] })).is_err());
    }
}
