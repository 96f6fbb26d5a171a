//! Pre-trained artifacts used by the model-based strategy.
//!
//! The training happens elsewhere. This module only knows how to apply a
//! trained classifier (and optionally a scaler) to a feature vector.

use log::debug;

use crate::config::*;

/// A trained binary classifier.
///
/// A label of `1` means that the first country wins.
pub trait Classifier {
    fn predict(&self, features: &FeatureVector) -> u32;
}

/// A fixed transform applied to the features before classification.
pub trait Scaler {
    fn transform(&self, features: &FeatureVector) -> FeatureVector;
}

/// A linear decision function, as produced by a logistic regression or a linear SVM.
///
/// Predicts `1` when `coefficients . x + intercept > 0`.
#[derive(PartialEq, Debug, Clone)]
pub struct LinearClassifier {
    coefficients: FeatureVector,
    intercept: f64,
}

impl LinearClassifier {
    pub fn new(coefficients: &[f64], intercept: f64) -> Result<LinearClassifier, BattleErrors> {
        let coefficients = to_feature_vector("coefficients", coefficients)?;
        if !intercept.is_finite() {
            return Err(BattleErrors::InvalidModel(format!(
                "intercept is not finite: {}",
                intercept
            )));
        }
        Ok(LinearClassifier {
            coefficients,
            intercept,
        })
    }

    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        self.coefficients
            .iter()
            .zip(features.iter())
            .map(|(c, x)| c * x)
            .sum::<f64>()
            + self.intercept
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, features: &FeatureVector) -> u32 {
        if self.decision_function(features) > 0.0 {
            1
        } else {
            0
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum TreeNode {
    /// Goes to `left` when `features[feature] <= threshold`, to `right` otherwise.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        label: u32,
    },
}

/// A binary decision tree stored as a flat list of nodes, the root being the first one.
#[derive(PartialEq, Debug, Clone)]
pub struct DecisionTree {
    // Invariant: non-empty, children always have a greater index than their parent.
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn new(nodes: Vec<TreeNode>) -> Result<DecisionTree, BattleErrors> {
        if nodes.is_empty() {
            return Err(BattleErrors::InvalidModel("empty decision tree".to_string()));
        }
        for (idx, node) in nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= NUM_FEATURES {
                    return Err(BattleErrors::InvalidModel(format!(
                        "node {}: feature index {} out of range",
                        idx, feature
                    )));
                }
                if threshold.is_nan() {
                    return Err(BattleErrors::InvalidModel(format!(
                        "node {}: threshold is not a number",
                        idx
                    )));
                }
                for child in [*left, *right] {
                    // Children pointing backwards could create a cycle.
                    if child <= idx || child >= nodes.len() {
                        return Err(BattleErrors::InvalidModel(format!(
                            "node {}: invalid child index {}",
                            idx, child
                        )));
                    }
                }
            }
        }
        Ok(DecisionTree { nodes })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}

impl Classifier for DecisionTree {
    fn predict(&self, features: &FeatureVector) -> u32 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { label } => {
                    debug!("DecisionTree: leaf {} -> {}", idx, label);
                    return *label;
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Centers and scales each feature with the statistics of the training set.
#[derive(PartialEq, Debug, Clone)]
pub struct StandardScaler {
    mean: FeatureVector,
    scale: FeatureVector,
}

impl StandardScaler {
    pub fn new(mean: &[f64], scale: &[f64]) -> Result<StandardScaler, BattleErrors> {
        let mean = to_feature_vector("mean", mean)?;
        let mut scale = to_feature_vector("scale", scale)?;
        // Constant features in the training set have a zero scale: they are only centered.
        for x in scale.iter_mut() {
            if *x == 0.0 {
                *x = 1.0;
            }
        }
        Ok(StandardScaler { mean, scale })
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut res = *features;
        for (i, x) in res.iter_mut().enumerate() {
            *x = (*x - self.mean[i]) / self.scale[i];
        }
        res
    }
}

fn to_feature_vector(name: &str, xs: &[f64]) -> Result<FeatureVector, BattleErrors> {
    if xs.iter().any(|x| !x.is_finite()) {
        return Err(BattleErrors::InvalidModel(format!(
            "{} contains values that are not finite",
            name
        )));
    }
    xs.try_into().map_err(|_| {
        BattleErrors::InvalidModel(format!(
            "{} has {} values, expected {}",
            name,
            xs.len(),
            NUM_FEATURES
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_classifier() {
        let clf = LinearClassifier::new(&[1.0, 0.0, 0.0, 0.0, 0.0], -0.5).unwrap();
        assert_eq!(clf.predict(&[1.0, 0.0, 0.0, 0.0, 0.0]), 1);
        assert_eq!(clf.predict(&[0.5, 9.0, 9.0, 9.0, 9.0]), 0);
        assert_eq!(clf.predict(&[-3.0, 0.0, 0.0, 0.0, 0.0]), 0);
    }

    #[test]
    fn linear_classifier_wrong_shape() {
        assert!(matches!(
            LinearClassifier::new(&[1.0, 2.0], 0.0),
            Err(BattleErrors::InvalidModel(_))
        ));
        assert!(matches!(
            LinearClassifier::new(&[1.0; 5], f64::NAN),
            Err(BattleErrors::InvalidModel(_))
        ));
    }

    fn small_tree() -> DecisionTree {
        // gdp difference <= 0 ? (literacy difference <= 5 ? B : A) : A
        DecisionTree::new(vec![
            TreeNode::Split {
                feature: 0,
                threshold: 0.0,
                left: 1,
                right: 4,
            },
            TreeNode::Split {
                feature: 2,
                threshold: 5.0,
                left: 2,
                right: 3,
            },
            TreeNode::Leaf { label: 0 },
            TreeNode::Leaf { label: 1 },
            TreeNode::Leaf { label: 1 },
        ])
        .unwrap()
    }

    #[test]
    fn decision_tree_walk() {
        let tree = small_tree();
        assert_eq!(tree.num_nodes(), 5);
        assert_eq!(tree.predict(&[10.0, 0.0, 0.0, 0.0, 0.0]), 1);
        assert_eq!(tree.predict(&[-10.0, 0.0, 0.0, 0.0, 0.0]), 0);
        assert_eq!(tree.predict(&[-10.0, 0.0, 20.0, 0.0, 0.0]), 1);
        // Thresholds are inclusive on the left.
        assert_eq!(tree.predict(&[0.0, 0.0, 5.0, 0.0, 0.0]), 0);
    }

    #[test]
    fn decision_tree_is_deterministic() {
        let tree = small_tree();
        let x = [-1.5, 2.0, 7.25, -3.0, 0.5];
        let first = tree.predict(&x);
        for _ in 0..10 {
            assert_eq!(tree.predict(&x), first);
        }
    }

    #[test]
    fn decision_tree_validation() {
        assert!(DecisionTree::new(vec![]).is_err());
        let self_loop = vec![TreeNode::Split {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
        }];
        assert!(DecisionTree::new(self_loop).is_err());
        let bad_feature = vec![
            TreeNode::Split {
                feature: 7,
                threshold: 0.0,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf { label: 0 },
            TreeNode::Leaf { label: 1 },
        ];
        assert!(DecisionTree::new(bad_feature).is_err());
        let dangling = vec![
            TreeNode::Split {
                feature: 1,
                threshold: 0.0,
                left: 1,
                right: 9,
            },
            TreeNode::Leaf { label: 0 },
        ];
        assert!(DecisionTree::new(dangling).is_err());
    }

    #[test]
    fn standard_scaler() {
        let scaler =
            StandardScaler::new(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 1.0, 0.5, 0.0, 1.0]).unwrap();
        assert_eq!(
            scaler.transform(&[3.0, 2.0, 4.0, 10.0, 5.0]),
            [1.0, 0.0, 2.0, 6.0, 0.0]
        );
        assert!(StandardScaler::new(&[0.0; 4], &[1.0; 5]).is_err());
    }
}
