// Reading the classifier and scaler artifacts.

use std::fs;

use country_battle::model::{
    Classifier, DecisionTree, LinearClassifier, Scaler, StandardScaler, TreeNode,
};

use crate::clash::*;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ClassifierArtifact {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    Tree {
        nodes: Vec<TreeNodeArtifact>,
    },
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNodeArtifact {
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

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// An artifact ready to be used, with the SHA-256 digest of the file it was read from.
pub struct Loaded<T> {
    pub value: T,
    pub digest: String,
}

fn read_artifact_file(path: &str) -> ClashResult<(String, String)> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let digest = sha256::digest(contents.as_str());
    info!("Read artifact {} (sha256 {})", path, digest);
    Ok((contents, digest))
}

impl ClassifierArtifact {
    pub fn build(self) -> ClashResult<Box<dyn Classifier>> {
        let clf: Box<dyn Classifier> = match self {
            ClassifierArtifact::Linear {
                coefficients,
                intercept,
            } => Box::new(LinearClassifier::new(&coefficients, intercept).context(BattleSnafu {})?),
            ClassifierArtifact::Tree { nodes } => {
                let nodes: Vec<TreeNode> = nodes
                    .into_iter()
                    .map(|n| match n {
                        TreeNodeArtifact::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        } => TreeNode::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        },
                        TreeNodeArtifact::Leaf { label } => TreeNode::Leaf { label },
                    })
                    .collect();
                Box::new(DecisionTree::new(nodes).context(BattleSnafu {})?)
            }
        };
        Ok(clf)
    }
}

impl ScalerArtifact {
    pub fn build(self) -> ClashResult<Box<dyn Scaler>> {
        let scaler = StandardScaler::new(&self.mean, &self.scale).context(BattleSnafu {})?;
        Ok(Box::new(scaler))
    }
}

pub fn read_classifier(path: &str) -> ClashResult<Loaded<Box<dyn Classifier>>> {
    let (contents, digest) = read_artifact_file(path)?;
    let artifact: ClassifierArtifact =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!("read_classifier: {:?}", artifact);
    Ok(Loaded {
        value: artifact.build()?,
        digest,
    })
}

pub fn read_scaler(path: &str) -> ClashResult<Loaded<Box<dyn Scaler>>> {
    let (contents, digest) = read_artifact_file(path)?;
    let artifact: ScalerArtifact =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!("read_scaler: {:?}", artifact);
    Ok(Loaded {
        value: artifact.build()?,
        digest,
    })
}
