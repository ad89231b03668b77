use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

pub const MODEL_FILE: &str = "flood_model.json";
pub const SCALER_FILE: &str = "scaler.json";

/// Failures while running an already-loaded scaler/classifier pair.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    #[error("feature length mismatch: got {got}, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("classifier produced a non-finite score")]
    NonFinite,
    #[error("tree walk did not reach a leaf (stopped at node {0})")]
    MissingNode(usize),
}

// ---------- Scaler ----------

/// Fitted standardisation: `(x - mean) / scale`, column-wise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    /// Input dimensionality the scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn validate(&self) -> Result<()> {
        if self.mean.is_empty() {
            bail!("scaler has no fitted columns");
        }
        if self.mean.len() != self.scale.len() {
            bail!(
                "scaler mean/scale length differ: {} vs {}",
                self.mean.len(),
                self.scale.len()
            );
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            bail!("scaler contains non-finite parameters");
        }
        Ok(())
    }

    pub fn transform(&self, x: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if x.len() != self.n_features() {
            return Err(InferenceError::DimensionMismatch {
                expected: self.n_features(),
                got: x.len(),
            });
        }
        Ok(x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| {
                // zero-variance columns are centred only
                let s = if *s == 0.0 { 1.0 } else { *s };
                (v - m) / s
            })
            .collect())
    }
}

// ---------- Classifier ----------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Leaf {
        leaf: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default = "default_true")]
        default_left: bool,
    },
}

fn default_true() -> bool {
    true
}

fn default_base_score() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn validate(&self, idx: usize, width: usize) -> Result<()> {
        if self.nodes.is_empty() {
            bail!("tree {} has no nodes", idx);
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split { feature, left, right, threshold, .. } = node {
                if *feature >= width {
                    bail!(
                        "tree {} node {} splits on feature {} but only {} are scaled",
                        idx, i, feature, width
                    );
                }
                // children must come after their parent, which also rules out cycles
                for child in [*left, *right] {
                    if child <= i || child >= self.nodes.len() {
                        bail!("tree {} node {} has invalid child index {}", idx, i, child);
                    }
                }
                if threshold.is_nan() {
                    bail!("tree {} node {} has a NaN threshold", idx, i);
                }
            }
        }
        Ok(())
    }

    fn leaf_value(&self, x: &[f64]) -> Result<f64, InferenceError> {
        let mut i = 0;
        // a root-to-leaf path visits each node at most once
        for _ in 0..self.nodes.len() {
            match self.nodes.get(i).ok_or(InferenceError::MissingNode(i))? {
                Node::Leaf { leaf } => return Ok(*leaf),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let v = *x.get(*feature).ok_or(InferenceError::DimensionMismatch {
                        expected: feature.saturating_add(1),
                        got: x.len(),
                    })?;
                    let go_left = if v.is_nan() { *default_left } else { v < *threshold };
                    i = if go_left { *left } else { *right };
                }
            }
        }
        Err(InferenceError::MissingNode(i))
    }
}

/// Gradient-boosted trees with a logistic link (`binary:logistic`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    Logistic(LogisticModel),
    TreeEnsemble(TreeEnsemble),
}

impl Classifier {
    pub fn kind(&self) -> &'static str {
        match self {
            Classifier::Logistic(_) => "logistic",
            Classifier::TreeEnsemble(_) => "tree_ensemble",
        }
    }

    /// Smallest input width the classifier can read.
    pub fn required_features(&self) -> usize {
        match self {
            Classifier::Logistic(m) => m.coef.len(),
            Classifier::TreeEnsemble(e) => e
                .trees
                .iter()
                .flat_map(|t| &t.nodes)
                .filter_map(|n| match n {
                    Node::Split { feature, .. } => Some(feature.saturating_add(1)),
                    Node::Leaf { .. } => None,
                })
                .max()
                .unwrap_or(0),
        }
    }

    fn validate(&self, width: usize) -> Result<()> {
        match self {
            Classifier::Logistic(m) => {
                if m.coef.is_empty() {
                    bail!("logistic model has no coefficients");
                }
                if !m.intercept.is_finite() || m.coef.iter().any(|c| !c.is_finite()) {
                    bail!("logistic model contains non-finite parameters");
                }
            }
            Classifier::TreeEnsemble(e) => {
                if !(e.base_score > 0.0 && e.base_score < 1.0) {
                    bail!("base_score must lie in (0, 1), got {}", e.base_score);
                }
                for (idx, tree) in e.trees.iter().enumerate() {
                    tree.validate(idx, width)?;
                }
            }
        }
        Ok(())
    }

    /// Raw margin; positive means the flood class.
    pub fn decision(&self, x: &[f64]) -> Result<f64, InferenceError> {
        let margin = match self {
            Classifier::Logistic(m) => {
                if x.len() != m.coef.len() {
                    return Err(InferenceError::DimensionMismatch {
                        expected: m.coef.len(),
                        got: x.len(),
                    });
                }
                m.coef.iter().zip(x).map(|(c, v)| c * v).sum::<f64>() + m.intercept
            }
            Classifier::TreeEnsemble(e) => {
                let need = self.required_features();
                if x.len() < need {
                    return Err(InferenceError::DimensionMismatch {
                        expected: need,
                        got: x.len(),
                    });
                }
                let base = (e.base_score / (1.0 - e.base_score)).ln();
                let mut total = base;
                for t in &e.trees {
                    total += t.leaf_value(x)?;
                }
                total
            }
        };
        if !margin.is_finite() {
            return Err(InferenceError::NonFinite);
        }
        Ok(margin)
    }

    /// Probability of the flood class.
    pub fn predict_proba(&self, x: &[f64]) -> Result<f64, InferenceError> {
        let margin = self.decision(x)?;
        Ok(1.0 / (1.0 + (-margin).exp()))
    }

    pub fn predict(&self, x: &[f64]) -> Result<u8, InferenceError> {
        // sigmoid(m) > 0.5 <=> m > 0
        Ok(u8::from(self.decision(x)? > 0.0))
    }
}

// ---------- Loaded pair ----------

#[derive(Debug)]
pub struct Artifacts {
    pub scaler: Scaler,
    pub classifier: Classifier,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path, what: &str) -> Result<T> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read {} at {}", what, path.display()))?;
    serde_json::from_str(&txt).with_context(|| format!("failed to parse {} at {}", what, path.display()))
}

impl Artifacts {
    pub fn new(scaler: Scaler, classifier: Classifier) -> Result<Self> {
        scaler.validate()?;
        classifier.validate(scaler.n_features())?;
        let need = classifier.required_features();
        let fits = match &classifier {
            Classifier::Logistic(_) => need == scaler.n_features(),
            Classifier::TreeEnsemble(_) => need <= scaler.n_features(),
        };
        if !fits {
            bail!(
                "classifier reads {} features but scaler produces {}",
                need,
                scaler.n_features()
            );
        }
        let art = Self { scaler, classifier };

        // Probe with a zero row so a broken pair fails here, not per request
        art.predict(&vec![0.0; art.n_features()])
            .context("warmup prediction failed")?;
        Ok(art)
    }

    pub fn load(model_path: &Path, scaler_path: &Path) -> Result<Self> {
        let classifier: Classifier = read_json(model_path, "model")?;
        let scaler: Scaler = read_json(scaler_path, "scaler")?;
        Self::new(scaler, classifier)
    }

    /// Load `flood_model.json` and `scaler.json` from `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        Self::load(&dir.join(MODEL_FILE), &dir.join(SCALER_FILE))
    }

    pub fn n_features(&self) -> usize {
        self.scaler.n_features()
    }

    pub fn predict(&self, features: &[f64]) -> Result<u8, InferenceError> {
        let scaled = self.scaler.transform(features)?;
        self.classifier.predict(&scaled)
    }

    /// Flood-class probability for an unscaled row.
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64, InferenceError> {
        let scaled = self.scaler.transform(features)?;
        self.classifier.predict_proba(&scaled)
    }
}
