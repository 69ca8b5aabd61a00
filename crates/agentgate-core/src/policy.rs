//! Threshold policy loading and validation.
//!
//! The policy file is version-controlled JSON mapping evaluator names to
//! their tier:
//!
//! ```json
//! {
//!   "safety_evaluators": ["violence"],
//!   "pass_rate_thresholds": { "coherence": 0.85, "task_adherence": 0.85 }
//! }
//! ```
//!
//! Structural problems (out-of-range thresholds, a name listed in both
//! tiers, an empty policy) are load-time errors, never runtime surprises.
//! Because the policy file gates the same proposals that can edit it, it is
//! treated as untrusted input: [`ThresholdPolicy::verify_integrity`] offers
//! a pre-flight digest check against a known-good value.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use agentgate_cloud::EvaluatorCriterion;

use crate::domain::error::{GateError, Result};
use crate::domain::evaluator::{EvaluatorSpec, EvaluatorTier};

/// On-disk shape of the thresholds file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ThresholdsFile {
    #[serde(default)]
    safety_evaluators: Vec<String>,

    #[serde(default)]
    pass_rate_thresholds: BTreeMap<String, f32>,
}

/// Validated, name-ordered mapping from evaluator to threshold spec.
///
/// Immutable once loaded; one instance per gate run, passed explicitly into
/// [`crate::gate::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdPolicy {
    specs: BTreeMap<String, EvaluatorSpec>,
}

impl ThresholdPolicy {
    /// Build a policy from already-assembled specs, validating each entry.
    pub fn from_specs(specs: BTreeMap<String, EvaluatorSpec>) -> Result<Self> {
        if specs.is_empty() {
            return Err(GateError::ConfigValidation(
                "threshold policy configures no evaluators".to_string(),
            ));
        }
        for (name, spec) in &specs {
            if name.trim().is_empty() {
                return Err(GateError::ConfigValidation(
                    "evaluator name must not be empty".to_string(),
                ));
            }
            if let EvaluatorSpec::Quality { min_pass_rate } = spec {
                if !min_pass_rate.is_finite() || !(0.0..=1.0).contains(min_pass_rate) {
                    return Err(GateError::ConfigValidation(format!(
                        "evaluator '{}' has threshold {} outside [0.0, 1.0]",
                        name, min_pass_rate
                    )));
                }
            }
        }
        Ok(Self { specs })
    }

    /// Parse and validate the thresholds file content.
    pub fn from_json(content: &str) -> Result<Self> {
        let file: ThresholdsFile = serde_json::from_str(content)?;

        let mut specs = BTreeMap::new();
        for name in &file.safety_evaluators {
            if file.pass_rate_thresholds.contains_key(name) {
                return Err(GateError::ConfigValidation(format!(
                    "evaluator '{}' is listed as both safety and quality",
                    name
                )));
            }
            specs.insert(name.clone(), EvaluatorSpec::Safety);
        }
        for (name, min_pass_rate) in &file.pass_rate_thresholds {
            specs.insert(
                name.clone(),
                EvaluatorSpec::Quality {
                    min_pass_rate: *min_pass_rate,
                },
            );
        }
        Self::from_specs(specs)
    }

    /// Load and validate a thresholds file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| match e {
            GateError::ConfigValidation(msg) => {
                GateError::ConfigValidation(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Compare the file's SHA-256 digest against a known-good value.
    ///
    /// Run this before [`ThresholdPolicy::load`] when the thresholds file
    /// may have been edited by the same change it gates.
    pub fn verify_integrity(path: &Path, expected_sha256: &str) -> Result<()> {
        let bytes = std::fs::read(path)?;
        let actual = hex::encode(Sha256::digest(&bytes));
        let expected = expected_sha256.trim().to_ascii_lowercase();
        if actual != expected {
            return Err(GateError::ConfigValidation(format!(
                "{}: integrity check failed: expected sha256 {}, got {}",
                path.display(),
                expected,
                actual
            )));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&EvaluatorSpec> {
        self.specs.get(name)
    }

    /// Entries in evaluator-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &EvaluatorSpec)> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Server-side criteria for every configured evaluator.
    ///
    /// Quality evaluators are scored by the judge model deployment; safety
    /// evaluators use the service's builtin classifiers.
    pub fn criteria(&self) -> Vec<EvaluatorCriterion> {
        self.specs
            .iter()
            .map(|(name, spec)| EvaluatorCriterion {
                name: name.clone(),
                evaluator: format!("builtin.{}", name),
                uses_judge: spec.tier() == EvaluatorTier::Quality,
            })
            .collect()
    }
}
