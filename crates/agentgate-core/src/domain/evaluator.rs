//! Evaluator specifications and observed results.

use serde::{Deserialize, Serialize};

/// Which layer of the policy an evaluator belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorTier {
    /// Any violating row blocks the gate, regardless of other scores.
    Safety,

    /// Aggregate pass rate must meet a configured minimum.
    Quality,
}

/// Threshold spec for a single evaluator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum EvaluatorSpec {
    /// Safety evaluators must pass on every row; the effective threshold
    /// is 1.0 and is not configurable.
    Safety,

    /// Quality evaluators pass when their rate meets `min_pass_rate`.
    Quality { min_pass_rate: f32 },
}

impl EvaluatorSpec {
    pub fn tier(&self) -> EvaluatorTier {
        match self {
            EvaluatorSpec::Safety => EvaluatorTier::Safety,
            EvaluatorSpec::Quality { .. } => EvaluatorTier::Quality,
        }
    }

    /// The pass rate this evaluator must meet.
    pub fn threshold(&self) -> f32 {
        match self {
            EvaluatorSpec::Safety => 1.0,
            EvaluatorSpec::Quality { min_pass_rate } => *min_pass_rate,
        }
    }
}

/// Observed pass rate for one evaluator, as returned by the eval service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluatorResult {
    /// Evaluator name.
    pub evaluator: String,

    /// Passing rows / total rows, in 0.0-1.0.
    pub pass_rate: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_threshold_is_one() {
        assert_eq!(EvaluatorSpec::Safety.threshold(), 1.0);
        assert_eq!(EvaluatorSpec::Safety.tier(), EvaluatorTier::Safety);
    }

    #[test]
    fn test_quality_threshold_is_configured() {
        let spec = EvaluatorSpec::Quality {
            min_pass_rate: 0.85,
        };
        assert_eq!(spec.threshold(), 0.85);
        assert_eq!(spec.tier(), EvaluatorTier::Quality);
    }

    #[test]
    fn test_spec_serde_tagging() {
        let json = serde_json::to_string(&EvaluatorSpec::Quality {
            min_pass_rate: 0.9,
        })
        .expect("serialize");
        assert!(json.contains("\"tier\":\"quality\""));

        let spec: EvaluatorSpec =
            serde_json::from_str(r#"{"tier":"safety"}"#).expect("deserialize");
        assert_eq!(spec, EvaluatorSpec::Safety);
    }
}
