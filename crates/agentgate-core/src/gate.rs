//! Threshold gate decision procedure.
//!
//! Joins observed per-evaluator pass rates against a [`ThresholdPolicy`] to
//! produce a [`GateVerdict`] — the pass/fail decision that blocks or allows
//! a merge. Safety evaluators veto unconditionally; quality evaluators must
//! meet their configured minimum pass rate.
//!
//! [`evaluate`] is a pure function over already-collected results: no I/O,
//! no retries, and identical inputs always yield an identical verdict.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::{GateError, Result};
use crate::domain::evaluator::{EvaluatorResult, EvaluatorTier};
use crate::policy::ThresholdPolicy;

/// One row of a gate verdict: an observed result joined with its spec.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluatorOutcome {
    /// Evaluator name.
    pub evaluator: String,

    /// Tier inherited from the evaluator's spec.
    pub tier: EvaluatorTier,

    /// Observed pass rate.
    pub pass_rate: f32,

    /// The rate this evaluator had to meet (1.0 for safety).
    pub threshold: f32,

    /// Whether this evaluator met its threshold.
    pub passed: bool,
}

/// The outcome of one gate run.
///
/// Created once per run and never mutated; the reporting step and the
/// promotion decision both consume it as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateVerdict {
    /// Change identifier this verdict is scoped to.
    pub change_ref: String,

    /// Whether every evaluator met its threshold.
    pub passed: bool,

    /// Per-evaluator outcomes, in policy (name) order.
    pub outcomes: Vec<EvaluatorOutcome>,

    /// Link to the eval service's results viewer.
    pub report_url: Option<String>,
}

impl GateVerdict {
    /// Attach the results-viewer link.
    pub fn with_report_url(mut self, url: impl Into<String>) -> Self {
        self.report_url = Some(url.into());
        self
    }

    /// Names of the evaluators that failed, in policy order.
    pub fn failing_evaluators(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed)
            .map(|o| o.evaluator.as_str())
            .collect()
    }
}

/// Evaluate observed results against the policy for the given change.
///
/// Fails closed on any structural mismatch between results and policy:
/// a result with no spec is [`GateError::UnknownEvaluator`], a spec with no
/// result is [`GateError::MissingEvaluatorResult`], and a pass rate outside
/// [0.0, 1.0] is rejected rather than clamped.
pub fn evaluate(
    policy: &ThresholdPolicy,
    results: &[EvaluatorResult],
    change_ref: &str,
) -> Result<GateVerdict> {
    let mut observed: BTreeMap<&str, f32> = BTreeMap::new();
    for result in results {
        if observed
            .insert(result.evaluator.as_str(), result.pass_rate)
            .is_some()
        {
            return Err(GateError::ConfigValidation(format!(
                "duplicate result for evaluator '{}'",
                result.evaluator
            )));
        }
        if policy.get(&result.evaluator).is_none() {
            return Err(GateError::UnknownEvaluator {
                evaluator: result.evaluator.clone(),
            });
        }
    }

    let mut outcomes = Vec::with_capacity(policy.len());
    for (name, spec) in policy.iter() {
        let pass_rate = *observed.get(name.as_str()).ok_or_else(|| {
            GateError::MissingEvaluatorResult {
                evaluator: name.clone(),
            }
        })?;
        if !pass_rate.is_finite() || !(0.0..=1.0).contains(&pass_rate) {
            return Err(GateError::ConfigValidation(format!(
                "evaluator '{}' returned pass rate {} outside [0.0, 1.0]",
                name, pass_rate
            )));
        }

        let threshold = spec.threshold();
        outcomes.push(EvaluatorOutcome {
            evaluator: name.clone(),
            tier: spec.tier(),
            pass_rate,
            threshold,
            passed: pass_rate >= threshold,
        });
    }

    let passed = outcomes.iter().all(|o| o.passed);
    Ok(GateVerdict {
        change_ref: change_ref.to_string(),
        passed,
        outcomes,
        report_url: None,
    })
}
