//! Bounded-wait collection of eval results from the cloud service.
//!
//! The cloud call can block for minutes while the run executes server-side,
//! so the single `run_eval` call is wrapped in a timeout: on elapse the gate
//! fails closed with [`GateError::EvaluationTimedOut`] instead of hanging.
//! No retries happen here; one gate run makes at most one collaborator call.

use std::time::Duration;

use agentgate_cloud::{EvalRequest, EvalRunOutcome, EvalService};

use crate::domain::error::{GateError, Result};
use crate::domain::evaluator::EvaluatorResult;
use crate::obs;

/// Call the eval service once, bounded by `wait_limit`.
pub async fn collect(
    service: &dyn EvalService,
    request: &EvalRequest,
    wait_limit: Duration,
) -> Result<EvalRunOutcome> {
    obs::emit_eval_started(request.effective_agent_name(), request.rows().len());

    let outcome = tokio::time::timeout(wait_limit, service.run_eval(request))
        .await
        .map_err(|_| GateError::EvaluationTimedOut {
            limit_secs: wait_limit.as_secs(),
        })??;

    obs::emit_results_collected(
        &outcome.run_id,
        outcome.pass_rates.len(),
        outcome.rows_evaluated,
    );
    Ok(outcome)
}

/// Flatten an outcome's rate map into results, in evaluator-name order.
pub fn to_results(outcome: &EvalRunOutcome) -> Vec<EvaluatorResult> {
    outcome
        .pass_rates
        .iter()
        .map(|(evaluator, pass_rate)| EvaluatorResult {
            evaluator: evaluator.clone(),
            pass_rate: *pass_rate,
        })
        .collect()
}
