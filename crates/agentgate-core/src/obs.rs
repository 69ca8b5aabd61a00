//! Structured observability hooks for gate run lifecycle events.
//!
//! Gate runs are wrapped in a `GateSpan` RAII guard; the emission functions
//! cover the key lifecycle points: eval submission, result collection, gate
//! evaluation, promotion decision, promotion application.

use tracing::info;

/// RAII guard that enters a gate-run-scoped tracing span.
pub struct GateSpan {
    _span: tracing::span::EnteredSpan,
}

impl GateSpan {
    /// Create and enter a span tagged with the gate run id and change ref.
    pub fn enter(gate_run_id: &str, change_ref: &str) -> Self {
        let span =
            tracing::info_span!("agentgate.run", gate_run_id = %gate_run_id, change_ref = %change_ref);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: eval run submitted to the cloud service.
pub fn emit_eval_started(agent_name: &str, rows: usize) {
    info!(event = "eval.started", agent_name = %agent_name, rows = rows);
}

/// Emit event: pass rates collected from a completed eval run.
pub fn emit_results_collected(run_id: &str, evaluators: usize, rows_evaluated: usize) {
    info!(
        event = "eval.results_collected",
        run_id = %run_id,
        evaluators = evaluators,
        rows_evaluated = rows_evaluated,
    );
}

/// Emit event: gate verdict produced.
pub fn emit_gate_evaluated(change_ref: &str, passed: bool, failing: usize) {
    info!(
        event = "gate.evaluated",
        change_ref = %change_ref,
        passed = passed,
        failing = failing,
    );
}

/// Emit event: promotion decision made.
pub fn emit_promotion_decided(change_ref: &str, authorized: bool, reason: Option<&str>) {
    match reason {
        Some(reason) => info!(
            event = "promotion.decided",
            change_ref = %change_ref,
            authorized = authorized,
            reason = %reason,
        ),
        None => info!(
            event = "promotion.decided",
            change_ref = %change_ref,
            authorized = authorized,
        ),
    }
}

/// Emit event: production config applied.
pub fn emit_promotion_applied(change_ref: &str, agent_name: &str, version: &str) {
    info!(
        event = "promotion.applied",
        change_ref = %change_ref,
        agent_name = %agent_name,
        version = %version,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_span_create() {
        let _span = GateSpan::enter("run-1", "abc123");
    }
}
