//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `FixedEvalService`, `FailingEvalService`, and
//! `MemoryPromotionTarget` that satisfy the trait contracts without any
//! network dependency.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::contract::{
    AgentManifest, EvalRequest, EvalRunOutcome, EvalService, PromotedVersion, PromotionTarget,
};
use crate::error::ServiceError;
use crate::ServiceResult;

// ---------------------------------------------------------------------------
// FixedEvalService
// ---------------------------------------------------------------------------

/// Eval service fake that returns a canned outcome.
///
/// An optional artificial delay lets timeout behavior be exercised without a
/// real slow backend. Every effective agent name seen is recorded so tests
/// can assert that runs stayed on the test-only name.
pub struct FixedEvalService {
    outcome: EvalRunOutcome,
    delay: Duration,
    seen_agent_names: Mutex<Vec<String>>,
}

impl FixedEvalService {
    pub fn new(outcome: EvalRunOutcome) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            seen_agent_names: Mutex::new(Vec::new()),
        }
    }

    /// Convenience constructor from `(name, rate)` pairs.
    pub fn with_rates(rates: &[(&str, f32)], rows_evaluated: usize) -> Self {
        let pass_rates: BTreeMap<String, f32> = rates
            .iter()
            .map(|(name, rate)| (name.to_string(), *rate))
            .collect();
        Self::new(EvalRunOutcome {
            run_id: "fake-run-1".to_string(),
            pass_rates,
            rows_evaluated,
            report_url: Some("https://fake.viewer/run/1".to_string()),
        })
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Agent names this fake has been asked to evaluate.
    pub fn seen_agent_names(&self) -> Vec<String> {
        self.seen_agent_names.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvalService for FixedEvalService {
    async fn run_eval(&self, request: &EvalRequest) -> ServiceResult<EvalRunOutcome> {
        self.seen_agent_names
            .lock()
            .unwrap()
            .push(request.effective_agent_name().to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.outcome.clone())
    }
}

// ---------------------------------------------------------------------------
// FailingEvalService
// ---------------------------------------------------------------------------

/// Eval service fake that always fails with a transport error.
pub struct FailingEvalService {
    message: String,
}

impl FailingEvalService {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl EvalService for FailingEvalService {
    async fn run_eval(&self, _request: &EvalRequest) -> ServiceResult<EvalRunOutcome> {
        Err(ServiceError::Transport(self.message.clone()))
    }
}

// ---------------------------------------------------------------------------
// MemoryPromotionTarget
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PromotionLog {
    applied: Vec<AgentManifest>,
    failing: bool,
}

/// Promotion target fake that records applied manifests.
///
/// Version identifiers increase monotonically (`v1`, `v2`, ...). Switch the
/// failure mode on to simulate the target dying after authorization.
#[derive(Debug, Default)]
pub struct MemoryPromotionTarget {
    log: Mutex<PromotionLog>,
}

impl MemoryPromotionTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.log.lock().unwrap().failing = failing;
    }

    /// Manifests applied so far, in order.
    pub fn applied(&self) -> Vec<AgentManifest> {
        self.log.lock().unwrap().applied.clone()
    }
}

#[async_trait]
impl PromotionTarget for MemoryPromotionTarget {
    async fn apply_production_config(
        &self,
        manifest: &AgentManifest,
    ) -> ServiceResult<PromotedVersion> {
        let mut log = self.log.lock().unwrap();
        if log.failing {
            return Err(ServiceError::Transport(
                "promotion target unreachable".to_string(),
            ));
        }
        log.applied.push(manifest.clone());
        Ok(PromotedVersion {
            agent_name: manifest.name.clone(),
            version: format!("v{}", log.applied.len()),
        })
    }
}
