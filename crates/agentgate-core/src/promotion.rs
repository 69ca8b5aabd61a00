//! Promotion state machine for gated production releases.
//!
//! A [`PromotionMachine`] is scoped to a single change and moves through
//! `AwaitingEvaluation -> Evaluated -> { Promoted | Blocked }`. It never
//! performs the production update itself when unauthorized: proposals never
//! promote, failed verdicts never promote, and a verdict recorded for a
//! different change is rejected outright.

use serde::{Deserialize, Serialize};

use agentgate_cloud::{AgentManifest, PromotedVersion, PromotionTarget, ServiceError};

use crate::gate::GateVerdict;
use crate::obs;

/// What kind of change event triggered this run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    /// A change submitted for review; never authorizes promotion.
    Proposal,

    /// Integration of an approved change into the main line.
    Merge,
}

impl std::str::FromStr for TriggerEvent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "proposal" => Ok(TriggerEvent::Proposal),
            "merge" => Ok(TriggerEvent::Merge),
            other => Err(format!(
                "unknown trigger event '{}' (expected 'proposal' or 'merge')",
                other
            )),
        }
    }
}

impl std::fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerEvent::Proposal => write!(f, "proposal"),
            TriggerEvent::Merge => write!(f, "merge"),
        }
    }
}

/// States of the promotion machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PromotionState {
    AwaitingEvaluation,
    Evaluated { verdict: GateVerdict },
    Promoted { version: PromotedVersion },
    Blocked { reason: String },
}

impl PromotionState {
    pub fn name(&self) -> &'static str {
        match self {
            PromotionState::AwaitingEvaluation => "awaiting_evaluation",
            PromotionState::Evaluated { .. } => "evaluated",
            PromotionState::Promoted { .. } => "promoted",
            PromotionState::Blocked { .. } => "blocked",
        }
    }
}

/// Errors raised by illegal transitions or a failing promotion target.
#[derive(Debug, thiserror::Error)]
pub enum PromotionError {
    /// The machine has no pending verdict to resolve.
    #[error("change '{change_ref}' has no pending gate verdict (state '{state}')")]
    NoPendingVerdict { change_ref: String, state: String },

    /// A verdict for a different change was offered to this machine.
    #[error("verdict is scoped to change '{verdict_ref}' but this machine gates '{expected}'")]
    VerdictScopeMismatch {
        expected: String,
        verdict_ref: String,
    },

    /// The change already reached the `Promoted` terminal state.
    #[error("change '{change_ref}' is already promoted as {version}")]
    AlreadyPromoted {
        change_ref: String,
        version: String,
    },

    /// The promotion target failed after the gate authorized the call.
    /// Distinct from `Blocked`: the gate verdict stands.
    #[error("promotion target failed after authorization: {0}")]
    TargetFailed(#[from] ServiceError),
}

/// Outcome of resolving a recorded verdict against a trigger event.
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionDecision {
    /// Passing verdict on a merge event; the production call may proceed.
    Authorized,

    /// Terminal refusal; the reason names what blocked it.
    Blocked { reason: String },
}

/// Final result of a promotion attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionOutcome {
    Promoted { version: PromotedVersion },
    Blocked { reason: String },
}

/// Two-phase gate between a completed evaluation and the production update.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionMachine {
    change_ref: String,
    state: PromotionState,
}

impl PromotionMachine {
    pub fn new(change_ref: impl Into<String>) -> Self {
        Self {
            change_ref: change_ref.into(),
            state: PromotionState::AwaitingEvaluation,
        }
    }

    pub fn change_ref(&self) -> &str {
        &self.change_ref
    }

    pub fn state(&self) -> &PromotionState {
        &self.state
    }

    /// Record a completed gate run.
    ///
    /// Legal from `AwaitingEvaluation`, `Evaluated`, and `Blocked` — a fresh
    /// gate run re-arms a blocked machine. A verdict scoped to a different
    /// change never arms the machine, and a promoted change is terminal.
    pub fn record_verdict(&mut self, verdict: GateVerdict) -> Result<(), PromotionError> {
        if verdict.change_ref != self.change_ref {
            return Err(PromotionError::VerdictScopeMismatch {
                expected: self.change_ref.clone(),
                verdict_ref: verdict.change_ref,
            });
        }
        if let PromotionState::Promoted { version } = &self.state {
            return Err(PromotionError::AlreadyPromoted {
                change_ref: self.change_ref.clone(),
                version: version.to_string(),
            });
        }
        self.state = PromotionState::Evaluated { verdict };
        Ok(())
    }

    /// Resolve the recorded verdict against the trigger event.
    ///
    /// Proposals transition to `Blocked` even when the verdict passed;
    /// promotion is merge-gated, not verdict-gated alone. A failed verdict
    /// transitions to `Blocked` with the failing evaluators named. Only a
    /// passing verdict on a merge event authorizes the production call.
    pub fn decide(&mut self, event: TriggerEvent) -> Result<PromotionDecision, PromotionError> {
        let verdict = match &self.state {
            PromotionState::Evaluated { verdict } => verdict,
            PromotionState::Promoted { version } => {
                return Err(PromotionError::AlreadyPromoted {
                    change_ref: self.change_ref.clone(),
                    version: version.to_string(),
                });
            }
            other => {
                return Err(PromotionError::NoPendingVerdict {
                    change_ref: self.change_ref.clone(),
                    state: other.name().to_string(),
                });
            }
        };

        let reason = if event == TriggerEvent::Proposal {
            Some("proposal events never authorize promotion".to_string())
        } else if !verdict.passed {
            Some(format!(
                "gate verdict failed: [{}]",
                verdict.failing_evaluators().join(", ")
            ))
        } else {
            None
        };

        match reason {
            Some(reason) => {
                obs::emit_promotion_decided(&self.change_ref, false, Some(&reason));
                self.state = PromotionState::Blocked {
                    reason: reason.clone(),
                };
                Ok(PromotionDecision::Blocked { reason })
            }
            None => {
                obs::emit_promotion_decided(&self.change_ref, true, None);
                Ok(PromotionDecision::Authorized)
            }
        }
    }

    /// Decide and, when authorized, apply the manifest to production.
    ///
    /// A target failure leaves the machine in `Evaluated`: the verdict
    /// stands, and the caller can retry the promotion without re-running
    /// the gate.
    pub async fn promote(
        &mut self,
        event: TriggerEvent,
        target: &dyn PromotionTarget,
        manifest: &AgentManifest,
    ) -> Result<PromotionOutcome, PromotionError> {
        match self.decide(event)? {
            PromotionDecision::Blocked { reason } => Ok(PromotionOutcome::Blocked { reason }),
            PromotionDecision::Authorized => {
                let version = target
                    .apply_production_config(manifest)
                    .await
                    .map_err(PromotionError::TargetFailed)?;
                obs::emit_promotion_applied(&self.change_ref, &version.agent_name, &version.version);
                self.state = PromotionState::Promoted {
                    version: version.clone(),
                };
                Ok(PromotionOutcome::Promoted { version })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::EvaluatorOutcome;
    use crate::domain::evaluator::EvaluatorTier;

    fn verdict(change_ref: &str, passed: bool) -> GateVerdict {
        let outcomes = vec![EvaluatorOutcome {
            evaluator: "coherence".to_string(),
            tier: EvaluatorTier::Quality,
            pass_rate: if passed { 1.0 } else { 0.5 },
            threshold: 0.85,
            passed,
        }];
        GateVerdict {
            change_ref: change_ref.to_string(),
            passed,
            outcomes,
            report_url: None,
        }
    }

    #[test]
    fn test_starts_awaiting_evaluation() {
        let machine = PromotionMachine::new("abc123");
        assert_eq!(machine.state().name(), "awaiting_evaluation");
    }

    #[test]
    fn test_decide_without_verdict_is_an_error() {
        let mut machine = PromotionMachine::new("abc123");
        let err = machine.decide(TriggerEvent::Merge).expect_err("no verdict");
        assert!(matches!(err, PromotionError::NoPendingVerdict { .. }));
    }

    #[test]
    fn test_proposal_blocks_even_when_passing() {
        let mut machine = PromotionMachine::new("abc123");
        machine
            .record_verdict(verdict("abc123", true))
            .expect("record verdict");
        let decision = machine.decide(TriggerEvent::Proposal).expect("decide");
        assert!(matches!(decision, PromotionDecision::Blocked { .. }));
        assert_eq!(machine.state().name(), "blocked");
    }

    #[test]
    fn test_failed_verdict_blocks_on_merge() {
        let mut machine = PromotionMachine::new("abc123");
        machine
            .record_verdict(verdict("abc123", false))
            .expect("record verdict");
        let decision = machine.decide(TriggerEvent::Merge).expect("decide");
        match decision {
            PromotionDecision::Blocked { reason } => assert!(reason.contains("coherence")),
            other => panic!("expected Blocked, got {:?}", other),
        }
    }

    #[test]
    fn test_passing_merge_is_authorized_without_transition() {
        let mut machine = PromotionMachine::new("abc123");
        machine
            .record_verdict(verdict("abc123", true))
            .expect("record verdict");
        let decision = machine.decide(TriggerEvent::Merge).expect("decide");
        assert_eq!(decision, PromotionDecision::Authorized);
        // Promoted is only reached once the target call succeeds.
        assert_eq!(machine.state().name(), "evaluated");
    }

    #[test]
    fn test_stale_verdict_rejected() {
        let mut machine = PromotionMachine::new("abc123");
        let err = machine
            .record_verdict(verdict("def456", true))
            .expect_err("wrong change");
        assert!(matches!(err, PromotionError::VerdictScopeMismatch { .. }));
        assert_eq!(machine.state().name(), "awaiting_evaluation");
    }

    #[test]
    fn test_blocked_machine_rearms_on_fresh_verdict() {
        let mut machine = PromotionMachine::new("abc123");
        machine
            .record_verdict(verdict("abc123", false))
            .expect("record verdict");
        machine.decide(TriggerEvent::Merge).expect("decide");
        assert_eq!(machine.state().name(), "blocked");

        machine
            .record_verdict(verdict("abc123", true))
            .expect("fresh verdict re-arms");
        assert_eq!(machine.state().name(), "evaluated");
    }

    #[test]
    fn test_trigger_event_parsing() {
        assert_eq!("merge".parse::<TriggerEvent>().unwrap(), TriggerEvent::Merge);
        assert_eq!(
            "proposal".parse::<TriggerEvent>().unwrap(),
            TriggerEvent::Proposal
        );
        assert!("push".parse::<TriggerEvent>().is_err());
    }
}
