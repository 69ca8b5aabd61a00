//! agentgate core library
//!
//! The decision layer of the evaluation gate: threshold policy, the pure
//! gate engine, the promotion state machine, bounded result collection, and
//! the reporting artifacts. The cloud service that actually runs the agent
//! and its judges sits behind the `agentgate-cloud` contracts.

pub mod collector;
pub mod domain;
pub mod gate;
pub mod obs;
pub mod policy;
pub mod promotion;
pub mod reporting;
pub mod telemetry;

pub use domain::{
    load_dataset, EvaluatorResult, EvaluatorSpec, EvaluatorTier, GateError, Result,
};

pub use agentgate_cloud::{
    AgentManifest, Environment, EvalRequest, EvalRow, EvalRunOutcome, EvalService,
    EvaluatorCriterion, PromotedVersion, PromotionTarget, ServiceError,
};

pub use collector::{collect, to_results};
pub use gate::{evaluate, EvaluatorOutcome, GateVerdict};
pub use obs::{
    emit_eval_started, emit_gate_evaluated, emit_promotion_applied, emit_promotion_decided,
    emit_results_collected, GateSpan,
};
pub use policy::ThresholdPolicy;
pub use promotion::{
    PromotionDecision, PromotionError, PromotionMachine, PromotionOutcome, PromotionState,
    TriggerEvent,
};
pub use reporting::{
    append_summary_md, read_verdict_json, render_summary_md, write_gate_report_json,
    write_verdict_json, GateReportArtifact,
};
pub use telemetry::init_tracing;

/// agentgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
