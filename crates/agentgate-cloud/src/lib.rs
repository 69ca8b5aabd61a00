//! Collaborator layer for agentgate.
//!
//! The gate's hard work — running the agent against the dataset and judging
//! its responses — happens inside a managed cloud evaluation service. This
//! crate defines the two narrow contracts the core logic depends on
//! ([`EvalService`] and [`PromotionTarget`]), a reqwest-backed client
//! implementing both against a Foundry-style REST surface, and in-memory
//! fakes so the core stays testable without any network dependency.

pub mod contract;
pub mod error;
pub mod fakes;
pub mod foundry;

pub use contract::{
    AgentManifest, Environment, EvalRequest, EvalRow, EvalRunOutcome, EvalService,
    EvaluatorCriterion, PromotedVersion, PromotionTarget, ServiceResult,
};
pub use error::ServiceError;
pub use fakes::{FailingEvalService, FixedEvalService, MemoryPromotionTarget};
pub use foundry::{FoundryClient, FoundryConfig};
