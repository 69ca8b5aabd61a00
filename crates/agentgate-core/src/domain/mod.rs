//! Domain models for agentgate.
//!
//! Canonical definitions for the core entities:
//! - `EvaluatorSpec`: tiered threshold for a single evaluator
//! - `EvaluatorResult`: observed pass rate from one eval run
//! - `EvalRow`: one record of the versioned dataset
//! - `GateError`: the error taxonomy for gate runs

pub mod dataset;
pub mod error;
pub mod evaluator;

pub use dataset::load_dataset;
pub use error::{GateError, Result};
pub use evaluator::{EvaluatorResult, EvaluatorSpec, EvaluatorTier};
