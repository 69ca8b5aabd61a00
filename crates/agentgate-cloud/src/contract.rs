//! Contract definitions for the external collaborators.
//!
//! Two narrow, backend-agnostic traits:
//! - `EvalService`: run a server-side evaluation of a candidate agent config
//!   and return per-evaluator pass rates.
//! - `PromotionTarget`: apply an already-gated config to the production agent.
//!
//! Both are async. In-memory fakes satisfying the contracts are provided for
//! testing via the `fakes` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ServiceError;

/// Result type for collaborator operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Deployment environment for an agent resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Environment {
    Test,
    Production,
}

/// One dataset record sent into an eval run.
///
/// `input` is the only text the agent ever sees; its behavior comes from its
/// own instructions, not from context embedded in the row. `judge_context`
/// is read solely by the judge evaluators server-side and may be richer than
/// `input`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvalRow {
    pub input: String,
    pub judge_context: String,
}

/// Versioned agent configuration payload.
///
/// Matches the on-disk `agent.yaml`: `name`, `model`, `system_message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentManifest {
    /// Agent name as registered with the service.
    pub name: String,

    /// Model deployment backing the agent.
    pub model: String,

    /// System instructions, whitespace-trimmed.
    #[serde(rename = "system_message")]
    pub instructions: String,
}

impl AgentManifest {
    /// Parse a manifest from YAML content, validating required fields.
    pub fn from_yaml(content: &str) -> ServiceResult<Self> {
        let mut manifest: AgentManifest = serde_yaml::from_str(content)
            .map_err(|e| ServiceError::InvalidManifest(e.to_string()))?;
        manifest.instructions = manifest.instructions.trim().to_string();

        if manifest.name.trim().is_empty() {
            return Err(ServiceError::InvalidManifest(
                "agent name must not be empty".to_string(),
            ));
        }
        if manifest.model.trim().is_empty() {
            return Err(ServiceError::InvalidManifest(
                "model must not be empty".to_string(),
            ));
        }
        if manifest.instructions.is_empty() {
            return Err(ServiceError::InvalidManifest(
                "system_message must not be empty".to_string(),
            ));
        }
        Ok(manifest)
    }

    /// Load a manifest from a YAML file.
    pub fn load(path: &Path) -> ServiceResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::InvalidManifest(format!("read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }
}

/// A single server-side evaluator to attach to an eval run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluatorCriterion {
    /// Report name; also the key under which the pass rate comes back.
    pub name: String,

    /// Service-side evaluator key (e.g. `builtin.coherence`).
    pub evaluator: String,

    /// Whether this evaluator is scored by the judge model deployment.
    pub uses_judge: bool,
}

/// A server-side evaluation request.
///
/// Only constructible via [`EvalRequest::test`]: evaluation runs always
/// target the TEST environment, and the optional name override lets CI use a
/// test-only agent name so the production agent is never touched by a
/// proposal run.
#[derive(Debug, Clone)]
pub struct EvalRequest {
    manifest: AgentManifest,
    rows: Vec<EvalRow>,
    criteria: Vec<EvaluatorCriterion>,
    judge_deployment: String,
    agent_name_override: Option<String>,
}

impl EvalRequest {
    /// Build a TEST-scoped request for the given candidate config.
    pub fn test(
        manifest: AgentManifest,
        rows: Vec<EvalRow>,
        criteria: Vec<EvaluatorCriterion>,
        judge_deployment: impl Into<String>,
    ) -> Self {
        Self {
            manifest,
            rows,
            criteria,
            judge_deployment: judge_deployment.into(),
            agent_name_override: None,
        }
    }

    /// Register the candidate under this name instead of the manifest name.
    pub fn with_agent_name_override(mut self, name: impl Into<String>) -> Self {
        self.agent_name_override = Some(name.into());
        self
    }

    pub fn manifest(&self) -> &AgentManifest {
        &self.manifest
    }

    pub fn rows(&self) -> &[EvalRow] {
        &self.rows
    }

    pub fn criteria(&self) -> &[EvaluatorCriterion] {
        &self.criteria
    }

    pub fn judge_deployment(&self) -> &str {
        &self.judge_deployment
    }

    /// The agent name this run registers and targets (override wins).
    pub fn effective_agent_name(&self) -> &str {
        self.agent_name_override
            .as_deref()
            .unwrap_or(&self.manifest.name)
    }

    pub fn environment(&self) -> Environment {
        Environment::Test
    }
}

/// Outcome of a completed evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalRunOutcome {
    /// Service-side run identifier.
    pub run_id: String,

    /// Observed pass rate per evaluator name (passing rows / total rows).
    pub pass_rates: BTreeMap<String, f32>,

    /// Number of dataset rows the service evaluated.
    pub rows_evaluated: usize,

    /// Link to the service's results viewer, when provided.
    pub report_url: Option<String>,
}

/// New production version created by a promotion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromotedVersion {
    pub agent_name: String,
    pub version: String,
}

impl std::fmt::Display for PromotedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.agent_name, self.version)
    }
}

/// Cloud evaluation service.
///
/// Guarantees:
/// - The agent is invoked and judged entirely server-side; the caller never
///   sees per-row model output, only aggregated pass rates.
/// - One call corresponds to one eval run against one agent version.
/// - The call may block for minutes while the run executes; callers are
///   expected to bound the wait themselves.
#[async_trait]
pub trait EvalService: Send + Sync {
    /// Run a full server-side evaluation and return per-evaluator pass rates.
    async fn run_eval(&self, request: &EvalRequest) -> ServiceResult<EvalRunOutcome>;
}

/// Production promotion target.
///
/// Semantics:
/// - `apply_production_config` registers the manifest as a new version of
///   the production agent and returns the created version identifier.
/// - The call is only legal after a gate has authorized it; refusing
///   unauthorized calls is the caller's responsibility, not this trait's.
#[async_trait]
pub trait PromotionTarget: Send + Sync {
    /// Apply the manifest to the production agent, returning the new version.
    async fn apply_production_config(
        &self,
        manifest: &AgentManifest,
    ) -> ServiceResult<PromotedVersion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST_YAML: &str = r#"
name: dev-assistant
model: gpt-4o
system_message: |
  You are a careful developer assistant.
"#;

    #[test]
    fn test_manifest_from_yaml() {
        let manifest = AgentManifest::from_yaml(MANIFEST_YAML).expect("parse manifest");
        assert_eq!(manifest.name, "dev-assistant");
        assert_eq!(manifest.model, "gpt-4o");
        assert_eq!(manifest.instructions, "You are a careful developer assistant.");
    }

    #[test]
    fn test_manifest_rejects_missing_instructions() {
        let result = AgentManifest::from_yaml("name: a\nmodel: m\nsystem_message: \"  \"\n");
        assert!(matches!(result, Err(ServiceError::InvalidManifest(_))));
    }

    #[test]
    fn test_manifest_rejects_empty_name() {
        let result = AgentManifest::from_yaml("name: \"\"\nmodel: m\nsystem_message: hi\n");
        assert!(matches!(result, Err(ServiceError::InvalidManifest(_))));
    }

    #[test]
    fn test_manifest_load_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(MANIFEST_YAML.as_bytes()).expect("write yaml");
        let manifest = AgentManifest::load(file.path()).expect("load manifest");
        assert_eq!(manifest.name, "dev-assistant");
    }

    #[test]
    fn test_eval_request_is_test_scoped() {
        let manifest = AgentManifest::from_yaml(MANIFEST_YAML).expect("parse manifest");
        let request = EvalRequest::test(manifest, vec![], vec![], "gpt-4o");
        assert_eq!(request.environment(), Environment::Test);
        assert_eq!(request.effective_agent_name(), "dev-assistant");
    }

    #[test]
    fn test_eval_request_name_override_wins() {
        let manifest = AgentManifest::from_yaml(MANIFEST_YAML).expect("parse manifest");
        let request = EvalRequest::test(manifest, vec![], vec![], "gpt-4o")
            .with_agent_name_override("dev-assistant-ci");
        assert_eq!(request.effective_agent_name(), "dev-assistant-ci");
    }

    #[test]
    fn test_environment_serde() {
        let json = serde_json::to_string(&Environment::Production).expect("serialize");
        assert!(json.contains("PRODUCTION"));
        let json = serde_json::to_string(&Environment::Test).expect("serialize");
        assert!(json.contains("TEST"));
    }

    #[test]
    fn test_eval_row_serde_field_names() {
        let row: EvalRow = serde_json::from_str(
            r#"{"input": "How do I deploy?", "judge_context": "How do I deploy? (docs: ...)"}"#,
        )
        .expect("deserialize row");
        assert_eq!(row.input, "How do I deploy?");
    }
}
