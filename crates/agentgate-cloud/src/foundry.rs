//! Foundry-style cloud evaluation backend.
//!
//! Implements [`EvalService`] and [`PromotionTarget`] against the REST
//! surface of a managed evaluation service: agent versions live under
//! `agents/{name}/versions`, evals under `evals`, runs under
//! `evals/{id}/runs`. The agent is invoked and judged entirely server-side;
//! this client only registers the candidate version, submits the run, polls
//! it to a terminal state, and aggregates per-row judge results into pass
//! rates.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::contract::{
    AgentManifest, EvalRequest, EvalRunOutcome, EvalService, PromotedVersion, PromotionTarget,
};
use crate::error::ServiceError;
use crate::ServiceResult;

/// Connection settings for the Foundry backend.
#[derive(Debug, Clone)]
pub struct FoundryConfig {
    /// Base URL of the project endpoint.
    pub endpoint: String,

    /// Bearer token; unauthenticated when `None`.
    pub token: Option<String>,

    /// Delay between run-status polls.
    pub poll_interval: Duration,
}

impl FoundryConfig {
    /// Read settings from `FOUNDRY_PROJECT` and `FOUNDRY_TOKEN`.
    pub fn from_env() -> ServiceResult<Self> {
        let endpoint = std::env::var("FOUNDRY_PROJECT").map_err(|_| {
            ServiceError::Configuration("FOUNDRY_PROJECT environment variable not set".to_string())
        })?;
        Ok(Self {
            endpoint,
            token: std::env::var("FOUNDRY_TOKEN").ok(),
            poll_interval: Duration::from_secs(10),
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Client for the Foundry eval and agent-registry APIs.
pub struct FoundryClient {
    config: FoundryConfig,
    http: reqwest::Client,
}

// Wire shapes. Only the fields we read are modeled.

#[derive(Debug, Deserialize)]
struct AgentVersion {
    version: String,
}

#[derive(Debug, Deserialize)]
struct CreatedEval {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EvalRun {
    id: String,
    status: String,
    #[serde(default)]
    report_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OutputItemsPage {
    #[serde(default)]
    data: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    results: Vec<JudgeResult>,
}

#[derive(Debug, Deserialize)]
struct JudgeResult {
    name: String,
    #[serde(default)]
    passed: bool,
}

impl FoundryClient {
    pub fn new(config: FoundryConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("agentgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");
        Self { config, http }
    }

    /// Create a client from environment variables.
    pub fn from_env() -> ServiceResult<Self> {
        Ok(Self::new(FoundryConfig::from_env()?))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read_json(&self, response: reqwest::Response) -> ServiceResult<Value> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn post_json(&self, path: &str, body: &Value) -> ServiceResult<Value> {
        let response = self
            .authorize(self.http.post(self.url(path)).json(body))
            .send()
            .await?;
        self.read_json(response).await
    }

    async fn get_json(&self, path: &str) -> ServiceResult<Value> {
        let response = self.authorize(self.http.get(self.url(path))).send().await?;
        self.read_json(response).await
    }

    /// Register the manifest as a new version of the named agent.
    async fn register_version(
        &self,
        agent_name: &str,
        manifest: &AgentManifest,
    ) -> ServiceResult<AgentVersion> {
        let body = json!({
            "model": manifest.model,
            "instructions": manifest.instructions,
        });
        let value = self
            .post_json(&format!("agents/{agent_name}/versions"), &body)
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

fn criteria_payload(request: &EvalRequest) -> Vec<Value> {
    request
        .criteria()
        .iter()
        .map(|c| {
            let mut criterion = json!({
                "type": "azure_ai_evaluator",
                "name": c.name,
                "evaluator_name": c.evaluator,
                "data_mapping": {
                    "query": "{{item.judge_context}}",
                    "response": "{{sample.output_text}}",
                },
            });
            if c.uses_judge {
                criterion["initialization_parameters"] =
                    json!({ "deployment_name": request.judge_deployment() });
            }
            criterion
        })
        .collect()
}

fn compute_pass_rates(items: &[OutputItem]) -> BTreeMap<String, f32> {
    let mut counts: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    for item in items {
        for result in &item.results {
            let entry = counts.entry(result.name.clone()).or_default();
            entry.1 += 1;
            if result.passed {
                entry.0 += 1;
            }
        }
    }
    counts
        .into_iter()
        .map(|(name, (passed, total))| {
            let rate = if total > 0 {
                passed as f32 / total as f32
            } else {
                0.0
            };
            (name, rate)
        })
        .collect()
}

#[async_trait]
impl EvalService for FoundryClient {
    async fn run_eval(&self, request: &EvalRequest) -> ServiceResult<EvalRunOutcome> {
        let agent_name = request.effective_agent_name();

        // 1. Register the candidate config as a new version of the
        //    (test-named) agent.
        let agent = self.register_version(agent_name, request.manifest()).await?;
        info!(agent = %agent_name, version = %agent.version, "registered agent version");

        // 2. Create the eval object: row schema plus judge criteria.
        let eval_name = format!("gate-{}-{}", agent_name, Uuid::new_v4());
        let eval_body = json!({
            "name": eval_name,
            "data_source_config": {
                "type": "custom",
                "item_schema": {
                    "type": "object",
                    "properties": {
                        "input": { "type": "string" },
                        "judge_context": { "type": "string" },
                    },
                    "required": ["input", "judge_context"],
                },
                "include_sample_schema": true,
            },
            "testing_criteria": criteria_payload(request),
        });
        let eval: CreatedEval = serde_json::from_value(self.post_json("evals", &eval_body).await?)?;
        debug!(eval_id = %eval.id, "eval created");

        // 3. Start the run with the rows inline. The message template only
        //    references `input`; judge_context stays invisible to the agent.
        let rows: Vec<Value> = request
            .rows()
            .iter()
            .map(|row| json!({ "item": row }))
            .collect();
        let run_body = json!({
            "name": format!("gate-{}-v{}", agent_name, agent.version),
            "data_source": {
                "type": "target_completions",
                "source": { "type": "file_content", "content": rows },
                "input_messages": {
                    "type": "template",
                    "template": [{
                        "type": "message",
                        "role": "user",
                        "content": { "type": "input_text", "text": "{{item.input}}" },
                    }],
                },
                "target": {
                    "type": "agent",
                    "name": agent_name,
                    "version": agent.version,
                },
            },
        });
        let mut run: EvalRun = serde_json::from_value(
            self.post_json(&format!("evals/{}/runs", eval.id), &run_body)
                .await?,
        )?;
        info!(run_id = %run.id, "eval run started");

        // 4. Poll until terminal.
        while run.status != "completed" && run.status != "failed" {
            tokio::time::sleep(self.config.poll_interval).await;
            run = serde_json::from_value(
                self.get_json(&format!("evals/{}/runs/{}", eval.id, run.id))
                    .await?,
            )?;
            debug!(run_id = %run.id, status = %run.status, "poll");
        }
        if run.status == "failed" {
            return Err(ServiceError::RunFailed {
                run_id: run.id,
                reason: run
                    .error
                    .unwrap_or_else(|| "infrastructure error".to_string()),
            });
        }

        // 5. Aggregate per-row judge results into per-evaluator pass rates.
        let page: OutputItemsPage = serde_json::from_value(
            self.get_json(&format!("evals/{}/runs/{}/output_items", eval.id, run.id))
                .await?,
        )?;
        let pass_rates = compute_pass_rates(&page.data);
        info!(rows = page.data.len(), evaluators = pass_rates.len(), "eval run completed");

        Ok(EvalRunOutcome {
            run_id: run.id,
            pass_rates,
            rows_evaluated: page.data.len(),
            report_url: run.report_url,
        })
    }
}

#[async_trait]
impl PromotionTarget for FoundryClient {
    async fn apply_production_config(
        &self,
        manifest: &AgentManifest,
    ) -> ServiceResult<PromotedVersion> {
        let agent = self.register_version(&manifest.name, manifest).await?;
        info!(agent = %manifest.name, version = %agent.version, "production config applied");
        Ok(PromotedVersion {
            agent_name: manifest.name.clone(),
            version: agent.version,
        })
    }
}
