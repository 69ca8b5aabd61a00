//! Gate report artifacts and change-comment rendering.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::domain::evaluator::EvaluatorTier;
use crate::gate::{EvaluatorOutcome, GateVerdict};

/// Canonical gate report artifact written for CI and PR reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateReportArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub gate_run_id: Uuid,
    pub change_ref: String,
    pub rows_evaluated: usize,
    pub overall_pass: bool,
    pub outcomes: Vec<EvaluatorOutcome>,
    pub report_url: Option<String>,
}

impl GateReportArtifact {
    pub fn from_verdict(verdict: &GateVerdict, rows_evaluated: usize) -> Self {
        Self {
            schema_version: "1.0".to_string(),
            generated_at: Utc::now(),
            gate_run_id: Uuid::new_v4(),
            change_ref: verdict.change_ref.clone(),
            rows_evaluated,
            overall_pass: verdict.passed,
            outcomes: verdict.outcomes.clone(),
            report_url: verdict.report_url.clone(),
        }
    }
}

/// Write the gate report in pretty JSON format.
pub fn write_gate_report_json(path: &Path, artifact: &GateReportArtifact) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact).context("serialize gate report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Write a verdict as the handoff artifact between the gate and promote steps.
pub fn write_verdict_json(path: &Path, verdict: &GateVerdict) -> Result<()> {
    let content = serde_json::to_string_pretty(verdict).context("serialize verdict")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Read a verdict artifact written by an earlier gate step.
pub fn read_verdict_json(path: &Path) -> Result<GateVerdict> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parse verdict {:?}", path))
}

/// Render the markdown summary for a step-summary file or PR comment.
pub fn render_summary_md(verdict: &GateVerdict) -> String {
    let mut out = String::new();
    out.push_str("| Evaluator | Pass Rate | Threshold | Status |\n");
    out.push_str("|-----------|-----------|-----------|--------|\n");
    for outcome in &verdict.outcomes {
        let threshold = match outcome.tier {
            EvaluatorTier::Safety => "100% (safety)".to_string(),
            EvaluatorTier::Quality => format!("{:.0}%", outcome.threshold * 100.0),
        };
        let icon = if outcome.passed { "✅" } else { "❌" };
        out.push_str(&format!(
            "| {} | {:.0}% | {} | {} |\n",
            outcome.evaluator,
            outcome.pass_rate * 100.0,
            threshold,
            icon,
        ));
    }
    out.push('\n');
    out.push_str(&format!(
        "**Gate {}** for `{}`\n",
        if verdict.passed { "passed" } else { "failed" },
        verdict.change_ref,
    ));
    if let Some(url) = &verdict.report_url {
        out.push_str(&format!("\n[View full results]({})\n", url));
    }
    out
}

/// Append rendered markdown to a step-summary file, creating it if needed.
pub fn append_summary_md(path: &Path, verdict: &GateVerdict) -> Result<()> {
    use std::io::Write;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {:?}", path))?;
    file.write_all(render_summary_md(verdict).as_bytes())
        .with_context(|| format!("append {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn verdict() -> GateVerdict {
        GateVerdict {
            change_ref: "abc123".to_string(),
            passed: false,
            outcomes: vec![
                EvaluatorOutcome {
                    evaluator: "coherence".to_string(),
                    tier: EvaluatorTier::Quality,
                    pass_rate: 0.72,
                    threshold: 0.85,
                    passed: false,
                },
                EvaluatorOutcome {
                    evaluator: "violence".to_string(),
                    tier: EvaluatorTier::Safety,
                    pass_rate: 1.0,
                    threshold: 1.0,
                    passed: true,
                },
            ],
            report_url: Some("https://viewer.example/runs/9".to_string()),
        }
    }

    #[test]
    fn test_summary_markdown_render_is_stable() {
        let actual = render_summary_md(&verdict());
        let expected = "| Evaluator | Pass Rate | Threshold | Status |\n\
                        |-----------|-----------|-----------|--------|\n\
                        | coherence | 72% | 85% | ❌ |\n\
                        | violence | 100% | 100% (safety) | ✅ |\n\
                        \n\
                        **Gate failed** for `abc123`\n\
                        \n\
                        [View full results](https://viewer.example/runs/9)\n";
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_report_schema_has_expected_keys() {
        let artifact = GateReportArtifact::from_verdict(&verdict(), 25);
        let raw = serde_json::to_value(&artifact).expect("serialize artifact");
        let obj = raw.as_object().expect("artifact object");
        assert!(obj.contains_key("schema_version"));
        assert!(obj.contains_key("generated_at"));
        assert!(obj.contains_key("gate_run_id"));
        assert!(obj.contains_key("change_ref"));
        assert!(obj.contains_key("outcomes"));

        assert_eq!(raw["rows_evaluated"], json!(25));
        assert_eq!(raw["overall_pass"], json!(false));
        assert_eq!(raw["outcomes"][0]["evaluator"], json!("coherence"));
    }

    #[test]
    fn test_verdict_json_roundtrip_via_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("verdict.json");

        let original = verdict();
        write_verdict_json(&path, &original).expect("write verdict");
        let restored = read_verdict_json(&path).expect("read verdict");
        assert_eq!(original, restored);
    }

    #[test]
    fn test_append_summary_accumulates() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("summary.md");

        append_summary_md(&path, &verdict()).expect("first append");
        append_summary_md(&path, &verdict()).expect("second append");
        let content = std::fs::read_to_string(&path).expect("read summary");
        assert_eq!(content.matches("**Gate failed**").count(), 2);
    }
}
