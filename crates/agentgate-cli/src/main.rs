//! agentgate - evaluation gate for AI agent configuration changes.
//!
//! The `agentgate` command wires a CI workflow to the cloud evaluation
//! service and the threshold gate.
//!
//! ## Commands
//!
//! - `gate`: evaluate a candidate config against the dataset (TEST only)
//! - `promote`: apply an already-gated config to the production agent
//! - `check-config`: validate the thresholds file without running anything
//!
//! Exit status is the CI contract: 0 means the change may proceed,
//! non-zero blocks it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;

use agentgate_cloud::{AgentManifest, EvalRequest, FoundryClient};
use agentgate_core::{
    collect, evaluate, load_dataset, obs, read_verdict_json, reporting, to_results,
    EvaluatorSpec, GateReportArtifact, PromotionMachine, PromotionOutcome, ThresholdPolicy,
    TriggerEvent,
};

#[derive(Parser)]
#[command(name = "agentgate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evaluation gate for AI agent configuration changes", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cloud evaluation and check thresholds
    Gate {
        /// Path to the thresholds JSON file
        #[arg(long)]
        thresholds: PathBuf,

        /// Path to the JSONL dataset
        #[arg(long)]
        dataset: PathBuf,

        /// Path to the agent YAML manifest
        #[arg(long)]
        agent: PathBuf,

        /// Change identifier the verdict is scoped to (e.g. commit SHA)
        #[arg(long)]
        change: String,

        /// Known-good SHA-256 of the thresholds file (pre-flight check)
        #[arg(long, env = "AGENTGATE_THRESHOLDS_SHA256")]
        thresholds_sha256: Option<String>,

        /// Test-only agent name; the production agent is never touched
        #[arg(long, env = "AGENTGATE_TEST_AGENT")]
        test_agent_name: Option<String>,

        /// Judge model deployment for quality evaluators
        #[arg(long, env = "AGENTGATE_JUDGE_DEPLOYMENT", default_value = "gpt-4o")]
        judge_deployment: String,

        /// Maximum seconds to wait for the eval run
        #[arg(long, default_value = "1800")]
        wait_limit_secs: u64,

        /// Write the full gate report JSON here
        #[arg(long)]
        report: Option<PathBuf>,

        /// Append the markdown summary here (default: $GITHUB_STEP_SUMMARY)
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Write the verdict artifact for a later `promote` step
        #[arg(long)]
        verdict_out: Option<PathBuf>,
    },

    /// Apply an already-gated config to the production agent
    Promote {
        /// Path to the agent YAML manifest
        #[arg(long)]
        agent: PathBuf,

        /// Change identifier this promotion is for
        #[arg(long)]
        change: String,

        /// Triggering event kind: 'merge' or 'proposal'
        #[arg(long)]
        event: TriggerEvent,

        /// Verdict artifact written by the gate step
        #[arg(long)]
        verdict: PathBuf,
    },

    /// Validate the thresholds file without running anything
    CheckConfig {
        /// Path to the thresholds JSON file
        #[arg(long)]
        thresholds: PathBuf,

        /// Known-good SHA-256 of the thresholds file
        #[arg(long)]
        sha256: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    agentgate_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Gate {
            thresholds,
            dataset,
            agent,
            change,
            thresholds_sha256,
            test_agent_name,
            judge_deployment,
            wait_limit_secs,
            report,
            summary,
            verdict_out,
        } => {
            let passed = cmd_gate(GateArgs {
                thresholds,
                dataset,
                agent,
                change,
                thresholds_sha256,
                test_agent_name,
                judge_deployment,
                wait_limit_secs,
                report,
                summary,
                verdict_out,
            })
            .await?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Promote {
            agent,
            change,
            event,
            verdict,
        } => {
            let promoted = cmd_promote(&agent, &change, event, &verdict).await?;
            if !promoted {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::CheckConfig { thresholds, sha256 } => {
            cmd_check_config(&thresholds, sha256.as_deref())
        }
    }
}

struct GateArgs {
    thresholds: PathBuf,
    dataset: PathBuf,
    agent: PathBuf,
    change: String,
    thresholds_sha256: Option<String>,
    test_agent_name: Option<String>,
    judge_deployment: String,
    wait_limit_secs: u64,
    report: Option<PathBuf>,
    summary: Option<PathBuf>,
    verdict_out: Option<PathBuf>,
}

async fn cmd_gate(args: GateArgs) -> Result<bool> {
    if let Some(expected) = &args.thresholds_sha256 {
        ThresholdPolicy::verify_integrity(&args.thresholds, expected)
            .context("thresholds file failed the integrity check")?;
    }
    let policy = ThresholdPolicy::load(&args.thresholds)?;
    let rows = load_dataset(&args.dataset)?;
    let manifest = AgentManifest::load(&args.agent)?;

    let gate_run_id = Uuid::new_v4();
    let _span = obs::GateSpan::enter(&gate_run_id.to_string(), &args.change);

    let mut request = EvalRequest::test(manifest, rows, policy.criteria(), &args.judge_deployment);
    if let Some(name) = &args.test_agent_name {
        request = request.with_agent_name_override(name);
    }

    let client = FoundryClient::from_env().context("eval service is not configured")?;
    let outcome = collect(
        &client,
        &request,
        Duration::from_secs(args.wait_limit_secs),
    )
    .await?;

    let results = to_results(&outcome);
    let mut verdict = evaluate(&policy, &results, &args.change)?;
    if let Some(url) = &outcome.report_url {
        verdict = verdict.with_report_url(url);
    }
    obs::emit_gate_evaluated(
        &args.change,
        verdict.passed,
        verdict.failing_evaluators().len(),
    );

    println!("{} rows evaluated.\n", outcome.rows_evaluated);
    print!("{}", reporting::render_summary_md(&verdict));

    if let Some(path) = &args.report {
        let artifact = GateReportArtifact::from_verdict(&verdict, outcome.rows_evaluated);
        reporting::write_gate_report_json(path, &artifact)?;
    }
    let summary_path = args
        .summary
        .clone()
        .or_else(|| std::env::var("GITHUB_STEP_SUMMARY").ok().map(PathBuf::from));
    if let Some(path) = summary_path {
        reporting::append_summary_md(&path, &verdict)?;
    }
    if let Some(path) = &args.verdict_out {
        reporting::write_verdict_json(path, &verdict)?;
    }

    if verdict.passed {
        println!("\nAll evaluation thresholds passed.");
    } else {
        println!(
            "\nEvaluation gate FAILED: [{}]",
            verdict.failing_evaluators().join(", ")
        );
    }
    Ok(verdict.passed)
}

async fn cmd_promote(
    agent: &Path,
    change: &str,
    event: TriggerEvent,
    verdict_path: &Path,
) -> Result<bool> {
    let manifest = AgentManifest::load(agent)?;
    let verdict = read_verdict_json(verdict_path)?;

    let mut machine = PromotionMachine::new(change);
    machine
        .record_verdict(verdict)
        .context("verdict artifact does not authorize this change")?;

    let client = FoundryClient::from_env().context("promotion target is not configured")?;
    let outcome = machine
        .promote(event, &client, &manifest)
        .await
        .context("promotion failed after the gate had passed")?;

    match outcome {
        PromotionOutcome::Promoted { version } => {
            println!("Promoted {} for change {}", version, change);
            Ok(true)
        }
        PromotionOutcome::Blocked { reason } => {
            println!("Promotion blocked for change {}: {}", change, reason);
            Ok(false)
        }
    }
}

fn cmd_check_config(thresholds: &Path, sha256: Option<&str>) -> Result<()> {
    if let Some(expected) = sha256 {
        ThresholdPolicy::verify_integrity(thresholds, expected)
            .context("thresholds file failed the integrity check")?;
    }
    let policy = ThresholdPolicy::load(thresholds)?;

    println!("{} evaluators configured:", policy.len());
    for (name, spec) in policy.iter() {
        match spec {
            EvaluatorSpec::Safety => println!("  {name}: safety (must be 100%)"),
            EvaluatorSpec::Quality { min_pass_rate } => {
                println!("  {name}: quality (min {:.0}%)", min_pass_rate * 100.0)
            }
        }
    }
    Ok(())
}
