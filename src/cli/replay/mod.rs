//! Replay command - runs a scenario file through the workflow service

mod scenario;

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;

pub use scenario::{
    replay, Action, ActionOutcome, EmployeeSpec, ReplayReport, RoleSpec, Scenario,
    ScenarioAction, StepSpec, TemplateSpec,
};

/// Arguments for the replay command
#[derive(Args, Clone)]
pub struct ReplayArgs {
    /// Scenario JSON file
    pub scenario: PathBuf,

    /// Exit with an error when any action fails
    #[arg(long)]
    pub strict: bool,
}

/// Replay a scenario and print the resulting workflow as JSON
pub fn run(args: ReplayArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    let raw = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("Failed to read {}", args.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", args.scenario.display()))?;

    let report = replay(&scenario, &config.workflow)?;
    info!(
        workflow_id = %report.workflow.id(),
        actions = report.outcomes.len(),
        failures = report.failures(),
        status = %report.workflow.status(),
        "Replay finished"
    );

    println!("{}", serde_json::to_string_pretty(&report.workflow)?);

    if args.strict && report.failures() > 0 {
        anyhow::bail!("{} of {} actions failed", report.failures(), report.outcomes.len());
    }

    Ok(())
}
