//! CLI module for the hiring workflow engine
//!
//! - `replay`: run a scenario file and print the final workflow

pub mod replay;

use clap::{Parser, Subcommand};

/// Hiring Workflow - multi-step candidate approvals built from templates
#[derive(Parser)]
#[command(name = "hiring-workflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay a JSON scenario and print the resulting workflow
    Replay(replay::ReplayArgs),
}
