use clap::Parser;
use hiring_workflow::cli::{self, Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Replay(args) => cli::replay::run(args),
    }
}
