use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use simplelog::LevelFilter;

mod gui;
mod list;
mod preview;
mod run;

/// Dashboard for discovering and running parameterised Python scripts.
#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Logging level.
    #[arg(long, default_value = "Warn")]
    log_level: LevelFilter,
}

#[derive(Subcommand)]
enum Command {
    List(list::Command),
    Run(run::Command),
    Preview(preview::Command),
    Gui(gui::Command),
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default())
        .with_context(|| "configuring logging")?;

    use Command::*;
    match &args.command {
        List(cmd) => list::run(cmd),
        Run(cmd) => run::run(cmd),
        Preview(cmd) => preview::run(cmd),
        Gui(cmd) => gui::run(cmd),
    }
}
