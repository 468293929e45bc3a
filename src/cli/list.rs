use anyhow::Result;
use clap::Args;

use crate::scripts::{self, ScriptsArgs};

/// Lists the scripts in the scripts directory with their declared
/// parameters.
#[derive(Args, Debug)]
pub struct Command {
    #[command(flatten)]
    scripts: ScriptsArgs,
}

/// Runs the subcommand.
pub fn run(cmd: &Command) -> Result<()> {
    let entries = scripts::list_scripts(cmd.scripts.scripts_dir())?;
    if entries.is_empty() {
        println!("No scripts found in {:?}.", cmd.scripts.scripts_dir());
        return Ok(());
    }

    let name_width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    for entry in &entries {
        println!(
            "{:<name_width$}  {}  [{}]",
            entry.name,
            entry.path.display(),
            entry.params_summary(),
        );
    }

    Ok(())
}
