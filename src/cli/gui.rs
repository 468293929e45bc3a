use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use crate::{gui, invoke::InterpreterArgs, scripts::ScriptsArgs};

/// Runs a GUI for browsing and running the scripts.
#[derive(Args, Debug)]
pub struct Command {
    #[command(flatten)]
    scripts: ScriptsArgs,

    #[command(flatten)]
    interpreter: InterpreterArgs,

    #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
    gtk_options: Vec<String>,
}

/// Runs the subcommand. Must be called from the main thread.
pub fn run(cmd: &Command) -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("scriptdash");

    let init = gui::mainwin::Init {
        xdg_dirs: Arc::new(xdg_dirs),
        scripts_dir: cmd.scripts.scripts_dir().to_owned(),
        interpreter: cmd.interpreter.interpreter().to_owned(),
    };

    let program_invocation = std::env::args()
        .next()
        .unwrap_or_else(|| "scriptdash".to_owned());
    let mut gtk_args = vec![program_invocation];
    gtk_args.extend(cmd.gtk_options.iter().cloned());

    gui::mainwin::run_gui(init, gtk_args);

    Ok(())
}
