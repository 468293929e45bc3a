use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;

use crate::{
    invoke::{self, InterpreterArgs, InvokeEvents},
    params,
    scripts::ScriptsArgs,
};

/// Runs a script with values for its declared parameters, relaying its
/// output as it is produced.
#[derive(Args, Debug)]
pub struct Command {
    /// File name of the script within the scripts directory, or a path to
    /// it.
    script: String,

    /// Values for the script's declared parameters, in declared order.
    values: Vec<String>,

    #[command(flatten)]
    scripts: ScriptsArgs,

    #[command(flatten)]
    interpreter: InterpreterArgs,
}

impl Command {
    fn script_path(&self) -> PathBuf {
        let as_path = PathBuf::from(&self.script);
        if as_path.components().count() > 1 || as_path.is_file() {
            as_path
        } else {
            self.scripts.scripts_dir().join(&self.script)
        }
    }
}

/// Runs the subcommand. Exits the process with the child's own exit code
/// when the child fails.
pub fn run(cmd: &Command) -> Result<()> {
    let script_path = cmd.script_path();
    let source = fs::read_to_string(&script_path)
        .with_context(|| format!("reading script {:?}", script_path))?;
    let specs = params::extract_params(&source);

    let mut events = OutputRelay;
    let status = invoke::invoke_script(
        cmd.interpreter.interpreter(),
        &script_path,
        &specs,
        &cmd.values,
        &mut events,
    )?;

    if !status.success() {
        match status.code() {
            Some(code) => std::process::exit(code),
            None => bail!("script {:?} was terminated by a signal", script_path),
        }
    }

    Ok(())
}

/// Relays child output to this process's own streams.
struct OutputRelay;

impl InvokeEvents for OutputRelay {
    fn on_line(&mut self, line: &str) {
        println!("{}", line);
    }

    fn on_stderr(&mut self, text: &str) {
        eprint!("{}", text);
    }
}
