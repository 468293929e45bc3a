use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::{preview, table::Row};

/// Prints the leading rows of a tabular file.
#[derive(Args, Debug)]
pub struct Command {
    /// Path to the CSV or XLSX file to preview.
    file: PathBuf,
}

/// Runs the subcommand.
pub fn run(cmd: &Command) -> Result<()> {
    let preview = preview::preview_file(&cmd.file)?;

    print_row(&preview.header);
    for row in preview.rows.iter() {
        print_row(row);
    }

    Ok(())
}

fn print_row(row: &Row) {
    println!("{}", row.join("\t"));
}
