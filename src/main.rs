use anyhow::Result;

mod cli;
mod gui;
mod invoke;
mod params;
mod preview;
mod scripts;
mod table;
#[cfg(test)]
mod testutil;

fn main() -> Result<()> {
    cli::run()
}
