//! create-devstack entry point.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

mod cli;
mod commands;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    devstack_core::log::init(&devstack_core::log::filter_for(cli.verbose, cli.quiet))?;

    match cli.execute() {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
