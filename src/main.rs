mod cli;
mod config;
mod depsfile;
mod diff;
mod error;
mod git;
mod interaction;
mod migrate;
mod registry;
mod resolve;
mod scanner;
mod version;
mod workflow;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use std::process;

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        unsafe {
            std::env::set_var("DEPSYNC_VERBOSE", "1");
        }
    }

    let result = match cli.command {
        Commands::Check { include_pre_release } => {
            workflow::execute_check(&cli.path, include_pre_release)
        }
        Commands::Update {
            interactive,
            include_pre_release,
            no_git,
        } => workflow::execute_update(&cli.path, interactive, include_pre_release, no_git),
        Commands::Migrate => workflow::execute_migrate(&cli.path),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
