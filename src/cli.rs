use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "depsync",
    about = "Resolve, compare, and rewrite dependency coordinates across a deps.edn workspace",
    version,
    author
)]
pub struct Cli {
    /// Path to the workspace root (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    pub path: String,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check for available coordinate updates without applying them
    Check {
        /// Include pre-release versions (alpha, beta, RC)
        #[arg(long)]
        include_pre_release: bool,
    },

    /// Apply coordinate updates in place
    Update {
        /// Review each change before applying it
        #[arg(short, long)]
        interactive: bool,

        /// Include pre-release versions (alpha, beta, RC)
        #[arg(long)]
        include_pre_release: bool,

        /// Skip the Git working-directory cleanliness check
        #[arg(long)]
        no_git: bool,
    },

    /// Rewrite local-path coordinates to resolved remote coordinates
    Migrate,
}
