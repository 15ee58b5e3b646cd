//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// extforge - build a native library and its extension modules
#[derive(Parser)]
#[command(name = "extforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to Forge.toml (searched for from the current directory by default)
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the native library and every extension module
    Build(BuildArgs),

    /// Show the resolved compile and link configuration
    Flags(FlagsArgs),

    /// Remove the build directory
    Clean(CleanArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Number of parallel jobs (overrides the job directive in the environment)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Emit the build plan as JSON (no build)
    #[arg(long)]
    pub plan: bool,

    /// Build output directory
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct FlagsArgs {
    /// Print only the link line
    #[arg(long, conflicts_with = "compile")]
    pub link: bool,

    /// Print only the compile line
    #[arg(long)]
    pub compile: bool,

    /// Print the report as JSON
    #[arg(long, conflicts_with_all = ["link", "compile"])]
    pub json: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Build output directory
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,
}
