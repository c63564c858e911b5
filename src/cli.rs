use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// File-backed construction-project planner with dependency-aware scheduling.
/// Storage defaults to per-project plan files under ~/.bp, or a path passed
/// via --db.
#[derive(Parser)]
#[command(name = "bp", version, about = "Project planning CLI with FS/SS/FF/SF task dependencies")]
pub struct Cli {
    /// Path to the JSON plan file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
