//! # bp - Construction Project Planning CLI
//!
//! A command-line planner for construction-style projects where tasks are
//! tied together by scheduling dependencies.
//!
//! ## Key Features
//!
//! - **Dependency-aware scheduling**: the four standard link kinds
//!   (Finish-to-Start, Start-to-Start, Finish-to-Finish, Start-to-Finish)
//!   with signed lag, and a forward pass that computes earliest feasible
//!   dates across a project
//! - **Cycle protection**: every dependency edit is validated against the
//!   full project graph before it is saved; a cycle blocks the save and the
//!   offending path is reported (e.g. "4 → 7 → 9 → 4")
//! - **Date/duration sync**: start, end and duration are kept consistent,
//!   with the edited field deciding which other field is derived
//! - **Multi-Project Support**: each project is a local JSON plan file
//! - **Local File Storage**: simple JSON files with CSV export and backups
//!
//! ## Quick Start
//!
//! ```bash
//! # Add tasks
//! bp add "Pour foundation" --project bridge --start 2024-03-01 --duration 10
//! bp add "Erect frame" --project bridge --duration 15 --after 1:fs:2
//!
//! # Link two existing tasks (start-to-start, 3 days overlap)
//! bp link "Fit windows" "Erect frame" --kind ss --lag -3
//!
//! # Recompute the whole project's earliest dates
//! bp schedule --project bridge --dry-run
//!
//! # List and inspect
//! bp list --project bridge
//! bp view "Erect frame"
//! ```
//!
//! Data is stored locally in `~/.bp/` with each project as a separate JSON
//! plan file. Source control or back up this folder periodically.

use std::path::PathBuf;

use clap::Parser;

pub mod cli;
pub mod cmd;
pub mod db;
pub mod fields;
pub mod project;
pub mod schedule;
pub mod task;

use cli::Cli;
use cmd::*;
use db::Database;
use project::*;

fn main() {
    let cli = Cli::parse();

    // Determine bp directory
    let bp_dir = if let Some(db_path) = cli.db.as_ref() {
        db_path.parent().unwrap_or_else(|| std::path::Path::new(".")).to_path_buf()
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let bp_dir = PathBuf::from(home).join(".bp");
        if let Err(e) = std::fs::create_dir_all(&bp_dir) {
            eprintln!("Failed to create bp directory {}: {}", bp_dir.display(), e);
            std::process::exit(1);
        }
        bp_dir
    };

    // Determine the plan file to use: --db wins, otherwise the most recently
    // touched project, otherwise a fresh default project.
    let db_path = cli.db.unwrap_or_else(|| {
        match get_most_recent_project(&bp_dir) {
            Ok(Some(project)) => project.file_path,
            _ => {
                let default_project = Project::new("Default", &bp_dir);
                if let Err(e) = default_project.create_if_not_exists() {
                    eprintln!("Failed to create default project: {}", e);
                    std::process::exit(1);
                }
                default_project.file_path
            }
        }
    });

    let mut db = match Database::load(&db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Add { title, project, start, end, duration, after, parent, status, notes } =>
            cmd_add(&mut db, &db_path, title, project, start, end, duration, after, parent,
                    status, notes),

        Commands::List { all, status, project, start, tree, sort, limit } =>
            cmd_list(&db, all, status, project, start, tree, sort, limit),

        Commands::View { id } => cmd_view(&db, id),

        Commands::Update { id, title, project, start, end, duration, parent, status, notes,
                          clear_start, clear_end, clear_parent } =>
            cmd_update(&mut db, &db_path, id, title, project, start, end, duration, parent,
                      status, notes, clear_start, clear_end, clear_parent),

        Commands::Link { id, predecessor, kind, lag } =>
            cmd_link(&mut db, &db_path, id, predecessor, kind, lag),

        Commands::Unlink { id, predecessor } =>
            cmd_unlink(&mut db, &db_path, id, predecessor),

        Commands::Schedule { project, dry_run } =>
            cmd_schedule(&mut db, &db_path, project, dry_run),

        Commands::Complete { id, recurse } => cmd_complete(&mut db, &db_path, id, recurse),

        Commands::Reopen { id } => cmd_reopen(&mut db, &db_path, id),

        Commands::Delete { id, cascade } => cmd_delete(&mut db, &db_path, id, cascade),

        Commands::Projects => cmd_projects(&db),

        Commands::Export { output, all, project } => cmd_export(&db, output, all, project),

        Commands::Backup => cmd_backup(&db_path),

        Commands::Completions { shell } => cmd_completions(shell),
    }
}
