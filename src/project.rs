//! Project discovery and per-project plan files.
//!
//! Each project is stored as its own JSON plan file under the bp directory
//! with the naming convention `<project_name>_plan.json`. This module handles
//! discovery, naming, and creation of those files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::db::Database;

/// Represents a project with its name and plan file path.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub display_name: String,
    pub file_path: PathBuf,
}

impl Project {
    /// Create a new project with the given display name.
    pub fn new(display_name: &str, bp_dir: &Path) -> Self {
        let name = sanitize_project_name(display_name);
        let file_path = bp_dir.join(format!("{}_plan.json", name));

        Project {
            name,
            display_name: display_name.to_string(),
            file_path,
        }
    }

    /// Load a project from an existing plan file.
    pub fn from_file(file_path: PathBuf) -> Option<Self> {
        let file_name = file_path.file_stem()?.to_str()?;
        let name = file_name.strip_suffix("_plan")?;
        let display_name = name.replace('_', " ");

        Some(Project {
            name: name.to_string(),
            display_name,
            file_path,
        })
    }

    /// Create the plan file for this project if it doesn't exist.
    pub fn create_if_not_exists(&self) -> Result<(), std::io::Error> {
        if !self.file_path.exists() {
            let db = Database::default();
            db.save(&self.file_path)?;
        }
        Ok(())
    }
}

/// Convert a display name to a safe project name for file naming.
/// Lowercases and collapses anything non-alphanumeric to underscores.
pub fn sanitize_project_name(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Discover all existing projects in the bp directory.
pub fn discover_projects(bp_dir: &Path) -> Result<Vec<Project>, std::io::Error> {
    let mut projects = Vec::new();

    if !bp_dir.exists() {
        return Ok(projects);
    }

    for entry in fs::read_dir(bp_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() {
            if let Some(project) = Project::from_file(path) {
                projects.push(project);
            }
        }
    }

    projects.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(projects)
}

/// Find the most recently modified project in the bp directory.
pub fn get_most_recent_project(bp_dir: &Path) -> Result<Option<Project>, std::io::Error> {
    let projects = discover_projects(bp_dir)?;
    if projects.is_empty() {
        return Ok(None);
    }

    let mut most_recent: Option<(Project, std::time::SystemTime)> = None;
    for project in projects {
        if let Ok(metadata) = fs::metadata(&project.file_path) {
            if let Ok(modified) = metadata.modified() {
                match most_recent {
                    None => most_recent = Some((project, modified)),
                    Some((_, current_time)) => {
                        if modified > current_time {
                            most_recent = Some((project, modified));
                        }
                    }
                }
            }
        }
    }

    Ok(most_recent.map(|(project, _)| project))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_project_name() {
        assert_eq!(sanitize_project_name("Harbour Bridge"), "harbour_bridge");
        assert_eq!(sanitize_project_name("Site-42_North"), "site_42_north");
        assert_eq!(sanitize_project_name("  Multiple   Spaces  "), "multiple_spaces");
        assert_eq!(sanitize_project_name(""), "");
    }

    #[test]
    fn test_from_file_requires_plan_suffix() {
        assert!(Project::from_file(PathBuf::from("/tmp/bridge_plan.json")).is_some());
        assert!(Project::from_file(PathBuf::from("/tmp/bridge.json")).is_none());
    }

    #[test]
    fn test_discover_projects() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Tower", "Annex B"] {
            Project::new(name, dir.path()).create_if_not_exists().unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let projects = discover_projects(dir.path()).unwrap();
        let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["annex_b", "tower"]);
    }
}
