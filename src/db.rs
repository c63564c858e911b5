//! Database operations and utility functions for task planning.
//!
//! This module provides the `Database` struct for storing and managing tasks,
//! along with utility functions for date parsing, formatting, dependency-spec
//! parsing, and hierarchical queries. The database is the "entity store" the
//! scheduling core deliberately knows nothing about: commands load it, hand
//! the task list to the scheduler as an immutable snapshot, and save the
//! result back.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::fields::*;
use crate::task::{DependencyEdge, Task};

/// In-memory database for storing and managing tasks.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    pub tasks: Vec<Task>,
}

impl Database {
    /// Load database from a JSON plan file.
    ///
    /// A missing file yields an empty database. A file that cannot be read
    /// or parsed is an error; commands save back after mutating, so a
    /// corrupt plan must never be "recovered" as an empty one.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Database::default());
        }
        let mut buf = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut buf))
            .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
        serde_json::from_str(&buf).map_err(|e| format!("Error parsing {}: {e}", path.display()))
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        // Atomic-ish write via temp + rename.
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let data = serde_json::to_string_pretty(self).unwrap();
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Generate the next available task ID.
    pub fn next_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        self.tasks.get_mut(idx)
    }

    /// Remove tasks by IDs, clearing parent references and dependency edges
    /// that point at removed tasks. Edges die with the task they reference.
    pub fn remove_ids(&mut self, ids: &HashSet<u64>) {
        self.tasks.retain(|t| !ids.contains(&t.id));
        let removed: BTreeSet<u64> = ids.iter().cloned().collect();
        for t in self.tasks.iter_mut() {
            if let Some(p) = t.parent {
                if removed.contains(&p) {
                    t.parent = None;
                }
            }
            t.predecessors.retain(|e| !removed.contains(&e.predecessor_id));
        }
    }

    /// Tasks sharing a project with the given task (or project-less tasks
    /// when the task has no project). This is the snapshot the scheduler sees.
    pub fn project_snapshot(&self, project: Option<&str>) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.project.as_deref() == project)
            .cloned()
            .collect()
    }
}

/// Parse a date input string.
///
/// Supports "today", "tomorrow", "in Nd"/"in Nw", and "YYYY-MM-DD".
pub fn parse_date_input(s: &str) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(today + Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Some(today + Duration::weeks(weeks));
            }
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Parse a dependency spec of the form `ID[:kind[:lag]]`.
///
/// Kind defaults to `fs`, lag to 0. Examples: `12`, `12:ss`, `12:fs:3`,
/// `12:ss:-2`.
pub fn parse_edge_spec(s: &str) -> Result<DependencyEdge, String> {
    let mut parts = s.trim().splitn(3, ':');
    let id_part = parts.next().unwrap_or_default();
    let id: u64 = id_part
        .trim()
        .parse()
        .map_err(|_| format!("invalid task ID '{}' in dependency spec '{}'", id_part, s))?;

    let kind = match parts.next() {
        None => DependencyKind::FinishToStart,
        Some(k) => match k.trim().to_lowercase().as_str() {
            "fs" => DependencyKind::FinishToStart,
            "ss" => DependencyKind::StartToStart,
            "ff" => DependencyKind::FinishToFinish,
            "sf" => DependencyKind::StartToFinish,
            other => {
                return Err(format!(
                    "invalid dependency kind '{}' in '{}' (expected fs, ss, ff or sf)",
                    other, s
                ))
            }
        },
    };

    let lag = match parts.next() {
        None => 0,
        Some(l) => l
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("invalid lag '{}' in dependency spec '{}'", l, s))?,
    };

    Ok(DependencyEdge::new(id, kind, lag))
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    // ISO week: Monday start.
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    let end = start + Duration::days(6);
    (start, end)
}

/// Format a date relative to today ("today", "tomorrow", "in 3d", "2d ago").
pub fn format_date_relative(date: Option<NaiveDate>, today: NaiveDate) -> String {
    match date {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            if delta == 0 {
                "today".into()
            } else if delta == 1 {
                "tomorrow".into()
            } else if delta > 1 {
                format!("in {delta}d")
            } else {
                format!("{}d ago", -delta)
            }
        }
    }
}

/// Format a task status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::NotStarted => "NotStarted",
        Status::InProgress => "InProgress",
        Status::Completed => "Completed",
        Status::OnHold => "OnHold",
        Status::Cancelled => "Cancelled",
        Status::Blocked => "Blocked",
    }
}

/// Short label for a dependency kind.
pub fn format_kind(k: DependencyKind) -> &'static str {
    match k {
        DependencyKind::FinishToStart => "FS",
        DependencyKind::StartToStart => "SS",
        DependencyKind::FinishToFinish => "FF",
        DependencyKind::StartToFinish => "SF",
    }
}

/// Compact display form of one edge, e.g. `14 FS+2`, `7 SS-3`, `9 FF`.
pub fn format_edge(e: &DependencyEdge) -> String {
    if e.lag_days == 0 {
        format!("{} {}", e.predecessor_id, format_kind(e.kind))
    } else {
        format!("{} {}{:+}", e.predecessor_id, format_kind(e.kind), e.lag_days)
    }
}

/// Whether a status counts as closed for default list filtering.
pub fn is_closed(s: Status) -> bool {
    matches!(s, Status::Completed | Status::Cancelled)
}

/// Print tasks in a formatted table with optional tree indentation.
pub fn print_table(tasks: &[&Task], id_to_depth: Option<&HashMap<u64, usize>>) {
    // Header.
    println!(
        "{:<5} {:<11} {:<11} {:<11} {:>4} {:<18} {:<12} {}",
        "ID", "Status", "Start", "End", "Dur", "Deps", "Project", "Title"
    );
    for t in tasks {
        let indent = id_to_depth
            .and_then(|m| m.get(&t.id).copied())
            .unwrap_or(0);
        let indent_str = "  ".repeat(indent);
        let start = t.start_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        let end = t.end_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        let dur = t
            .effective_duration()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into());
        let deps = if t.predecessors.is_empty() {
            "-".to_string()
        } else {
            t.predecessors.iter().map(format_edge).collect::<Vec<_>>().join(",")
        };
        let project = t.project.clone().unwrap_or_else(|| "-".into());
        println!(
            "{:<5} {:<11} {:<11} {:<11} {:>4} {:<18} {:<12} {}{}",
            t.id,
            format_status(t.status),
            start,
            end,
            dur,
            truncate(&deps, 18),
            truncate(&project, 12),
            indent_str,
            t.title,
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Build a map of parent task IDs to their children's IDs.
pub fn build_children_map(tasks: &[Task]) -> BTreeMap<u64, Vec<u64>> {
    let mut map: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
    for t in tasks {
        if let Some(p) = t.parent {
            map.entry(p).or_default().push(t.id);
        }
    }
    for v in map.values_mut() {
        v.sort_unstable();
    }
    map
}

/// Recursively collect all descendant task IDs from a root task.
pub fn collect_descendants(root: u64, child_map: &BTreeMap<u64, Vec<u64>>, out: &mut HashSet<u64>) {
    if let Some(children) = child_map.get(&root) {
        for &c in children {
            if out.insert(c) {
                collect_descendants(c, child_map, out);
            }
        }
    }
}

/// Resolve a task identifier (either ID or title) to a task ID.
/// Returns an error if the title has multiple matches and suggests using ID instead.
pub fn resolve_task_identifier(identifier: &str, db: &Database) -> Result<u64, String> {
    // Try parsing as ID first
    if let Ok(id) = identifier.parse::<u64>() {
        if db.get(id).is_some() {
            return Ok(id);
        } else {
            return Err(format!("Task with ID {} not found", id));
        }
    }

    // Search by title (case-insensitive)
    let matches: Vec<&Task> = db
        .tasks
        .iter()
        .filter(|task| task.title.to_lowercase() == identifier.to_lowercase())
        .collect();

    match matches.len() {
        0 => Err(format!("No task found with title '{}'", identifier)),
        1 => Ok(matches[0].id),
        _ => {
            let mut error_msg = format!("Multiple tasks found with title '{}':\n", identifier);
            for task in matches {
                error_msg.push_str(&format!("  ID {}: {}", task.id, task.title));
                if let Some(ref project) = task.project {
                    error_msg.push_str(&format!(" [project: {}]", project));
                }
                error_msg.push('\n');
            }
            error_msg.push_str("Please use the specific ID instead.");
            Err(error_msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::DependencyKind::*;

    fn make_task(id: u64, project: Option<&str>) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            project: project.map(|p| p.to_string()),
            start_date: None,
            end_date: None,
            duration_days: None,
            predecessors: Vec::new(),
            status: Status::NotStarted,
            parent: None,
            notes: None,
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    #[test]
    fn test_parse_edge_spec() {
        assert_eq!(parse_edge_spec("12"), Ok(DependencyEdge::new(12, FinishToStart, 0)));
        assert_eq!(parse_edge_spec("12:ss"), Ok(DependencyEdge::new(12, StartToStart, 0)));
        assert_eq!(parse_edge_spec("12:FF:3"), Ok(DependencyEdge::new(12, FinishToFinish, 3)));
        assert_eq!(parse_edge_spec(" 4:sf:-2 "), Ok(DependencyEdge::new(4, StartToFinish, -2)));
        assert!(parse_edge_spec("x:fs").is_err());
        assert!(parse_edge_spec("4:xx").is_err());
        assert!(parse_edge_spec("4:fs:two").is_err());
    }

    #[test]
    fn test_format_edge() {
        assert_eq!(format_edge(&DependencyEdge::new(14, FinishToStart, 2)), "14 FS+2");
        assert_eq!(format_edge(&DependencyEdge::new(7, StartToStart, -3)), "7 SS-3");
        assert_eq!(format_edge(&DependencyEdge::new(9, FinishToFinish, 0)), "9 FF");
    }

    #[test]
    fn test_remove_ids_strips_dangling_edges() {
        let mut db = Database::default();
        let mut a = make_task(1, None);
        let mut b = make_task(2, None);
        b.predecessors.push(DependencyEdge::new(1, FinishToStart, 0));
        b.parent = Some(1);
        a.predecessors.push(DependencyEdge::new(3, StartToStart, 0));
        db.tasks = vec![a, b, make_task(3, None)];

        let mut ids = HashSet::new();
        ids.insert(1);
        ids.insert(3);
        db.remove_ids(&ids);

        assert_eq!(db.tasks.len(), 1);
        let survivor = &db.tasks[0];
        assert_eq!(survivor.id, 2);
        assert!(survivor.predecessors.is_empty());
        assert_eq!(survivor.parent, None);
    }

    #[test]
    fn test_project_snapshot_scoping() {
        let mut db = Database::default();
        db.tasks = vec![
            make_task(1, Some("bridge")),
            make_task(2, Some("tower")),
            make_task(3, Some("bridge")),
            make_task(4, None),
        ];
        let snap: Vec<u64> = db.project_snapshot(Some("bridge")).iter().map(|t| t.id).collect();
        assert_eq!(snap, vec![1, 3]);
        let loose: Vec<u64> = db.project_snapshot(None).iter().map(|t| t.id).collect();
        assert_eq!(loose, vec![4]);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let mut db = Database::default();
        let mut t = make_task(1, Some("bridge"));
        t.start_date = parse_date_input("2024-05-01");
        t.duration_days = Some(10);
        t.predecessors.push(DependencyEdge::new(2, StartToStart, -1));
        db.tasks = vec![t, make_task(2, Some("bridge"))];
        db.save(&path).unwrap();

        let loaded = Database::load(&path).unwrap();
        assert_eq!(loaded.tasks.len(), 2);
        assert_eq!(loaded.tasks[0].predecessors[0], DependencyEdge::new(2, StartToStart, -1));
        assert_eq!(loaded.tasks[0].duration_days, Some(10));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::load(&dir.path().join("absent.json")).unwrap();
        assert!(db.tasks.is_empty());
    }

    #[test]
    fn test_load_rejects_malformed_edge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let mut db = Database::default();
        let mut t = make_task(1, Some("bridge"));
        t.predecessors.push(DependencyEdge::new(2, FinishToStart, 0));
        db.tasks = vec![t, make_task(2, Some("bridge"))];
        db.save(&path).unwrap();

        // Corrupt the edge kind in place, the way a hand edit would.
        let text = std::fs::read_to_string(&path).unwrap();
        let text = text.replace("\"FS\"", "\"XX\"");
        assert_ne!(text, std::fs::read_to_string(&path).unwrap());
        std::fs::write(&path, &text).unwrap();

        assert!(Database::load(&path).is_err());
        // The corrupt file stays on disk untouched for the user to repair.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
    }
}
