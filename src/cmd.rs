//! Command implementations for the CLI interface.
//!
//! This module contains all the command handlers, from basic CRUD operations
//! to the dependency-aware flows: every command that touches predecessor
//! edges validates the project graph for cycles before anything is saved, and
//! scheduling suggestions are computed locally from the same task snapshot.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use chrono::{Local, NaiveDate, TimeZone, Utc};

use crate::db::*;
use crate::fields::*;
use crate::schedule::{
    self, compute_earliest_start, set_duration, set_end_date, set_start_date, topological_order,
    DependencyGraph,
};
use crate::task::{DependencyEdge, Task};

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Project name.
        #[arg(long)]
        project: Option<String>,
        /// Start date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        start: Option<String>,
        /// End date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        end: Option<String>,
        /// Duration in calendar days.
        #[arg(long)]
        duration: Option<i64>,
        /// Predecessor spec: ID[:kind[:lag]], e.g. 12, 12:ss, 12:fs:3. May be repeated.
        #[arg(long = "after")]
        after: Vec<String>,
        /// Parent (summary) task ID or title.
        #[arg(long)]
        parent: Option<String>,
        /// Status.
        #[arg(long, value_enum, default_value_t = Status::NotStarted)]
        status: Status,
        /// Free-form notes.
        #[arg(long)]
        notes: Option<String>,
    },

    /// List tasks with optional filters.
    List {
        /// Include completed and cancelled tasks.
        #[arg(long)]
        all: bool,
        /// Filter by status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Filter by project.
        #[arg(long)]
        project: Option<String>,
        /// Start-date filter: today | this-week | overdue | none.
        #[arg(long, value_enum)]
        start: Option<StartFilter>,
        /// Render as a tree across parent-child relationships.
        #[arg(long)]
        tree: bool,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Start)]
        sort: SortKey,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task by ID or title, including its dependency links.
    View {
        /// Task ID or title to view
        id: String,
    },

    /// Update fields on a task.
    Update {
        /// Task ID or title to update
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        project: Option<String>,
        /// New start date; end date follows when duration is known.
        #[arg(long)]
        start: Option<String>,
        /// New end date; duration is re-derived from the start date.
        #[arg(long)]
        end: Option<String>,
        /// New duration in days; end date is re-derived from the start date.
        #[arg(long)]
        duration: Option<i64>,
        /// Parent (summary) task ID or title.
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long)]
        notes: Option<String>,
        /// Clear start date.
        #[arg(long)]
        clear_start: bool,
        /// Clear end date.
        #[arg(long)]
        clear_end: bool,
        /// Clear parent.
        #[arg(long)]
        clear_parent: bool,
    },

    /// Add or replace one dependency link on a task.
    Link {
        /// Successor task ID or title.
        id: String,
        /// Predecessor task ID or title.
        predecessor: String,
        /// Dependency kind.
        #[arg(long, value_enum, default_value_t = DependencyKind::FinishToStart)]
        kind: DependencyKind,
        /// Lag in days; negative allows overlap.
        #[arg(long, default_value_t = 0)]
        lag: i64,
    },

    /// Remove a dependency link from a task.
    Unlink {
        /// Successor task ID or title.
        id: String,
        /// Predecessor task ID or title.
        predecessor: String,
    },

    /// Pull task starts forward to their earliest feasible dates (forward
    /// pass); starts later than their dependency floor are kept.
    Schedule {
        /// Project to schedule; defaults to every project in the plan file.
        #[arg(long)]
        project: Option<String>,
        /// Print the changes without saving them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Mark a task completed.
    Complete {
        /// Task ID or title to complete
        id: String,
        /// Also mark all descendants completed.
        #[arg(long)]
        recurse: bool,
    },

    /// Reopen a task (status not-started).
    Reopen {
        /// Task ID or title to reopen
        id: String,
    },

    /// Delete a task by ID or title.
    Delete {
        /// Task ID or title to delete
        id: String,
        /// Cascade into all descendants.
        #[arg(long)]
        cascade: bool,
    },

    /// List distinct projects with task counts.
    Projects,

    /// Export tasks to CSV format.
    Export {
        /// Output file path (default: tasks.csv)
        #[arg(long, short)]
        output: Option<String>,
        /// Include completed and cancelled tasks
        #[arg(long)]
        all: bool,
        /// Filter by project
        #[arg(long)]
        project: Option<String>,
    },

    /// Create a timestamped backup of the current plan file.
    Backup,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Resolve a task identifier or exit with a message.
fn resolve_or_exit(identifier: &str, db: &Database) -> u64 {
    match resolve_task_identifier(identifier, db) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error resolving task: {}", e);
            std::process::exit(1);
        }
    }
}

fn parse_date_or_exit(s: &str) -> NaiveDate {
    match parse_date_input(s) {
        Some(d) => d,
        None => {
            eprintln!("Unrecognised date '{s}'. Use YYYY-MM-DD, 'today', 'tomorrow', or 'in Nd'.");
            std::process::exit(1);
        }
    }
}

fn save_or_exit(db: &Database, db_path: &Path) {
    if let Err(e) = db.save(db_path) {
        eprintln!("Failed to save DB: {e}");
        std::process::exit(1);
    }
}

/// Validate a proposed predecessor configuration against the project
/// snapshot before it is committed.
///
/// Dangling references are warnings (the predecessor may live outside this
/// plan file); a cycle blocks the save, printing the offending path.
fn validate_edges_or_exit(snapshot: &[Task], task_id: u64, edges: &[DependencyEdge]) {
    let graph = DependencyGraph::build(snapshot).with_proposed_edges(task_id, edges);
    for r in graph.unknown_references() {
        eprintln!(
            "Warning: task {} references unknown predecessor {}; it will be ignored for scheduling.",
            r.task_id, r.predecessor_id
        );
    }

    let outcome = schedule::validate_dependencies(snapshot, task_id, edges);
    if !outcome.valid {
        let path = outcome.circular_path.unwrap_or_default();
        let shown = path.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(" → ");
        eprintln!("Dependency cycle detected: {shown}");
        std::process::exit(1);
    }
}

/// Pair each edge with its predecessor task from the snapshot, dropping
/// edges whose predecessor is not present (already warned about).
fn resolve_predecessors<'a>(
    snapshot: &'a [Task],
    edges: &'a [DependencyEdge],
) -> Vec<(&'a Task, &'a DependencyEdge)> {
    edges
        .iter()
        .filter_map(|e| snapshot.iter().find(|t| t.id == e.predecessor_id).map(|t| (t, e)))
        .collect()
}

/// Pull the task's start date forward to the earliest feasible date under
/// its dependency constraints, if that is later than where it sits now.
fn apply_earliest_start(task: &mut Task, snapshot: &[Task]) {
    let edges = task.predecessors.clone();
    let resolved = resolve_predecessors(snapshot, &edges);
    if resolved.is_empty() {
        return;
    }
    match compute_earliest_start(task, &resolved) {
        Ok(Some(earliest)) => {
            if task.start_date.map_or(true, |cur| earliest > cur) {
                if let Err(e) = set_start_date(task, earliest) {
                    eprintln!("Scheduling failed: {e}");
                    std::process::exit(1);
                }
                println!("Scheduled task {} to start {}", task.id, earliest);
            }
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Scheduling failed: {e}");
            std::process::exit(1);
        }
    }
}

/// Replace-or-append edges: a new edge for a predecessor that already has
/// one replaces it, otherwise it is appended in input order.
fn merge_edges(existing: &[DependencyEdge], additions: &[DependencyEdge]) -> Vec<DependencyEdge> {
    let mut merged = existing.to_vec();
    for add in additions {
        match merged.iter_mut().find(|e| e.predecessor_id == add.predecessor_id) {
            Some(slot) => *slot = *add,
            None => merged.push(*add),
        }
    }
    merged
}

/// Add a new task to the database.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    db: &mut Database,
    db_path: &Path,
    title: String,
    project: Option<String>,
    start: Option<String>,
    end: Option<String>,
    duration: Option<i64>,
    after: Vec<String>,
    parent: Option<String>,
    status: Status,
    notes: Option<String>,
) {
    let now_utc = Utc::now().timestamp();
    let id = db.next_id();

    let mut edges: Vec<DependencyEdge> = Vec::new();
    for spec in &after {
        match parse_edge_spec(spec) {
            Ok(e) => edges = merge_edges(&edges, &[e]),
            Err(msg) => {
                eprintln!("Error: {msg}");
                std::process::exit(1);
            }
        }
    }

    let parent_id = parent.map(|p| {
        let pid = resolve_or_exit(&p, db);
        if pid == id {
            eprintln!("Parent cannot equal child.");
            std::process::exit(1);
        }
        pid
    });

    let project = project.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());

    let mut task = Task {
        id,
        title,
        project: project.clone(),
        start_date: None,
        end_date: None,
        duration_days: None,
        predecessors: edges.clone(),
        status,
        parent: parent_id,
        notes,
        created_at_utc: now_utc,
        updated_at_utc: now_utc,
    };

    // The triggering field determines which dependent field is derived, so
    // apply in a fixed order: start, then end, then duration.
    let apply = |res: Result<(), schedule::ScheduleError>| {
        if let Err(e) = res {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(s) = start.as_deref() {
        apply(set_start_date(&mut task, parse_date_or_exit(s)));
    }
    if let Some(s) = end.as_deref() {
        apply(set_end_date(&mut task, parse_date_or_exit(s)));
    }
    if let Some(d) = duration {
        apply(set_duration(&mut task, d));
    }

    if !edges.is_empty() {
        let snapshot = db.project_snapshot(project.as_deref());
        validate_edges_or_exit(&snapshot, id, &edges);
        apply_earliest_start(&mut task, &snapshot);
    }

    db.tasks.push(task);
    save_or_exit(db, db_path);
    println!("Added task {}", id);
}

/// List tasks with optional filtering and sorting.
pub fn cmd_list(
    db: &Database,
    all: bool,
    status: Option<Status>,
    project: Option<String>,
    start: Option<StartFilter>,
    tree: bool,
    sort: SortKey,
    limit: Option<usize>,
) {
    let today = Local::now().date_naive();
    let (week_start, week_end) = start_end_of_this_week(today);

    let mut filtered: Vec<&Task> = db
        .tasks
        .iter()
        .filter(|t| {
            if !all && is_closed(t.status) {
                return false;
            }
            if let Some(s) = status {
                if t.status != s {
                    return false;
                }
            }
            if let Some(ref p) = project {
                if t.project.as_deref() != Some(p.as_str()) {
                    return false;
                }
            }
            if let Some(sf) = start {
                match sf {
                    StartFilter::Today => {
                        if t.start_date != Some(today) {
                            return false;
                        }
                    }
                    StartFilter::ThisWeek => {
                        if let Some(d) = t.start_date {
                            if d < week_start || d > week_end {
                                return false;
                            }
                        } else {
                            return false;
                        }
                    }
                    StartFilter::Overdue => {
                        // Not started yet but its planned start has passed.
                        if t.status != Status::NotStarted {
                            return false;
                        }
                        if let Some(d) = t.start_date {
                            if d >= today {
                                return false;
                            }
                        } else {
                            return false;
                        }
                    }
                    StartFilter::None => {
                        if t.start_date.is_some() {
                            return false;
                        }
                    }
                }
            }
            true
        })
        .collect();

    match sort {
        SortKey::Start => {
            filtered.sort_by_key(|t| (t.start_date.unwrap_or(NaiveDate::MAX), t.id))
        }
        SortKey::End => filtered.sort_by_key(|t| (t.end_date.unwrap_or(NaiveDate::MAX), t.id)),
        SortKey::Id => filtered.sort_by_key(|t| t.id),
        SortKey::Status => {
            filtered.sort_by_key(|t| (t.status as u8, t.start_date.unwrap_or(NaiveDate::MAX), t.id))
        }
    }

    if let Some(n) = limit {
        filtered.truncate(n);
    }

    if tree {
        // Compute depths for indentation using ancestry in the full DB.
        let mut depth_map: HashMap<u64, usize> = HashMap::new();
        for t in &db.tasks {
            let mut depth = 0usize;
            let mut cur = t.parent;
            while let Some(pid) = cur {
                depth += 1;
                cur = db.get(pid).and_then(|p| p.parent);
                if depth > 64 {
                    break; // cycle guard
                }
            }
            depth_map.insert(t.id, depth);
        }
        print_table(&filtered, Some(&depth_map));
    } else {
        print_table(&filtered, None);
    }
}

/// View detailed information about a specific task, including its
/// predecessor links and the tasks that depend on it.
pub fn cmd_view(db: &Database, id: String) {
    let task_id = resolve_or_exit(&id, db);
    let Some(task) = db.get(task_id).cloned() else {
        eprintln!("Task {} not found.", task_id);
        std::process::exit(1);
    };
    let today = Local::now().date_naive();

    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Status:       {}", format_status(task.status));
    println!("Project:      {}", task.project.clone().unwrap_or_else(|| "-".into()));
    println!(
        "Start:        {}",
        match task.start_date {
            Some(d) => format!("{d} ({})", format_date_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    println!(
        "End:          {}",
        match task.end_date {
            Some(d) => format!("{d} ({})", format_date_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    println!(
        "Duration:     {}",
        task.effective_duration().map(|d| format!("{d}d")).unwrap_or_else(|| "-".into())
    );
    println!("Parent:       {}", task.parent.map(|p| p.to_string()).unwrap_or_else(|| "-".into()));
    println!("Created UTC:  {}", Utc.timestamp_opt(task.created_at_utc, 0).single().unwrap().to_rfc3339());
    println!("Updated UTC:  {}", Utc.timestamp_opt(task.updated_at_utc, 0).single().unwrap().to_rfc3339());
    println!("Notes:        {}", task.notes.clone().unwrap_or_else(|| "-".into()));

    println!("Predecessors:");
    if task.predecessors.is_empty() {
        println!("  -");
    } else {
        for e in &task.predecessors {
            let title = db
                .get(e.predecessor_id)
                .map(|p| p.title.clone())
                .unwrap_or_else(|| "<unknown>".into());
            println!("  {} ({})", format_edge(e), title);
        }
    }

    let dependents: Vec<&Task> = db
        .tasks
        .iter()
        .filter(|t| t.predecessors.iter().any(|e| e.predecessor_id == task_id))
        .collect();
    println!("Dependents:");
    if dependents.is_empty() {
        println!("  -");
    } else {
        for d in dependents {
            println!("  {} {}", d.id, d.title);
        }
    }
}

/// Update an existing task's fields.
#[allow(clippy::too_many_arguments)]
pub fn cmd_update(
    db: &mut Database,
    db_path: &Path,
    id: String,
    title: Option<String>,
    project: Option<String>,
    start: Option<String>,
    end: Option<String>,
    duration: Option<i64>,
    parent: Option<String>,
    status: Option<Status>,
    notes: Option<String>,
    clear_start: bool,
    clear_end: bool,
    clear_parent: bool,
) {
    let task_id = resolve_or_exit(&id, db);

    let parent_id = parent.map(|p| resolve_or_exit(&p, db));
    if let Some(pid) = parent_id {
        if pid == task_id {
            eprintln!("Parent cannot equal child.");
            std::process::exit(1);
        }
        // Guard against parent chains looping back.
        let mut cur = Some(pid);
        let mut hops = 0;
        while let Some(p) = cur {
            if p == task_id {
                eprintln!("Setting parent would create a cycle.");
                std::process::exit(1);
            }
            cur = db.get(p).and_then(|x| x.parent);
            hops += 1;
            if hops > 64 {
                break;
            }
        }
    }

    let start = start.as_deref().map(parse_date_or_exit);
    let end = end.as_deref().map(parse_date_or_exit);

    let Some(t) = db.get_mut(task_id) else {
        eprintln!("Task {} not found.", task_id);
        std::process::exit(1);
    };
    if let Some(s) = title {
        t.title = s;
    }
    if let Some(p) = project {
        t.project = if p.trim().is_empty() { None } else { Some(p.trim().to_string()) };
    }
    if clear_start {
        t.start_date = None;
        t.duration_days = None;
    }
    if clear_end {
        t.end_date = None;
        t.duration_days = None;
    }
    // One derivation per triggering field; see the schedule::dates sync rules.
    let apply = |res: Result<(), schedule::ScheduleError>| {
        if let Err(e) = res {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(d) = start {
        apply(set_start_date(t, d));
    }
    if let Some(d) = end {
        apply(set_end_date(t, d));
    }
    if let Some(d) = duration {
        apply(set_duration(t, d));
    }
    if clear_parent {
        t.parent = None;
    }
    if let Some(pid) = parent_id {
        t.parent = Some(pid);
    }
    if let Some(s) = status {
        t.status = s;
    }
    if let Some(n) = notes {
        t.notes = if n.is_empty() { None } else { Some(n) };
    }
    t.updated_at_utc = Utc::now().timestamp();

    save_or_exit(db, db_path);
    println!("Updated task {}", task_id);
}

/// Add or replace one dependency link, validating the project graph first
/// and pulling the successor's dates forward if the new constraint demands.
pub fn cmd_link(
    db: &mut Database,
    db_path: &Path,
    id: String,
    predecessor: String,
    kind: DependencyKind,
    lag: i64,
) {
    let task_id = resolve_or_exit(&id, db);
    let pred_id = resolve_or_exit(&predecessor, db);

    let Some(task) = db.get(task_id) else {
        eprintln!("Task {} not found.", task_id);
        std::process::exit(1);
    };
    let project = task.project.clone();
    let edge = DependencyEdge::new(pred_id, kind, lag);
    let proposed = merge_edges(&task.predecessors, &[edge]);

    let snapshot = db.project_snapshot(project.as_deref());
    validate_edges_or_exit(&snapshot, task_id, &proposed);

    let t = db.get_mut(task_id).unwrap();
    t.predecessors = proposed;
    t.updated_at_utc = Utc::now().timestamp();
    let mut updated = t.clone();
    apply_earliest_start(&mut updated, &snapshot);
    *db.get_mut(task_id).unwrap() = updated;

    save_or_exit(db, db_path);
    println!("Linked task {} after {} ({})", task_id, pred_id, format_edge(&edge));
}

/// Remove a dependency link from a task.
pub fn cmd_unlink(db: &mut Database, db_path: &Path, id: String, predecessor: String) {
    let task_id = resolve_or_exit(&id, db);
    let pred_id = resolve_or_exit(&predecessor, db);

    let Some(t) = db.get_mut(task_id) else {
        eprintln!("Task {} not found.", task_id);
        std::process::exit(1);
    };
    let before = t.predecessors.len();
    t.predecessors.retain(|e| e.predecessor_id != pred_id);
    if t.predecessors.len() == before {
        eprintln!("Task {} has no dependency on {}.", task_id, pred_id);
        std::process::exit(1);
    }
    t.updated_at_utc = Utc::now().timestamp();

    save_or_exit(db, db_path);
    println!("Unlinked task {} from {}", task_id, pred_id);
}

/// Forward pass over each project: walk the dependency graph in topological
/// order and pull each task's start forward to its earliest feasible date.
/// A start already at or past its floor is left where the user put it,
/// matching how `add` and `link` apply constraints.
pub fn cmd_schedule(db: &mut Database, db_path: &Path, project: Option<String>, dry_run: bool) {
    let scopes: Vec<Option<String>> = match project {
        Some(p) => vec![Some(p)],
        None => {
            let mut seen: Vec<Option<String>> = Vec::new();
            for t in &db.tasks {
                if !seen.contains(&t.project) {
                    seen.push(t.project.clone());
                }
            }
            seen
        }
    };

    let mut moved = 0usize;
    for scope in scopes {
        let snapshot = db.project_snapshot(scope.as_deref());
        if snapshot.is_empty() {
            continue;
        }
        let graph = DependencyGraph::build(&snapshot);
        for r in graph.unknown_references() {
            eprintln!(
                "Warning: task {} references unknown predecessor {}; it will be ignored for scheduling.",
                r.task_id, r.predecessor_id
            );
        }
        let order = match topological_order(&graph) {
            Ok(order) => order,
            Err(path) => {
                let shown =
                    path.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(" → ");
                eprintln!("Cannot schedule: dependency cycle {shown}");
                std::process::exit(1);
            }
        };

        // Working copies keyed by id, updated as the pass advances so each
        // task sees its predecessors' recomputed dates.
        let mut working: HashMap<u64, Task> =
            snapshot.iter().map(|t| (t.id, t.clone())).collect();

        for id in order {
            let Some(task) = working.get(&id).cloned() else {
                continue; // dangling predecessor id, not a real task
            };
            if task.predecessors.is_empty() {
                continue;
            }
            let preds: Vec<(Task, DependencyEdge)> = task
                .predecessors
                .iter()
                .filter_map(|e| working.get(&e.predecessor_id).map(|p| (p.clone(), *e)))
                .collect();
            let resolved: Vec<(&Task, &DependencyEdge)> =
                preds.iter().map(|(t, e)| (t, e)).collect();

            let mut updated = task.clone();
            match compute_earliest_start(&updated, &resolved) {
                Ok(Some(earliest)) if task.start_date.map_or(true, |cur| earliest > cur) => {
                    if let Err(e) = set_start_date(&mut updated, earliest) {
                        eprintln!("Scheduling failed for task {id}: {e}");
                        std::process::exit(1);
                    }
                    if dry_run {
                        println!(
                            "Would move task {} start {} -> {}",
                            id,
                            task.start_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
                            earliest
                        );
                    } else {
                        println!(
                            "Moved task {} start {} -> {}",
                            id,
                            task.start_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
                            earliest
                        );
                    }
                    moved += 1;
                    working.insert(id, updated);
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Scheduling failed for task {id}: {e}");
                    std::process::exit(1);
                }
            }
        }

        if !dry_run {
            let now = Utc::now().timestamp();
            for (id, w) in working {
                if let Some(t) = db.get_mut(id) {
                    if t.start_date != w.start_date
                        || t.end_date != w.end_date
                        || t.duration_days != w.duration_days
                    {
                        t.start_date = w.start_date;
                        t.end_date = w.end_date;
                        t.duration_days = w.duration_days;
                        t.updated_at_utc = now;
                    }
                }
            }
        }
    }

    if dry_run {
        println!("{moved} task(s) would move. Nothing saved.");
    } else {
        save_or_exit(db, db_path);
        println!("Schedule pass complete: {moved} task(s) moved.");
    }
}

/// Mark a task as completed, optionally completing all descendants.
pub fn cmd_complete(db: &mut Database, db_path: &Path, id: String, recurse: bool) {
    let task_id = resolve_or_exit(&id, db);
    if db.get(task_id).is_none() {
        eprintln!("Task {} not found.", task_id);
        std::process::exit(1);
    }

    let mut to_mark: HashSet<u64> = HashSet::new();
    to_mark.insert(task_id);
    if recurse {
        let child_map = build_children_map(&db.tasks);
        collect_descendants(task_id, &child_map, &mut to_mark);
    }
    for tid in to_mark {
        if let Some(t) = db.get_mut(tid) {
            t.status = Status::Completed;
            t.updated_at_utc = Utc::now().timestamp();
        }
    }
    save_or_exit(db, db_path);
    println!("Marked completed.");
}

/// Reopen a task by setting its status back to not-started.
pub fn cmd_reopen(db: &mut Database, db_path: &Path, id: String) {
    let task_id = resolve_or_exit(&id, db);
    let Some(t) = db.get_mut(task_id) else {
        eprintln!("Task {} not found.", task_id);
        std::process::exit(1);
    };
    t.status = Status::NotStarted;
    t.updated_at_utc = Utc::now().timestamp();
    save_or_exit(db, db_path);
    println!("Reopened {}", task_id);
}

/// Delete a task, optionally cascading to all descendants. Dependency edges
/// pointing at deleted tasks are stripped from every surviving task.
pub fn cmd_delete(db: &mut Database, db_path: &Path, id: String, cascade: bool) {
    let task_id = resolve_or_exit(&id, db);
    if db.get(task_id).is_none() {
        eprintln!("Task {} not found.", task_id);
        std::process::exit(1);
    }

    let child_map = build_children_map(&db.tasks);
    let mut children: HashSet<u64> = HashSet::new();
    collect_descendants(task_id, &child_map, &mut children);
    if !children.is_empty() && !cascade {
        eprintln!("Task {} has {} descendant(s). Use --cascade to delete all.", task_id, children.len());
        std::process::exit(1);
    }
    let mut to_delete = children;
    to_delete.insert(task_id);

    db.remove_ids(&to_delete);
    save_or_exit(db, db_path);
    println!("Deleted.");
}

/// List all distinct project names in the database.
pub fn cmd_projects(db: &Database) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for t in &db.tasks {
        let key = t.project.clone().unwrap_or_else(|| "-".into());
        *counts.entry(key).or_default() += 1;
    }
    println!("{:<16} {}", "Project", "Count");
    for (p, c) in counts {
        println!("{:<16} {}", truncate(&p, 16), c);
    }
}

/// Export tasks to CSV format for external reporting.
pub fn cmd_export(db: &Database, output: Option<String>, all: bool, project: Option<String>) {
    let output_path = output.unwrap_or_else(|| "tasks.csv".to_string());

    let tasks: Vec<&Task> = db
        .tasks
        .iter()
        .filter(|task| {
            if !all && is_closed(task.status) {
                return false;
            }
            if let Some(ref proj_filter) = project {
                if task.project.as_ref() != Some(proj_filter) {
                    return false;
                }
            }
            true
        })
        .collect();

    let mut csv_content = String::new();
    csv_content.push_str(
        "ID,Title,Status,Project,Start,End,DurationDays,Predecessors,Parent,CreatedUTC,UpdatedUTC,Notes\n",
    );

    // Escape CSV fields that contain commas or quotes.
    let escape_csv = |s: &str| {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    };

    let task_count = tasks.len();
    for task in &tasks {
        let project = task.project.as_deref().unwrap_or("-");
        let start = task.start_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        let end = task.end_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        let dur = task
            .effective_duration()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into());
        let preds = if task.predecessors.is_empty() {
            "-".to_string()
        } else {
            task.predecessors.iter().map(format_edge).collect::<Vec<_>>().join(";")
        };
        let parent = task.parent.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
        let created = Utc.timestamp_opt(task.created_at_utc, 0).single().unwrap().to_rfc3339();
        let updated = Utc.timestamp_opt(task.updated_at_utc, 0).single().unwrap().to_rfc3339();
        let notes = task.notes.as_deref().unwrap_or("-");

        csv_content.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{}\n",
            task.id,
            escape_csv(&task.title),
            format_status(task.status),
            escape_csv(project),
            start,
            end,
            dur,
            escape_csv(&preds),
            parent,
            created,
            updated,
            escape_csv(notes),
        ));
    }

    if let Err(e) = std::fs::write(&output_path, csv_content) {
        eprintln!("Failed to write CSV file: {e}");
        std::process::exit(1);
    }
    println!("Exported {} task(s) to {}", task_count, output_path);
}

/// Create a timestamped backup copy of the plan file.
pub fn cmd_backup(db_path: &Path) {
    if !db_path.exists() {
        eprintln!("No plan file at {} to back up.", db_path.display());
        std::process::exit(1);
    }
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let stem = db_path.file_stem().and_then(|s| s.to_str()).unwrap_or("plan");
    let backup_path = db_path.with_file_name(format!("{stem}_backup_{stamp}.json"));
    if let Err(e) = std::fs::copy(db_path, &backup_path) {
        eprintln!("Backup failed: {e}");
        std::process::exit(1);
    }
    println!("Backed up to {}", backup_path.display());
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;

    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
