//! Dependency-aware scheduling core.
//!
//! Pure, synchronous functions over an in-memory snapshot of one project's
//! tasks: build the dependency graph, check it for cycles before a save, and
//! compute earliest feasible dates under FS/SS/FF/SF constraints with lag.
//! Nothing here performs I/O or holds state across calls: the graph is
//! rebuilt from the task list on every pass, and callers hand in a consistent
//! snapshot for the duration of one validation + scheduling run.
//!
//! Failure policy: a cyclic graph and a dangling predecessor reference are
//! normal outcomes reported as values ([`ValidationOutcome`],
//! [`graph::UnknownReference`]); only genuinely corrupt input (a predecessor
//! that was never scheduled, calendar overflow, a negative duration) is a
//! [`ScheduleError`].

pub mod cycle;
pub mod datemath;
pub mod dates;
pub mod graph;

use chrono::NaiveDate;
use thiserror::Error;

pub use cycle::{find_cycle, topological_order};
pub use dates::{compute_earliest_start, set_duration, set_end_date, set_start_date};
pub use graph::{DependencyGraph, UnknownReference};

use crate::task::{DependencyEdge, Task};

/// Hard failures from scheduling arithmetic. Cycles are not errors; see
/// [`ValidationOutcome`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// An edge needs a date its predecessor does not have. Predecessors are
    /// required to be scheduled before their successors are computed.
    #[error("task {task} depends on task {predecessor}, which has no {needs} date")]
    UnscheduledPredecessor {
        task: u64,
        predecessor: u64,
        needs: &'static str,
    },

    /// A lag or duration offset left chrono's representable date range.
    #[error("date arithmetic overflow applying an offset of {days} days")]
    DateOverflow { days: i64 },

    /// An end date earlier than the start date it is paired with.
    #[error("end date {end} precedes start date {start}")]
    NegativeDuration { start: NaiveDate, end: NaiveDate },

    #[error("duration must be >= 0 days (got {0})")]
    InvalidDuration(i64),
}

/// Result of validating a proposed set of predecessor edges for one task.
///
/// Mirrors the request/response contract a remote validator would return:
/// `valid` is false exactly when `circular_path` holds the offending cycle
/// (first node repeated at the end), ready to be joined with " → " for
/// display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub circular_path: Option<Vec<u64>>,
}

/// Check whether replacing `task_id`'s predecessors with `proposed` keeps the
/// project graph acyclic.
///
/// Builds the graph from the snapshot, applies the proposed edges to a copy,
/// and runs cycle detection; the persisted data is never touched. Runs
/// locally and synchronously; there is no remote round-trip to a validation
/// service.
pub fn validate_dependencies(
    tasks: &[Task],
    task_id: u64,
    proposed: &[DependencyEdge],
) -> ValidationOutcome {
    let graph = DependencyGraph::build(tasks).with_proposed_edges(task_id, proposed);
    match find_cycle(&graph) {
        Some(path) => ValidationOutcome { valid: false, circular_path: Some(path) },
        None => ValidationOutcome { valid: true, circular_path: None },
    }
}

#[cfg(test)]
mod tests {
    use super::graph::tests::task;
    use super::*;
    use crate::fields::DependencyKind;

    const FS: DependencyKind = DependencyKind::FinishToStart;

    #[test]
    fn test_validate_accepts_acyclic_proposal() {
        let tasks = vec![task(1, &[]), task(2, &[])];
        let outcome = validate_dependencies(&tasks, 2, &[DependencyEdge::new(1, FS, 3)]);
        assert_eq!(outcome, ValidationOutcome { valid: true, circular_path: None });
    }

    #[test]
    fn test_validate_rejects_self_loop() {
        let tasks = vec![task(1, &[])];
        let outcome = validate_dependencies(&tasks, 1, &[DependencyEdge::new(1, FS, 0)]);
        assert!(!outcome.valid);
        assert_eq!(outcome.circular_path, Some(vec![1, 1]));
    }

    #[test]
    fn test_validate_rejects_transitive_cycle() {
        let tasks = vec![task(1, &[]), task(2, &[(1, FS, 0)]), task(3, &[(2, FS, 0)])];
        let outcome = validate_dependencies(&tasks, 1, &[DependencyEdge::new(3, FS, 0)]);
        assert!(!outcome.valid);
        let path = outcome.circular_path.unwrap();
        assert_eq!(path.first(), path.last());
        assert!(path.len() >= 3);
    }

    #[test]
    fn test_validate_leaves_snapshot_untouched() {
        let tasks = vec![task(1, &[]), task(2, &[(1, FS, 0)])];
        let before: Vec<_> = tasks.iter().map(|t| t.predecessors.clone()).collect();
        let _ = validate_dependencies(&tasks, 1, &[DependencyEdge::new(2, FS, 0)]);
        let after: Vec<_> = tasks.iter().map(|t| t.predecessors.clone()).collect();
        assert_eq!(before, after);
    }
}
