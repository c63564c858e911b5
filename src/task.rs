//! Task data structure and dependency edges.
//!
//! This module defines the core `Task` struct representing one schedulable
//! work item, and the `DependencyEdge` links that tie it to its predecessors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// A directed link from a predecessor task to the task that owns this edge.
///
/// `lag_days` is signed: positive delays the successor beyond the point the
/// constraint is satisfied, negative allows overlap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyEdge {
    pub predecessor_id: u64,
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    #[serde(default)]
    pub lag_days: i64,
}

impl DependencyEdge {
    pub fn new(predecessor_id: u64, kind: DependencyKind, lag_days: i64) -> Self {
        DependencyEdge { predecessor_id, kind, lag_days }
    }
}

/// A schedulable work item with calendar dates and dependency links.
///
/// Tasks form a directed graph per project through their `predecessors`
/// lists. A task whose `parent` is set belongs to a summary task; summary
/// date aggregation is left to consumers. `start_date`, `end_date` and
/// `duration_days` are kept in sync: the field the user changed determines
/// which of the other two is derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub project: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration_days: Option<i64>,
    #[serde(default, alias = "predecessor_configs")]
    pub predecessors: Vec<DependencyEdge>,
    pub status: Status,
    pub parent: Option<u64>,
    pub notes: Option<String>,
    pub created_at_utc: i64,
    pub updated_at_utc: i64,
}

impl Task {
    /// Duration in calendar days, taking the explicit field first and
    /// falling back to the date difference when both dates are present.
    pub fn effective_duration(&self) -> Option<i64> {
        if let Some(d) = self.duration_days {
            return Some(d);
        }
        match (self.start_date, self.end_date) {
            (Some(s), Some(e)) => Some((e - s).num_days()),
            _ => None,
        }
    }
}
