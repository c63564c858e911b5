//! Enumerations and field types for task planning.
//!
//! This module defines the structured data types used to categorise tasks and
//! their dependency links: status values, the four standard dependency kinds,
//! and the sort/filter options used by the list command.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task progress status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[serde(alias = "NotStarted")]
    NotStarted,
    #[serde(alias = "InProgress")]
    InProgress,
    #[serde(alias = "Completed")]
    Completed,
    #[serde(alias = "OnHold")]
    OnHold,
    #[serde(alias = "Cancelled")]
    Cancelled,
    #[serde(alias = "Blocked")]
    Blocked,
}

/// The four standard scheduling dependency kinds.
///
/// A closed enum rather than a free-form string: an edge with an invalid kind
/// cannot be constructed, and an unrecognised kind in a stored file is a
/// deserialization error rather than a silent no-op.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Finish-to-Start: successor starts after the predecessor finishes.
    #[serde(rename = "FS", alias = "fs")]
    #[value(name = "fs")]
    FinishToStart,
    /// Start-to-Start: successor starts after the predecessor starts.
    #[serde(rename = "SS", alias = "ss")]
    #[value(name = "ss")]
    StartToStart,
    /// Finish-to-Finish: successor finishes after the predecessor finishes.
    #[serde(rename = "FF", alias = "ff")]
    #[value(name = "ff")]
    FinishToFinish,
    /// Start-to-Finish: successor finishes after the predecessor starts.
    #[serde(rename = "SF", alias = "sf")]
    #[value(name = "sf")]
    StartToFinish,
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    Start,
    End,
    Id,
    Status,
}

/// Filtering options for tasks based on start dates.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StartFilter {
    Today,
    ThisWeek,
    Overdue,
    None,
}
