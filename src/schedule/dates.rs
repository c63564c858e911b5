//! Date scheduling: the forward-pass arithmetic for a single task.
//!
//! Given a task and its resolved predecessors (each already scheduled), the
//! scheduler derives one floor per edge and combines them with max, since the task
//! cannot start before *any* constraint allows. Processing a whole project in
//! topological order is the caller's job; this module computes one task at a
//! time by contract.

use chrono::NaiveDate;

use super::datemath::{add_days, days_between};
use super::ScheduleError;
use crate::fields::DependencyKind;
use crate::task::{DependencyEdge, Task};

/// A predecessor task paired with the edge that references it.
pub type ResolvedPredecessor<'a> = (&'a Task, &'a DependencyEdge);

/// Earliest feasible start for `task` under its dependency constraints.
///
/// Floors per edge kind (`P` = predecessor, `lag` in days):
/// - FS: start >= P.end + lag
/// - SS: start >= P.start + lag
/// - FF: end >= P.end + lag, a start floor only when duration is known
/// - SF: end >= P.start + lag, likewise
///
/// With no applicable constraint the task's own `start_date` is returned
/// unchanged (possibly `None`). A predecessor missing the date an edge needs
/// violates the "already scheduled" contract and is a hard error, as is a
/// lag that overflows the calendar.
pub fn compute_earliest_start(
    task: &Task,
    predecessors: &[ResolvedPredecessor<'_>],
) -> Result<Option<NaiveDate>, ScheduleError> {
    let duration = task.effective_duration();
    let mut floor: Option<NaiveDate> = None;

    for &(pred, edge) in predecessors {
        let candidate = start_floor(task.id, pred, edge, duration)?;
        if let Some(date) = candidate {
            floor = Some(match floor {
                Some(f) => f.max(date),
                None => date,
            });
        }
    }

    Ok(floor.or(task.start_date))
}

/// The start floor implied by one edge, or `None` when the edge only
/// constrains the end and the duration is unknown.
fn start_floor(
    task_id: u64,
    pred: &Task,
    edge: &DependencyEdge,
    duration: Option<i64>,
) -> Result<Option<NaiveDate>, ScheduleError> {
    let anchor = |date: Option<NaiveDate>, needs: &'static str| {
        date.ok_or(ScheduleError::UnscheduledPredecessor {
            task: task_id,
            predecessor: pred.id,
            needs,
        })
    };
    let offset =
        |date: NaiveDate, days: i64| add_days(date, days).ok_or(ScheduleError::DateOverflow { days });

    let floor = match edge.kind {
        DependencyKind::FinishToStart => {
            Some(offset(anchor(pred.end_date, "end")?, edge.lag_days)?)
        }
        DependencyKind::StartToStart => {
            Some(offset(anchor(pred.start_date, "start")?, edge.lag_days)?)
        }
        DependencyKind::FinishToFinish => match duration {
            Some(d) => Some(offset(anchor(pred.end_date, "end")?, edge.lag_days - d)?),
            None => None,
        },
        DependencyKind::StartToFinish => match duration {
            Some(d) => Some(offset(anchor(pred.start_date, "start")?, edge.lag_days - d)?),
            None => None,
        },
    };
    Ok(floor)
}

/// Set `start_date`, deriving exactly one dependent field: the end date when
/// the duration is known, otherwise the duration when the end date is known.
pub fn set_start_date(task: &mut Task, date: NaiveDate) -> Result<(), ScheduleError> {
    if let Some(d) = task.duration_days {
        task.end_date = Some(end_from(date, d)?);
    } else if let Some(end) = task.end_date {
        task.duration_days = Some(duration_from(date, end)?);
    }
    task.start_date = Some(date);
    Ok(())
}

/// Set `end_date`, deriving `duration_days` from the start date when present.
/// The start date is never moved by an end-date edit.
pub fn set_end_date(task: &mut Task, date: NaiveDate) -> Result<(), ScheduleError> {
    if let Some(start) = task.start_date {
        task.duration_days = Some(duration_from(start, date)?);
    }
    task.end_date = Some(date);
    Ok(())
}

/// Set `duration_days`, deriving `end_date` from the start date when present.
pub fn set_duration(task: &mut Task, days: i64) -> Result<(), ScheduleError> {
    if days < 0 {
        return Err(ScheduleError::InvalidDuration(days));
    }
    if let Some(start) = task.start_date {
        task.end_date = Some(end_from(start, days)?);
    }
    task.duration_days = Some(days);
    Ok(())
}

fn end_from(start: NaiveDate, duration: i64) -> Result<NaiveDate, ScheduleError> {
    add_days(start, duration).ok_or(ScheduleError::DateOverflow { days: duration })
}

fn duration_from(start: NaiveDate, end: NaiveDate) -> Result<i64, ScheduleError> {
    let d = days_between(start, end);
    if d < 0 {
        return Err(ScheduleError::NegativeDuration { start, end });
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::super::graph::tests::task;
    use super::*;
    use crate::fields::DependencyKind::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn scheduled(id: u64, start: &str, end: &str) -> Task {
        let mut t = task(id, &[]);
        t.start_date = Some(d(start));
        t.end_date = Some(d(end));
        t
    }

    #[test]
    fn test_no_predecessors_keeps_own_start() {
        let mut t = task(1, &[]);
        t.start_date = Some(d("2024-01-01"));
        assert_eq!(compute_earliest_start(&t, &[]), Ok(Some(d("2024-01-01"))));
    }

    #[test]
    fn test_fs_with_lag() {
        let pred = scheduled(1, "2024-01-05", "2024-01-10");
        let edge = DependencyEdge::new(1, FinishToStart, 2);
        let t = task(2, &[]);
        let got = compute_earliest_start(&t, &[(&pred, &edge)]).unwrap();
        assert_eq!(got, Some(d("2024-01-12")));
    }

    #[test]
    fn test_ss_with_negative_lag_overlap() {
        let pred = scheduled(1, "2024-02-01", "2024-02-20");
        let edge = DependencyEdge::new(1, StartToStart, -3);
        let t = task(2, &[]);
        let got = compute_earliest_start(&t, &[(&pred, &edge)]).unwrap();
        assert_eq!(got, Some(d("2024-01-29")));
    }

    #[test]
    fn test_ff_converts_end_floor_with_duration() {
        // end >= 2024-01-10 + 1; duration 4 gives a start floor of 2024-01-07.
        let pred = scheduled(1, "2024-01-02", "2024-01-10");
        let edge = DependencyEdge::new(1, FinishToFinish, 1);
        let mut t = task(2, &[]);
        t.duration_days = Some(4);
        let got = compute_earliest_start(&t, &[(&pred, &edge)]).unwrap();
        assert_eq!(got, Some(d("2024-01-07")));
    }

    #[test]
    fn test_sf_converts_end_floor_with_duration() {
        let pred = scheduled(1, "2024-03-10", "2024-03-20");
        let edge = DependencyEdge::new(1, StartToFinish, 5);
        let mut t = task(2, &[]);
        t.duration_days = Some(3);
        // end >= 2024-03-15, start >= 2024-03-12.
        let got = compute_earliest_start(&t, &[(&pred, &edge)]).unwrap();
        assert_eq!(got, Some(d("2024-03-12")));
    }

    #[test]
    fn test_end_only_constraint_without_duration_is_no_floor() {
        let pred = scheduled(1, "2024-01-02", "2024-01-10");
        let edge = DependencyEdge::new(1, FinishToFinish, 0);
        let t = task(2, &[]);
        assert_eq!(compute_earliest_start(&t, &[(&pred, &edge)]), Ok(None));
    }

    #[test]
    fn test_multiple_constraints_take_max() {
        // FS floor 2024-03-05 vs SS floor 2024-03-08: the later one wins.
        let p1 = scheduled(1, "2024-02-20", "2024-03-05");
        let p2 = scheduled(2, "2024-03-08", "2024-03-15");
        let e1 = DependencyEdge::new(1, FinishToStart, 0);
        let e2 = DependencyEdge::new(2, StartToStart, 0);
        let t = task(3, &[]);
        let got = compute_earliest_start(&t, &[(&p1, &e1), (&p2, &e2)]).unwrap();
        assert_eq!(got, Some(d("2024-03-08")));
    }

    #[test]
    fn test_monotonic_in_lag() {
        let pred = scheduled(1, "2024-01-01", "2024-01-08");
        let t = task(2, &[]);
        let mut last = None;
        for lag in -5..=5 {
            let edge = DependencyEdge::new(1, FinishToStart, lag);
            let got = compute_earliest_start(&t, &[(&pred, &edge)]).unwrap();
            if let (Some(prev), Some(cur)) = (last, got) {
                assert!(cur >= prev);
            }
            last = got;
        }
    }

    #[test]
    fn test_monotonic_in_predecessor_end() {
        let t = task(2, &[]);
        let edge = DependencyEdge::new(1, FinishToStart, 2);
        let mut last = None;
        for shift in 0..6 {
            let mut pred = scheduled(1, "2024-01-01", "2024-01-08");
            pred.end_date = add_days(d("2024-01-08"), shift);
            let got = compute_earliest_start(&t, &[(&pred, &edge)]).unwrap();
            if let (Some(prev), Some(cur)) = (last, got) {
                assert!(cur >= prev);
            }
            last = got;
        }
    }

    #[test]
    fn test_unscheduled_predecessor_is_hard_error() {
        let pred = task(1, &[]);
        let edge = DependencyEdge::new(1, FinishToStart, 0);
        let t = task(2, &[]);
        assert_eq!(
            compute_earliest_start(&t, &[(&pred, &edge)]),
            Err(ScheduleError::UnscheduledPredecessor { task: 2, predecessor: 1, needs: "end" })
        );
    }

    #[test]
    fn test_lag_overflow_is_hard_error() {
        let pred = scheduled(1, "2024-01-01", "2024-01-02");
        let edge = DependencyEdge::new(1, FinishToStart, i64::MAX / 2);
        let t = task(2, &[]);
        assert!(matches!(
            compute_earliest_start(&t, &[(&pred, &edge)]),
            Err(ScheduleError::DateOverflow { .. })
        ));
    }

    #[test]
    fn test_duration_end_round_trip() {
        // end = start + D, then reading the duration back yields D.
        let mut t = task(1, &[]);
        t.start_date = Some(d("2024-06-01"));
        set_duration(&mut t, 9).unwrap();
        assert_eq!(t.end_date, Some(d("2024-06-10")));
        t.duration_days = None;
        set_end_date(&mut t, d("2024-06-10")).unwrap();
        assert_eq!(t.duration_days, Some(9));
    }

    #[test]
    fn test_set_start_keeps_duration_and_moves_end() {
        let mut t = scheduled(1, "2024-01-01", "2024-01-06");
        t.duration_days = Some(5);
        set_start_date(&mut t, d("2024-01-10")).unwrap();
        assert_eq!(t.duration_days, Some(5));
        assert_eq!(t.end_date, Some(d("2024-01-15")));
    }

    #[test]
    fn test_set_start_without_duration_derives_it() {
        let mut t = task(1, &[]);
        t.end_date = Some(d("2024-01-20"));
        set_start_date(&mut t, d("2024-01-15")).unwrap();
        assert_eq!(t.duration_days, Some(5));
        assert_eq!(t.end_date, Some(d("2024-01-20")));
    }

    #[test]
    fn test_end_before_start_rejected() {
        let mut t = task(1, &[]);
        t.start_date = Some(d("2024-01-10"));
        assert!(matches!(
            set_end_date(&mut t, d("2024-01-03")),
            Err(ScheduleError::NegativeDuration { .. })
        ));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let mut t = task(1, &[]);
        assert_eq!(set_duration(&mut t, -1), Err(ScheduleError::InvalidDuration(-1)));
    }
}
