//! Calendar date arithmetic helpers.
//!
//! Thin wrappers over chrono used by the scheduler so that lag offsets and
//! duration maths go through one place. All arithmetic is in whole calendar
//! days; there is no working-day calendar.

use chrono::{Duration, NaiveDate};

/// Add a signed number of days to a date.
///
/// Returns `None` if the result falls outside chrono's representable range,
/// which only happens with absurd lag values; callers surface that as a
/// hard error rather than clamping.
pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    // try_days: Duration::days panics outside its representable range.
    Duration::try_days(days).and_then(|d| date.checked_add_signed(d))
}

/// Signed calendar-day difference `b - a`.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_add_days() {
        assert_eq!(add_days(d("2024-01-01"), 5), Some(d("2024-01-06")));
        assert_eq!(add_days(d("2024-03-01"), -1), Some(d("2024-02-29")));
        assert_eq!(add_days(d("2024-01-01"), 0), Some(d("2024-01-01")));
    }

    #[test]
    fn test_add_days_overflow() {
        assert_eq!(add_days(NaiveDate::MAX, 1), None);
        assert_eq!(add_days(NaiveDate::MIN, -1), None);
    }

    #[test]
    fn test_days_between_inverts_add_days() {
        let start = d("2024-01-01");
        for dur in [0i64, 1, 13, 365] {
            let end = add_days(start, dur).unwrap();
            assert_eq!(days_between(start, end), dur);
        }
    }

    #[test]
    fn test_days_between_signed() {
        assert_eq!(days_between(d("2024-01-10"), d("2024-01-03")), -7);
    }
}
