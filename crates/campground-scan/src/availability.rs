use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

/// Length of the longest run of consecutive calendar dates in the set.
///
/// Dates are mapped to their day ordinal; a run breaks whenever the next
/// ordinal is not exactly one past the previous. Returns 0 for an empty
/// set.
pub fn longest_consecutive_run(dates: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0u32;
    let mut current = 0u32;
    let mut previous: Option<i32> = None;

    for date in dates {
        let ordinal = date.num_days_from_ce();
        current = match previous {
            Some(prev) if ordinal == prev + 1 => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(ordinal);
    }

    longest
}

/// Whether `dates` contains `required_nights` worth of consecutive
/// nights. Pure and deterministic over its inputs.
pub fn has_consecutive_run(dates: &BTreeSet<NaiveDate>, required_nights: u32) -> bool {
    longest_consecutive_run(dates) >= required_nights
}
