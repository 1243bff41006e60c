//! Weekly progress and streak computation for recurring entries.
//!
//! All computations here are pure functions over a [`RecurrenceRule`], a
//! completion log (a set of dates), and a reference date. Nothing is
//! persisted; callers load their inputs, compute a fresh
//! [`ProgressSnapshot`], and discard it. Weeks run Monday through Sunday.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrenceRule;

/// Derived weekly progress for one recurring entry.
///
/// Computed fresh on every query; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Scheduled occurrences in the current week that lie within the rule's
    /// bounds.
    pub week_target: u32,
    /// Completions logged within the current week.
    pub week_done: u32,
    /// Consecutive completed scheduled days, walking backward from today.
    pub streak: u32,
}

/// Monday..Sunday bounds of the week containing `today`.
pub fn week_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    (start, start + Duration::days(6))
}

/// Count of dates in `[week_start, week_end]` scheduled by `rule`.
///
/// A date counts when its weekday is active AND it is not before the rule's
/// anchor AND not past its end date.
pub fn weekly_target(rule: &RecurrenceRule, week_start: NaiveDate, week_end: NaiveDate) -> u32 {
    let mut target = 0;
    let mut day = week_start;
    while day <= week_end {
        if rule.is_scheduled_on(day) {
            target += 1;
        }
        day += Duration::days(1);
    }
    target
}

/// Count of completions within `[week_start, week_end]`, inclusive both ends.
pub fn weekly_done(log: &BTreeSet<NaiveDate>, week_start: NaiveDate, week_end: NaiveDate) -> u32 {
    log.range(week_start..=week_end).count() as u32
}

/// Backward-looking consecutive-completion streak.
///
/// The cursor starts at `today`, clamped to the rule's end date when one is
/// set. Unscheduled days are skipped without breaking the streak; the first
/// scheduled day without a completion stops the walk, as does passing the
/// anchor date. Zero means the most recent scheduled day at or before the
/// cursor was not completed (including the no-scheduled-days case).
pub fn streak(rule: &RecurrenceRule, log: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut cursor = match rule.end_date {
        Some(end) => today.min(end),
        None => today,
    };

    let mut count = 0;
    while cursor >= rule.anchor_date {
        if !rule.active_weekdays.contains(cursor.weekday()) {
            cursor -= Duration::days(1);
            continue;
        }
        if !log.contains(&cursor) {
            break;
        }
        count += 1;
        cursor -= Duration::days(1);
    }
    count
}

/// Compute the full snapshot for `today`'s week.
pub fn snapshot(rule: &RecurrenceRule, log: &BTreeSet<NaiveDate>, today: NaiveDate) -> ProgressSnapshot {
    let (week_start, week_end) = week_bounds(today);
    ProgressSnapshot {
        week_target: weekly_target(rule, week_start, week_end),
        week_done: weekly_done(log, week_start, week_end),
        streak: streak(rule, log, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::WeekdaySet;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn mwf_rule(end_date: Option<NaiveDate>) -> RecurrenceRule {
        RecurrenceRule::new(
            date(2024, 1, 1), // a Monday
            NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            WeekdaySet::new(&[0, 2, 4]).unwrap(),
            end_date,
        )
        .unwrap()
    }

    fn log(dates: &[NaiveDate]) -> BTreeSet<NaiveDate> {
        dates.iter().copied().collect()
    }

    #[test]
    fn week_bounds_is_monday_through_sunday() {
        // 2024-01-04 is a Thursday.
        let (start, end) = week_bounds(date(2024, 1, 4));
        assert_eq!(start, date(2024, 1, 1));
        assert_eq!(end, date(2024, 1, 7));
        // A Monday is its own week start.
        let (start, end) = week_bounds(date(2024, 1, 1));
        assert_eq!(start, date(2024, 1, 1));
        assert_eq!(end, date(2024, 1, 7));
    }

    #[test]
    fn weekly_target_counts_scheduled_days_in_bounds() {
        let rule = mwf_rule(None);
        assert_eq!(weekly_target(&rule, date(2024, 1, 1), date(2024, 1, 7)), 3);
    }

    #[test]
    fn weekly_target_respects_anchor_and_end() {
        // Anchor mid-week: Monday falls before it.
        let rule = RecurrenceRule::new(
            date(2024, 1, 2),
            NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            WeekdaySet::new(&[0, 2, 4]).unwrap(),
            Some(date(2024, 1, 3)),
        )
        .unwrap();
        // Only Wednesday Jan 3 remains in range.
        assert_eq!(weekly_target(&rule, date(2024, 1, 1), date(2024, 1, 7)), 1);
    }

    #[test]
    fn weekly_done_counts_only_in_week() {
        let completions = log(&[date(2023, 12, 29), date(2024, 1, 1), date(2024, 1, 7)]);
        assert_eq!(weekly_done(&completions, date(2024, 1, 1), date(2024, 1, 7)), 2);
    }

    #[test]
    fn streak_skips_unscheduled_days() {
        // Thursday Jan 4 is unscheduled; the walk lands on Wed Jan 3 and
        // continues back through Mon Jan 1, then stops at the anchor.
        let rule = mwf_rule(None);
        let completions = log(&[date(2024, 1, 1), date(2024, 1, 3)]);
        assert_eq!(streak(&rule, &completions, date(2024, 1, 4)), 2);
    }

    #[test]
    fn streak_stops_on_missed_scheduled_day() {
        // Friday Jan 5 is scheduled and has no completion.
        let rule = mwf_rule(None);
        let completions = log(&[date(2024, 1, 1), date(2024, 1, 3)]);
        assert_eq!(streak(&rule, &completions, date(2024, 1, 5)), 0);
    }

    #[test]
    fn streak_with_empty_log_is_zero() {
        let rule = mwf_rule(None);
        assert_eq!(streak(&rule, &BTreeSet::new(), date(2024, 6, 1)), 0);
    }

    #[test]
    fn streak_before_anchor_is_zero() {
        let rule = mwf_rule(None);
        let completions = log(&[date(2024, 1, 1)]);
        assert_eq!(streak(&rule, &completions, date(2023, 12, 25)), 0);
    }

    #[test]
    fn streak_clamps_cursor_to_end_date() {
        // Rule ended Jan 5; querying well after still walks from Jan 5.
        let rule = mwf_rule(Some(date(2024, 1, 5)));
        let completions = log(&[date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 5)]);
        assert_eq!(streak(&rule, &completions, date(2024, 3, 1)), 3);
    }

    #[test]
    fn snapshot_combines_all_three() {
        let rule = mwf_rule(None);
        let completions = log(&[date(2024, 1, 1), date(2024, 1, 3)]);
        let snap = snapshot(&rule, &completions, date(2024, 1, 4));
        assert_eq!(
            snap,
            ProgressSnapshot {
                week_target: 3,
                week_done: 2,
                streak: 2,
            }
        );
    }
}
