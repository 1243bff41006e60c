//! Recurrence rules and schedule expansion.
//!
//! A [`RecurrenceRule`] describes when a recurring entry (a habit, or a task
//! series) is scheduled: an anchor date, a constant time of day, the set of
//! active weekdays, and an optional inclusive end date. [`RecurrenceRule::expand`]
//! turns a rule plus a date range into the ordered sequence of concrete
//! occurrence timestamps.
//!
//! Weekdays are numbered Monday=0 through Sunday=6. The compact 7-bit mask
//! form exists only at the serialization edge ([`WeekdaySet::mask`] /
//! [`WeekdaySet::from_mask`]); everywhere else the API speaks sets.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::RecurrenceError;

/// Set of active weekdays, Monday=0 through Sunday=6.
///
/// Serializes as a sorted list of day indices (e.g. `[0, 2, 4]` for
/// Mon/Wed/Fri).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekdaySet(u8);

const ALL_DAYS_MASK: u8 = 0b0111_1111;

impl WeekdaySet {
    /// The empty set. Expanding a rule with no active weekdays yields an
    /// empty sequence for any range.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Every day of the week.
    pub fn all() -> Self {
        Self(ALL_DAYS_MASK)
    }

    /// Build a set from day indices.
    ///
    /// # Errors
    /// Returns [`RecurrenceError::InvalidWeekday`] for any value outside 0..=6.
    pub fn new(days: &[u8]) -> Result<Self, RecurrenceError> {
        let mut mask = 0u8;
        for &day in days {
            if day > 6 {
                return Err(RecurrenceError::InvalidWeekday(day));
            }
            mask |= 1 << day;
        }
        Ok(Self(mask))
    }

    /// Rebuild a set from its compact bit representation (bit `d` set means
    /// day `d` is active). Serialization-layer concern; the store keeps this
    /// form in a single integer column.
    ///
    /// # Errors
    /// Returns [`RecurrenceError::InvalidWeekday`] if a bit above 6 is set.
    pub fn from_mask(mask: u8) -> Result<Self, RecurrenceError> {
        if mask & !ALL_DAYS_MASK != 0 {
            return Err(RecurrenceError::InvalidWeekday(7));
        }
        Ok(Self(mask))
    }

    /// The compact bit representation of this set.
    pub fn mask(&self) -> u8 {
        self.0
    }

    /// Day indices in ascending order.
    pub fn days(&self) -> Vec<u8> {
        (0u8..7).filter(|d| self.0 & (1 << d) != 0).collect()
    }

    /// Whether `weekday` is in the set.
    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday.num_days_from_monday() as u8) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of active days (0..=7).
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }
}

impl TryFrom<Vec<u8>> for WeekdaySet {
    type Error = RecurrenceError;

    fn try_from(days: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(&days)
    }
}

impl From<WeekdaySet> for Vec<u8> {
    fn from(set: WeekdaySet) -> Self {
        set.days()
    }
}

/// When a recurring entry is scheduled.
///
/// Invariants, enforced at construction and update time:
/// - `end_date`, when present, is not before `anchor_date`
/// - `active_weekdays` only holds days 0..=6 (by [`WeekdaySet`] construction)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// First possible occurrence date.
    pub anchor_date: NaiveDate,
    /// Time-of-day component, constant across occurrences.
    pub clock_time: NaiveTime,
    /// Days of week on which occurrences fall.
    pub active_weekdays: WeekdaySet,
    /// Inclusive upper bound; `None` means unbounded.
    pub end_date: Option<NaiveDate>,
}

impl RecurrenceRule {
    /// Create a rule, validating date order.
    ///
    /// # Errors
    /// Returns [`RecurrenceError::InvalidDateOrder`] when `end_date` is
    /// before `anchor_date`.
    pub fn new(
        anchor_date: NaiveDate,
        clock_time: NaiveTime,
        active_weekdays: WeekdaySet,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, RecurrenceError> {
        if let Some(end) = end_date {
            if end < anchor_date {
                return Err(RecurrenceError::InvalidDateOrder {
                    anchor: anchor_date,
                    end,
                });
            }
        }
        Ok(Self {
            anchor_date,
            clock_time,
            active_weekdays,
            end_date,
        })
    }

    /// Replace the bounds of the rule, re-validating date order.
    ///
    /// # Errors
    /// Returns [`RecurrenceError::InvalidDateOrder`] when the new bounds are
    /// inverted.
    pub fn set_bounds(
        &mut self,
        anchor_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<(), RecurrenceError> {
        if let Some(end) = end_date {
            if end < anchor_date {
                return Err(RecurrenceError::InvalidDateOrder {
                    anchor: anchor_date,
                    end,
                });
            }
        }
        self.anchor_date = anchor_date;
        self.end_date = end_date;
        Ok(())
    }

    /// Whether `date` is a scheduled day: its weekday is active and it lies
    /// within `[anchor_date, end_date]`.
    pub fn is_scheduled_on(&self, date: NaiveDate) -> bool {
        if date < self.anchor_date {
            return false;
        }
        if let Some(end) = self.end_date {
            if date > end {
                return false;
            }
        }
        self.active_weekdays.contains(date.weekday())
    }

    /// Expand the rule over `[from, to]` into concrete occurrence timestamps,
    /// in strictly ascending order.
    ///
    /// The effective range is `[max(from, anchor_date), min(to, end_date)]`;
    /// an empty effective range yields an empty vector, not an error. The
    /// computation is pure and bounded by the size of the range.
    ///
    /// # Errors
    /// Returns [`RecurrenceError::InvalidRange`] when `from > to`, to
    /// distinguish caller error from a legitimately empty schedule.
    pub fn expand(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDateTime>, RecurrenceError> {
        if from > to {
            return Err(RecurrenceError::InvalidRange { from, to });
        }

        let lower = from.max(self.anchor_date);
        let upper = match self.end_date {
            Some(end) => to.min(end),
            None => to,
        };

        let mut occurrences = Vec::new();
        let mut cursor = lower;
        while cursor <= upper {
            if self.active_weekdays.contains(cursor.weekday()) {
                occurrences.push(cursor.and_time(self.clock_time));
            }
            cursor += Duration::days(1);
        }
        Ok(occurrences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn mwf_rule() -> RecurrenceRule {
        RecurrenceRule::new(
            date(2024, 1, 1), // a Monday
            time(9, 0),
            WeekdaySet::new(&[0, 2, 4]).unwrap(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn weekday_set_rejects_out_of_range() {
        assert_eq!(
            WeekdaySet::new(&[0, 7]),
            Err(RecurrenceError::InvalidWeekday(7))
        );
    }

    #[test]
    fn weekday_set_mask_round_trip() {
        let set = WeekdaySet::new(&[0, 2, 4]).unwrap();
        assert_eq!(set.mask(), 0b0001_0101);
        assert_eq!(WeekdaySet::from_mask(set.mask()).unwrap(), set);
        assert_eq!(set.days(), vec![0, 2, 4]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn weekday_set_rejects_high_mask_bits() {
        assert!(WeekdaySet::from_mask(0b1000_0000).is_err());
    }

    #[test]
    fn weekday_set_serde_is_a_day_list() {
        let set = WeekdaySet::new(&[1, 5]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[1,5]");
        let back: WeekdaySet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
        assert!(serde_json::from_str::<WeekdaySet>("[9]").is_err());
    }

    #[test]
    fn rule_rejects_end_before_anchor() {
        let err = RecurrenceRule::new(
            date(2024, 1, 10),
            time(9, 0),
            WeekdaySet::all(),
            Some(date(2024, 1, 1)),
        )
        .unwrap_err();
        assert!(matches!(err, RecurrenceError::InvalidDateOrder { .. }));
    }

    #[test]
    fn expand_mon_wed_fri_over_one_week() {
        let rule = mwf_rule();
        let got = rule.expand(date(2024, 1, 1), date(2024, 1, 7)).unwrap();
        assert_eq!(
            got,
            vec![
                date(2024, 1, 1).and_time(time(9, 0)),
                date(2024, 1, 3).and_time(time(9, 0)),
                date(2024, 1, 5).and_time(time(9, 0)),
            ]
        );
    }

    #[test]
    fn expand_clamps_to_anchor_and_end() {
        let rule = RecurrenceRule::new(
            date(2024, 1, 3),
            time(9, 0),
            WeekdaySet::all(),
            Some(date(2024, 1, 5)),
        )
        .unwrap();
        let got = rule.expand(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        let dates: Vec<NaiveDate> = got.iter().map(|dt| dt.date()).collect();
        assert_eq!(dates, vec![date(2024, 1, 3), date(2024, 1, 4), date(2024, 1, 5)]);
    }

    #[test]
    fn expand_empty_effective_range_is_ok() {
        let rule = mwf_rule();
        // Entire query range before the anchor.
        let got = rule.expand(date(2023, 1, 1), date(2023, 1, 7)).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn expand_empty_weekday_set_is_empty() {
        let rule = RecurrenceRule::new(date(2024, 1, 1), time(9, 0), WeekdaySet::empty(), None)
            .unwrap();
        let got = rule.expand(date(2024, 1, 1), date(2024, 12, 31)).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn expand_inverted_range_fails() {
        let rule = mwf_rule();
        let err = rule.expand(date(2024, 2, 1), date(2024, 1, 1)).unwrap_err();
        assert_eq!(
            err,
            RecurrenceError::InvalidRange {
                from: date(2024, 2, 1),
                to: date(2024, 1, 1),
            }
        );
    }

    #[test]
    fn is_scheduled_on_respects_bounds() {
        let rule = RecurrenceRule::new(
            date(2024, 1, 1),
            time(9, 0),
            WeekdaySet::new(&[0, 2, 4]).unwrap(),
            Some(date(2024, 1, 5)),
        )
        .unwrap();
        assert!(rule.is_scheduled_on(date(2024, 1, 1)));
        assert!(!rule.is_scheduled_on(date(2024, 1, 2))); // Tuesday
        assert!(!rule.is_scheduled_on(date(2023, 12, 29))); // before anchor
        assert!(!rule.is_scheduled_on(date(2024, 1, 8))); // past end
    }

    proptest! {
        #[test]
        fn expand_is_ascending_and_on_active_days(
            days in proptest::collection::vec(0u8..7, 0..7),
            anchor_offset in 0i64..60,
            span in 0i64..120,
        ) {
            let anchor = date(2024, 1, 1) + Duration::days(anchor_offset);
            let rule = RecurrenceRule::new(
                anchor,
                time(8, 30),
                WeekdaySet::new(&days).unwrap(),
                None,
            ).unwrap();

            let from = date(2024, 1, 1);
            let to = from + Duration::days(span);
            let got = rule.expand(from, to).unwrap();

            for pair in got.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            for occurrence in &got {
                prop_assert!(rule.active_weekdays.contains(occurrence.date().weekday()));
                prop_assert!(occurrence.date() >= anchor);
                prop_assert!(occurrence.date() <= to);
                prop_assert_eq!(occurrence.time(), time(8, 30));
            }
            if days.is_empty() {
                prop_assert!(got.is_empty());
            }
        }
    }
}
