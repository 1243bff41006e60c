//! Repository seam between the computed core and persistence.
//!
//! The progress and expansion computations never touch storage directly;
//! they consume a [`HabitRepository`], which exposes exactly the lookups and
//! the idempotent mark/unmark the core needs. [`crate::storage::OrganizerDb`]
//! is the SQLite implementation.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Result;
use crate::progress::{self, ProgressSnapshot};
use crate::recurrence::RecurrenceRule;

/// Lookups and log maintenance for one recurring entry.
pub trait HabitRepository {
    /// Recurrence rule of the habit.
    fn rule(&self, habit_id: &str) -> Result<RecurrenceRule>;

    /// All completion dates recorded for the habit. At most one per day by
    /// the mark invariant.
    fn completions(&self, habit_id: &str) -> Result<BTreeSet<NaiveDate>>;

    /// Record a completion. Marking an already-marked date is a no-op, not
    /// an error.
    fn mark(&self, habit_id: &str, done_on: NaiveDate) -> Result<()>;

    /// Remove a completion. Removing an absent date is a no-op.
    fn unmark(&self, habit_id: &str, done_on: NaiveDate) -> Result<()>;
}

/// Load a habit's rule and log, then compute a fresh [`ProgressSnapshot`]
/// for `today`'s week.
pub fn get_progress<R: HabitRepository + ?Sized>(
    repo: &R,
    habit_id: &str,
    today: NaiveDate,
) -> Result<ProgressSnapshot> {
    let rule = repo.rule(habit_id)?;
    let log = repo.completions(habit_id)?;
    Ok(progress::snapshot(&rule, &log, today))
}

/// Expand a habit's schedule over `[from, to]`.
///
/// # Errors
/// [`crate::error::RecurrenceError::InvalidRange`] when `from > to`.
pub fn expand_occurrences<R: HabitRepository + ?Sized>(
    repo: &R,
    habit_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<NaiveDateTime>> {
    let rule = repo.rule(habit_id)?;
    Ok(rule.expand(from, to)?)
}
