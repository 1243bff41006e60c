//! Domain types for projects, goals, and tasks.
//!
//! A task is either undated, scheduled once (`scheduled_at` = combined
//! date + time), or a member of a recurring series: one concrete row per
//! occurrence, all sharing a `series_id`. Series expansion goes through
//! [`crate::recurrence`] and always takes an explicit end date; an unbounded
//! rule never materializes rows.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecurrenceError;
use crate::recurrence::RecurrenceRule;

/// A project that groups related tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
}

impl Project {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            created_at: Utc::now(),
        }
    }
}

/// A goal that groups related habits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
}

impl Goal {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            created_at: Utc::now(),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Numeric form kept in the store (1..=4).
    pub fn value(&self) -> i64 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(Priority::Low),
            2 => Some(Priority::Medium),
            3 => Some(Priority::High),
            4 => Some(Priority::Urgent),
            _ => None,
        }
    }
}

/// A single task row: undated, scheduled once, or one occurrence of a series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: Option<String>,
    /// Shared by every occurrence of one recurring series.
    pub series_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    /// Combined date + time; `None` = undated.
    pub scheduled_at: Option<NaiveDateTime>,
    /// Date component, kept alongside for date-scoped queries.
    pub scheduled_for: Option<NaiveDate>,
    pub duration_minutes: i64,
    /// "#RRGGBB"
    pub color: String,
    pub done: bool,
    pub priority: Option<Priority>,
    pub pomodoro_count: i64,
    /// Order within the owning project; appended to the end on create.
    pub position: Option<i64>,
    pub created_at: chrono::DateTime<Utc>,
}

impl Task {
    /// New undated task with defaults matching the store column defaults.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: None,
            series_id: None,
            title: title.into(),
            description: None,
            scheduled_at: None,
            scheduled_for: None,
            duration_minutes: 60,
            color: "#CCCCCC".to_string(),
            done: false,
            priority: None,
            pomodoro_count: 0,
            position: None,
            created_at: Utc::now(),
        }
    }

    /// Schedule this task at a concrete date + time.
    pub fn schedule(&mut self, date: NaiveDate, time: NaiveTime) {
        self.scheduled_for = Some(date);
        self.scheduled_at = Some(date.and_time(time));
    }

    /// Clear the schedule, making the task undated.
    pub fn unschedule(&mut self) {
        self.scheduled_for = None;
        self.scheduled_at = None;
    }

    /// Expand a recurring series from this prototype.
    ///
    /// Produces one task per occurrence of `rule` in
    /// `[rule.anchor_date, until]`, each with a fresh id, `done` reset, and
    /// a shared freshly-generated series id. The caller supplies the end
    /// date explicitly; there is no implicit forward horizon.
    ///
    /// # Errors
    /// [`RecurrenceError::InvalidRange`] when `until` precedes the rule's
    /// anchor; [`RecurrenceError::EmptySeries`] when no day matches.
    pub fn series(&self, rule: &RecurrenceRule, until: NaiveDate) -> Result<Vec<Task>, RecurrenceError> {
        let occurrences = rule.expand(rule.anchor_date, until)?;
        if occurrences.is_empty() {
            return Err(RecurrenceError::EmptySeries {
                from: rule.anchor_date,
                to: until,
            });
        }

        let series_id = Uuid::new_v4().to_string();
        Ok(occurrences
            .into_iter()
            .map(|when| {
                let mut task = self.clone();
                task.id = Uuid::new_v4().to_string();
                task.series_id = Some(series_id.clone());
                task.scheduled_for = Some(when.date());
                task.scheduled_at = Some(when);
                task.done = false;
                task.position = None;
                task
            })
            .collect())
    }
}

/// Schedule part of a task update: leave as-is, clear, or set both parts.
///
/// Setting date and time is all-or-nothing; there is no half-scheduled task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulePatch {
    #[default]
    Keep,
    Clear,
    Set { date: NaiveDate, time: NaiveTime },
}

/// Field-wise task update, applied to one row or to a whole series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i64>,
    pub color: Option<String>,
    pub done: Option<bool>,
    pub priority: Option<Priority>,
    pub project_id: Option<Option<String>>,
    pub pomodoro_count: Option<i64>,
    #[serde(default)]
    pub schedule: SchedulePatch,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.duration_minutes.is_none()
            && self.color.is_none()
            && self.done.is_none()
            && self.priority.is_none()
            && self.project_id.is_none()
            && self.pomodoro_count.is_none()
            && self.schedule == SchedulePatch::Keep
    }

    /// Apply the provided fields onto `task`, leaving the rest untouched.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(duration) = self.duration_minutes {
            task.duration_minutes = duration;
        }
        if let Some(color) = &self.color {
            task.color = color.clone();
        }
        if let Some(done) = self.done {
            task.done = done;
        }
        if let Some(priority) = self.priority {
            task.priority = Some(priority);
        }
        if let Some(project_id) = &self.project_id {
            task.project_id = project_id.clone();
        }
        if let Some(count) = self.pomodoro_count {
            task.pomodoro_count = count;
        }
        match self.schedule {
            SchedulePatch::Keep => {}
            SchedulePatch::Clear => task.unschedule(),
            SchedulePatch::Set { date, time } => task.schedule(date, time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::WeekdaySet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn priority_value_round_trip() {
        for p in [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent] {
            assert_eq!(Priority::from_value(p.value()), Some(p));
        }
        assert_eq!(Priority::from_value(0), None);
        assert_eq!(Priority::from_value(5), None);
    }

    #[test]
    fn series_shares_id_and_resets_done() {
        let mut prototype = Task::new("Standup");
        prototype.done = true;
        let rule = RecurrenceRule::new(
            date(2024, 1, 1),
            time(9, 0),
            WeekdaySet::new(&[0, 2, 4]).unwrap(),
            None,
        )
        .unwrap();

        let tasks = prototype.series(&rule, date(2024, 1, 7)).unwrap();
        assert_eq!(tasks.len(), 3);

        let series_id = tasks[0].series_id.clone().unwrap();
        for task in &tasks {
            assert_eq!(task.series_id.as_ref(), Some(&series_id));
            assert!(!task.done);
            assert_eq!(task.title, "Standup");
        }
        assert_eq!(tasks[0].scheduled_for, Some(date(2024, 1, 1)));
        assert_eq!(tasks[1].scheduled_for, Some(date(2024, 1, 3)));
        assert_eq!(tasks[2].scheduled_for, Some(date(2024, 1, 5)));
        assert_eq!(tasks[0].scheduled_at, Some(date(2024, 1, 1).and_time(time(9, 0))));
    }

    #[test]
    fn series_until_before_anchor_fails() {
        let prototype = Task::new("Standup");
        let rule = RecurrenceRule::new(date(2024, 2, 1), time(9, 0), WeekdaySet::all(), None)
            .unwrap();
        let err = prototype.series(&rule, date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, RecurrenceError::InvalidRange { .. }));
    }

    #[test]
    fn series_with_no_matching_day_fails() {
        let prototype = Task::new("Standup");
        // 2024-01-01 is a Monday; Sunday never occurs before `until`.
        let rule = RecurrenceRule::new(
            date(2024, 1, 1),
            time(9, 0),
            WeekdaySet::new(&[6]).unwrap(),
            None,
        )
        .unwrap();
        let err = prototype.series(&rule, date(2024, 1, 5)).unwrap_err();
        assert!(matches!(err, RecurrenceError::EmptySeries { .. }));
    }

    #[test]
    fn patch_applies_only_provided_fields() {
        let mut task = Task::new("Write report");
        task.schedule(date(2024, 1, 10), time(14, 0));

        let patch = TaskPatch {
            title: Some("Write the report".to_string()),
            done: Some(true),
            ..Default::default()
        };
        patch.apply(&mut task);

        assert_eq!(task.title, "Write the report");
        assert!(task.done);
        assert_eq!(task.scheduled_for, Some(date(2024, 1, 10)));
        assert_eq!(task.duration_minutes, 60);
    }

    #[test]
    fn patch_clear_unschedules() {
        let mut task = Task::new("Write report");
        task.schedule(date(2024, 1, 10), time(14, 0));

        let patch = TaskPatch {
            schedule: SchedulePatch::Clear,
            ..Default::default()
        };
        patch.apply(&mut task);
        assert!(task.scheduled_at.is_none());
        assert!(task.scheduled_for.is_none());
    }
}
