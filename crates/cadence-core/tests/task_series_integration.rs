//! Integration tests for the recurring task series lifecycle.
//!
//! A series is created by expanding a recurrence rule into concrete task
//! rows that share a series id; updates and deletes can target one member
//! or the whole series.

use cadence_core::{
    CoreError, OrganizerDb, Project, RecurrenceError, RecurrenceRule, SchedulePatch, Task,
    TaskPatch, WeekdaySet,
};
use chrono::{NaiveDate, NaiveTime};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn weekday_rule(days: &[u8], anchor: NaiveDate) -> RecurrenceRule {
    RecurrenceRule::new(anchor, time(9, 0), WeekdaySet::new(days).unwrap(), None).unwrap()
}

#[test]
fn series_creates_one_row_per_occurrence() {
    let db = OrganizerDb::open_memory().unwrap();
    let rule = weekday_rule(&[0, 2, 4], date(2024, 1, 1));

    let tasks = db.create_series(&Task::new("Standup"), &rule, date(2024, 1, 7)).unwrap();
    assert_eq!(tasks.len(), 3);

    let series_id = tasks[0].series_id.clone().unwrap();
    let members = db.list_series(&series_id).unwrap();
    assert_eq!(members.len(), 3);
    assert_eq!(members[0].scheduled_for, Some(date(2024, 1, 1)));
    assert_eq!(members[1].scheduled_for, Some(date(2024, 1, 3)));
    assert_eq!(members[2].scheduled_for, Some(date(2024, 1, 5)));

    // The range query sees the members in time order.
    let in_range = db.list_tasks_between(date(2024, 1, 1), date(2024, 1, 7)).unwrap();
    assert_eq!(in_range.len(), 3);
}

#[test]
fn series_requires_a_matching_day() {
    let db = OrganizerDb::open_memory().unwrap();
    // Sunday-only rule over a Mon..Fri window.
    let rule = weekday_rule(&[6], date(2024, 1, 1));
    let err = db
        .create_series(&Task::new("Standup"), &rule, date(2024, 1, 5))
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Recurrence(RecurrenceError::EmptySeries { .. })
    ));
}

#[test]
fn series_rejects_inverted_bounds() {
    let db = OrganizerDb::open_memory().unwrap();
    let rule = weekday_rule(&[0], date(2024, 2, 1));
    let err = db
        .create_series(&Task::new("Standup"), &rule, date(2024, 1, 1))
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Recurrence(RecurrenceError::InvalidRange { .. })
    ));
}

#[test]
fn series_members_append_to_project_order() {
    let db = OrganizerDb::open_memory().unwrap();
    let project = Project::new("Team rituals");
    db.create_project(&project).unwrap();

    let mut existing = Task::new("Kickoff");
    existing.project_id = Some(project.id.clone());
    db.create_task(&existing).unwrap();

    let mut prototype = Task::new("Standup");
    prototype.project_id = Some(project.id.clone());
    let rule = weekday_rule(&[0, 2, 4], date(2024, 1, 1));
    let tasks = db.create_series(&prototype, &rule, date(2024, 1, 7)).unwrap();

    assert_eq!(tasks[0].position, Some(1));
    assert_eq!(tasks[2].position, Some(3));
}

#[test]
fn series_patch_reschedules_every_member_time() {
    let db = OrganizerDb::open_memory().unwrap();
    let rule = weekday_rule(&[0, 2], date(2024, 1, 1));
    let tasks = db.create_series(&Task::new("Standup"), &rule, date(2024, 1, 7)).unwrap();

    // Moving one member does not disturb the rest.
    let patch = TaskPatch {
        schedule: SchedulePatch::Set {
            date: date(2024, 1, 2),
            time: time(10, 0),
        },
        ..Default::default()
    };
    db.patch_task(&tasks[0].id, &patch, false).unwrap();

    let moved = db.get_task(&tasks[0].id).unwrap().unwrap();
    assert_eq!(moved.scheduled_for, Some(date(2024, 1, 2)));
    let untouched = db.get_task(&tasks[1].id).unwrap().unwrap();
    assert_eq!(untouched.scheduled_for, Some(date(2024, 1, 3)));
}

#[test]
fn deleting_one_member_keeps_the_rest() {
    let db = OrganizerDb::open_memory().unwrap();
    let rule = weekday_rule(&[0, 2, 4], date(2024, 1, 1));
    let tasks = db.create_series(&Task::new("Standup"), &rule, date(2024, 1, 7)).unwrap();
    let series_id = tasks[0].series_id.clone().unwrap();

    let deleted = db.delete_task(&tasks[0].id, false).unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(db.list_series(&series_id).unwrap().len(), 2);

    let deleted = db.delete_task(&tasks[1].id, true).unwrap();
    assert_eq!(deleted, 2);
    assert!(db.list_series(&series_id).unwrap().is_empty());
}
