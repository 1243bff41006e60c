//! Habit domain type.
//!
//! A habit belongs to a goal, carries a [`RecurrenceRule`] for its schedule,
//! and accumulates a completion log of (habit, date) pairs held by the
//! store. Weekly progress over habits is computed in [`crate::progress`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::progress::ProgressSnapshot;
use crate::recurrence::RecurrenceRule;

/// A recurring habit under a goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub goal_id: String,
    /// Order within the owning goal; appended to the end on create.
    pub position: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    /// "#RRGGBB"
    pub color: String,
    pub active: bool,
    pub rule: RecurrenceRule,
    pub duration_minutes: i64,
    pub created_at: chrono::DateTime<Utc>,
}

impl Habit {
    /// New active habit with a fresh id. Position is assigned by the store
    /// on create.
    pub fn new(goal_id: impl Into<String>, title: impl Into<String>, rule: RecurrenceRule) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            goal_id: goal_id.into(),
            position: None,
            title: title.into(),
            description: None,
            color: "#CCCCCC".to_string(),
            active: true,
            rule,
            duration_minutes: 25,
            created_at: Utc::now(),
        }
    }
}

/// Habit counts for the stats surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitStats {
    pub total_habits: u32,
    pub active_habits: u32,
}

/// Per-habit progress row returned by the aggregate query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitProgress {
    pub habit_id: String,
    pub active: bool,
    #[serde(flatten)]
    pub progress: ProgressSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::WeekdaySet;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn new_habit_defaults() {
        let rule = RecurrenceRule::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            WeekdaySet::all(),
            None,
        )
        .unwrap();
        let habit = Habit::new("goal-1", "Morning run", rule);
        assert!(habit.active);
        assert_eq!(habit.duration_minutes, 25);
        assert_eq!(habit.color, "#CCCCCC");
        assert!(habit.position.is_none());
    }

    #[test]
    fn habit_serialization_round_trip() {
        let rule = RecurrenceRule::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            WeekdaySet::new(&[0, 2, 4]).unwrap(),
            Some(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()),
        )
        .unwrap();
        let habit = Habit::new("goal-1", "Morning run", rule);
        let json = serde_json::to_string(&habit).unwrap();
        let decoded: Habit = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.rule, habit.rule);
        assert_eq!(decoded.id, habit.id);
    }
}
