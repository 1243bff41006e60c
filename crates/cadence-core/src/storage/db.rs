//! SQLite-based storage for projects, goals, tasks, habits, and the habit
//! completion log.
//!
//! The store keeps recurrence weekdays as a 7-bit mask in a single integer
//! column; the mask form never leaves this module (see
//! [`crate::recurrence::WeekdaySet`]). Uniqueness of (habit, date)
//! completion pairs is enforced by the table's primary key, and duplicate
//! marks are absorbed with `INSERT OR IGNORE`.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use super::migrations;
use crate::error::{CoreError, DatabaseError, Result};
use crate::habit::{Habit, HabitProgress, HabitStats};
use crate::progress;
use crate::recurrence::{RecurrenceRule, WeekdaySet};
use crate::repo::HabitRepository;
use crate::schedule::{Goal, Priority, Project, Task, TaskPatch};

// === Helper Functions ===

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a date column with fallback to today for corrupt rows.
fn parse_date_fallback(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, DATE_FMT).unwrap_or_else(|_| Utc::now().date_naive())
}

fn parse_date_opt(date_str: Option<String>) -> Option<NaiveDate> {
    date_str.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FMT).ok())
}

/// Parse a time column with fallback to midnight for corrupt rows.
fn parse_time_fallback(time_str: &str) -> NaiveTime {
    NaiveTime::parse_from_str(time_str, TIME_FMT)
        .unwrap_or_else(|_| NaiveTime::from_hms_opt(0, 0, 0).unwrap())
}

fn parse_scheduled_at(dt_str: Option<String>) -> Option<NaiveDateTime> {
    dt_str.and_then(|s| NaiveDateTime::parse_from_str(&s, DATETIME_FMT).ok())
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_created_at(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn format_scheduled_at(dt: Option<&NaiveDateTime>) -> Option<String> {
    dt.map(|dt| dt.format(DATETIME_FMT).to_string())
}

/// Build a Task from a database row.
///
/// Column order: id, project_id, series_id, title, description,
/// scheduled_at, scheduled_for, duration_minutes, color, done, priority,
/// created_at, pomodoro_count, position.
fn row_to_task(row: &rusqlite::Row) -> std::result::Result<Task, rusqlite::Error> {
    let scheduled_at: Option<String> = row.get(5)?;
    let scheduled_for: Option<String> = row.get(6)?;
    let priority: Option<i64> = row.get(10)?;
    let created_at_str: String = row.get(11)?;

    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        series_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        scheduled_at: parse_scheduled_at(scheduled_at),
        scheduled_for: parse_date_opt(scheduled_for),
        duration_minutes: row.get(7)?,
        color: row.get(8)?,
        done: row.get(9)?,
        priority: priority.and_then(Priority::from_value),
        created_at: parse_created_at(&created_at_str),
        pomodoro_count: row.get(12)?,
        position: row.get(13)?,
    })
}

const TASK_COLUMNS: &str = "id, project_id, series_id, title, description, scheduled_at, \
     scheduled_for, duration_minutes, color, done, priority, created_at, \
     pomodoro_count, position";

/// Build a Habit from a database row.
///
/// Column order: id, goal_id, title, description, color, active,
/// anchor_date, clock_time, days_mask, end_date, duration_minutes,
/// created_at, position.
fn row_to_habit(row: &rusqlite::Row) -> std::result::Result<Habit, rusqlite::Error> {
    let anchor_date: String = row.get(6)?;
    let clock_time: String = row.get(7)?;
    let days_mask: i64 = row.get(8)?;
    let end_date: Option<String> = row.get(9)?;
    let created_at_str: String = row.get(11)?;

    Ok(Habit {
        id: row.get(0)?,
        goal_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        color: row.get(4)?,
        active: row.get(5)?,
        rule: RecurrenceRule {
            anchor_date: parse_date_fallback(&anchor_date),
            clock_time: parse_time_fallback(&clock_time),
            active_weekdays: WeekdaySet::from_mask(days_mask as u8).unwrap_or_default(),
            end_date: parse_date_opt(end_date),
        },
        duration_minutes: row.get(10)?,
        created_at: parse_created_at(&created_at_str),
        position: row.get(12)?,
    })
}

const HABIT_COLUMNS: &str = "id, goal_id, title, description, color, active, anchor_date, \
     clock_time, days_mask, end_date, duration_minutes, created_at, position";

fn row_to_project(row: &rusqlite::Row) -> std::result::Result<Project, rusqlite::Error> {
    let created_at_str: String = row.get(3)?;
    Ok(Project {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_created_at(&created_at_str),
    })
}

fn row_to_goal(row: &rusqlite::Row) -> std::result::Result<Goal, rusqlite::Error> {
    let created_at_str: String = row.get(3)?;
    Ok(Goal {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_created_at(&created_at_str),
    })
}

/// SQLite database for organizer storage.
///
/// Stores projects, goals, tasks, habits, and habit completion logs, and
/// implements [`HabitRepository`] for the progress computations.
pub struct OrganizerDb {
    conn: Connection,
}

impl OrganizerDb {
    /// Open the organizer database at `~/.config/cadence/cadence.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("cadence.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    fn migrate(&self) -> std::result::Result<(), rusqlite::Error> {
        // Create base tables (v1 schema) first
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS projects (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                description TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS goals (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                description TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id               TEXT PRIMARY KEY,
                project_id       TEXT,
                series_id        TEXT,
                title            TEXT NOT NULL,
                description      TEXT,
                scheduled_at     TEXT,
                scheduled_for    TEXT,
                duration_minutes INTEGER NOT NULL DEFAULT 60,
                color            TEXT NOT NULL DEFAULT '#CCCCCC',
                done             INTEGER NOT NULL DEFAULT 0,
                priority         INTEGER,
                created_at       TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_scheduled_at ON tasks(scheduled_at);
            CREATE INDEX IF NOT EXISTS idx_tasks_project_id ON tasks(project_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_series_id ON tasks(series_id);

            CREATE TABLE IF NOT EXISTS habits (
                id               TEXT PRIMARY KEY,
                goal_id          TEXT NOT NULL,
                title            TEXT NOT NULL,
                description      TEXT,
                color            TEXT NOT NULL DEFAULT '#CCCCCC',
                active           INTEGER NOT NULL DEFAULT 1,
                anchor_date      TEXT NOT NULL,
                clock_time       TEXT NOT NULL,
                days_mask        INTEGER NOT NULL DEFAULT 0,
                end_date         TEXT,
                duration_minutes INTEGER NOT NULL DEFAULT 25,
                created_at       TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_habits_goal_id ON habits(goal_id);
            CREATE INDEX IF NOT EXISTS idx_habits_active ON habits(active);

            CREATE TABLE IF NOT EXISTS habit_logs (
                habit_id TEXT NOT NULL,
                done_on  TEXT NOT NULL,
                PRIMARY KEY (habit_id, done_on)
            );

            CREATE INDEX IF NOT EXISTS idx_habit_logs_done_on ON habit_logs(done_on);",
        )?;

        // Run incremental migrations (v1 -> v2, etc.)
        migrations::migrate(&self.conn)?;

        Ok(())
    }

    fn exists(&self, table: &str, id: &str) -> Result<bool> {
        let query = format!("SELECT 1 FROM {table} WHERE id = ?1");
        let found: Option<i64> = self
            .conn
            .query_row(&query, params![id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    fn in_transaction<T>(&self, body: impl FnOnce() -> Result<T>) -> Result<T> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        match body() {
            Ok(value) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }

    // === Project CRUD ===

    /// Create a new project.
    pub fn create_project(&self, project: &Project) -> Result<()> {
        self.conn.execute(
            "INSERT INTO projects (id, title, description, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                project.id,
                project.title,
                project.description,
                project.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a project by ID.
    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, created_at FROM projects WHERE id = ?1",
        )?;
        Ok(stmt.query_row(params![id], row_to_project).optional()?)
    }

    /// List all projects.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, created_at FROM projects ORDER BY created_at ASC",
        )?;
        let projects = stmt.query_map([], row_to_project)?;
        Ok(projects.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Update a project.
    pub fn update_project(&self, project: &Project) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE projects SET title = ?1, description = ?2 WHERE id = ?3",
            params![project.title, project.description, project.id],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                kind: "Project",
                id: project.id.clone(),
            });
        }
        Ok(())
    }

    /// Delete a project, detaching its tasks.
    pub fn delete_project(&self, id: &str) -> Result<()> {
        if !self.exists("projects", id)? {
            return Err(CoreError::NotFound {
                kind: "Project",
                id: id.to_string(),
            });
        }
        self.in_transaction(|| {
            self.conn.execute(
                "UPDATE tasks SET project_id = NULL WHERE project_id = ?1",
                params![id],
            )?;
            self.conn
                .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
            Ok(())
        })
    }

    // === Goal CRUD ===

    /// Create a new goal.
    pub fn create_goal(&self, goal: &Goal) -> Result<()> {
        self.conn.execute(
            "INSERT INTO goals (id, title, description, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                goal.id,
                goal.title,
                goal.description,
                goal.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a goal by ID.
    pub fn get_goal(&self, id: &str) -> Result<Option<Goal>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, description, created_at FROM goals WHERE id = ?1")?;
        Ok(stmt.query_row(params![id], row_to_goal).optional()?)
    }

    /// List all goals.
    pub fn list_goals(&self) -> Result<Vec<Goal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, created_at FROM goals ORDER BY created_at ASC",
        )?;
        let goals = stmt.query_map([], row_to_goal)?;
        Ok(goals.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Update a goal.
    pub fn update_goal(&self, goal: &Goal) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE goals SET title = ?1, description = ?2 WHERE id = ?3",
            params![goal.title, goal.description, goal.id],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                kind: "Goal",
                id: goal.id.clone(),
            });
        }
        Ok(())
    }

    /// Delete a goal together with its habits and their logs.
    pub fn delete_goal(&self, id: &str) -> Result<()> {
        if !self.exists("goals", id)? {
            return Err(CoreError::NotFound {
                kind: "Goal",
                id: id.to_string(),
            });
        }
        self.in_transaction(|| {
            self.conn.execute(
                "DELETE FROM habit_logs WHERE habit_id IN (SELECT id FROM habits WHERE goal_id = ?1)",
                params![id],
            )?;
            self.conn
                .execute("DELETE FROM habits WHERE goal_id = ?1", params![id])?;
            self.conn
                .execute("DELETE FROM goals WHERE id = ?1", params![id])?;
            Ok(())
        })
    }

    // === Task CRUD ===

    fn next_task_position(&self, project_id: Option<&str>) -> Result<i64> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(position) FROM tasks WHERE project_id IS ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(max.map_or(0, |m| m + 1))
    }

    fn insert_task(&self, task: &Task) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tasks (
                id, project_id, series_id, title, description, scheduled_at,
                scheduled_for, duration_minutes, color, done, priority,
                created_at, pomodoro_count, position
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                task.id,
                task.project_id,
                task.series_id,
                task.title,
                task.description,
                format_scheduled_at(task.scheduled_at.as_ref()),
                task.scheduled_for.map(|d| d.to_string()),
                task.duration_minutes,
                task.color,
                task.done,
                task.priority.map(|p| p.value()),
                task.created_at.to_rfc3339(),
                task.pomodoro_count,
                task.position,
            ],
        )?;
        Ok(())
    }

    /// Create a new task, appending it to the end of its project's order.
    ///
    /// Returns the stored task with the assigned position. When the task
    /// names a project, the project must exist.
    pub fn create_task(&self, task: &Task) -> Result<Task> {
        if let Some(project_id) = task.project_id.as_deref() {
            if !self.exists("projects", project_id)? {
                return Err(CoreError::NotFound {
                    kind: "Project",
                    id: project_id.to_string(),
                });
            }
        }
        let mut stored = task.clone();
        stored.position = Some(self.next_task_position(task.project_id.as_deref())?);
        self.insert_task(&stored)?;
        Ok(stored)
    }

    /// Create a recurring series: one concrete row per occurrence of `rule`
    /// in `[rule.anchor_date, until]`, all sharing a fresh series id.
    ///
    /// All rows are inserted in one transaction; positions are appended in
    /// occurrence order.
    pub fn create_series(
        &self,
        prototype: &Task,
        rule: &RecurrenceRule,
        until: NaiveDate,
    ) -> Result<Vec<Task>> {
        if let Some(project_id) = prototype.project_id.as_deref() {
            if !self.exists("projects", project_id)? {
                return Err(CoreError::NotFound {
                    kind: "Project",
                    id: project_id.to_string(),
                });
            }
        }
        let tasks = prototype.series(rule, until)?;
        self.in_transaction(|| {
            let mut position = self.next_task_position(prototype.project_id.as_deref())?;
            let mut stored = Vec::with_capacity(tasks.len());
            for task in &tasks {
                let mut task = task.clone();
                task.position = Some(position);
                position += 1;
                self.insert_task(&task)?;
                stored.push(task);
            }
            Ok(stored)
        })
    }

    /// Get a task by ID.
    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))?;
        Ok(stmt.query_row(params![id], row_to_task).optional()?)
    }

    /// List all tasks, scheduled first in time order, undated last.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY scheduled_at IS NULL, scheduled_at ASC"
        ))?;
        let tasks = stmt.query_map([], row_to_task)?;
        Ok(tasks.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// List scheduled tasks within `[start, end]` (whole days, inclusive),
    /// ordered by time ascending.
    pub fn list_tasks_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Task>> {
        let start_at = start.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        let end_at = end.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap());
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE scheduled_at IS NOT NULL AND scheduled_at >= ?1 AND scheduled_at <= ?2
             ORDER BY scheduled_at ASC"
        ))?;
        let tasks = stmt.query_map(
            params![
                start_at.format(DATETIME_FMT).to_string(),
                end_at.format(DATETIME_FMT).to_string(),
            ],
            row_to_task,
        )?;
        Ok(tasks.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// List every member of a series in occurrence order.
    pub fn list_series(&self, series_id: &str) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE series_id = ?1 ORDER BY scheduled_at ASC"
        ))?;
        let tasks = stmt.query_map(params![series_id], row_to_task)?;
        Ok(tasks.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Update an existing task (full row).
    pub fn update_task(&self, task: &Task) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET project_id = ?1, series_id = ?2, title = ?3, description = ?4,
                 scheduled_at = ?5, scheduled_for = ?6, duration_minutes = ?7,
                 color = ?8, done = ?9, priority = ?10, pomodoro_count = ?11,
                 position = ?12
             WHERE id = ?13",
            params![
                task.project_id,
                task.series_id,
                task.title,
                task.description,
                format_scheduled_at(task.scheduled_at.as_ref()),
                task.scheduled_for.map(|d| d.to_string()),
                task.duration_minutes,
                task.color,
                task.done,
                task.priority.map(|p| p.value()),
                task.pomodoro_count,
                task.position,
                task.id,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                kind: "Task",
                id: task.id.clone(),
            });
        }
        Ok(())
    }

    /// Apply a field-wise patch to one task, or to every member of its
    /// series when `series` is set and the task belongs to one.
    ///
    /// Returns the updated rows.
    pub fn patch_task(&self, id: &str, patch: &TaskPatch, series: bool) -> Result<Vec<Task>> {
        let task = self.get_task(id)?.ok_or_else(|| CoreError::NotFound {
            kind: "Task",
            id: id.to_string(),
        })?;

        let mut targets = match task.series_id.as_deref() {
            Some(series_id) if series => self.list_series(series_id)?,
            _ => vec![task],
        };

        self.in_transaction(|| {
            for target in &mut targets {
                patch.apply(target);
                self.update_task(target)?;
            }
            Ok(())
        })?;
        Ok(targets)
    }

    /// Delete a task, or its whole series when `series` is set and the task
    /// belongs to one. Returns the number of rows deleted.
    pub fn delete_task(&self, id: &str, series: bool) -> Result<usize> {
        let task = self.get_task(id)?.ok_or_else(|| CoreError::NotFound {
            kind: "Task",
            id: id.to_string(),
        })?;

        let deleted = match task.series_id.as_deref() {
            Some(series_id) if series => self.conn.execute(
                "DELETE FROM tasks WHERE series_id = ?1",
                params![series_id],
            )?,
            _ => self
                .conn
                .execute("DELETE FROM tasks WHERE id = ?1", params![id])?,
        };
        Ok(deleted)
    }

    /// Reassign positions within a project scope from an explicit ordering.
    ///
    /// `ordered_ids` must cover exactly the tasks of the scope (the
    /// `project_id = None` scope holds loose tasks).
    pub fn reorder_tasks(&self, project_id: Option<&str>, ordered_ids: &[String]) -> Result<()> {
        if let Some(project_id) = project_id {
            if !self.exists("projects", project_id)? {
                return Err(CoreError::NotFound {
                    kind: "Project",
                    id: project_id.to_string(),
                });
            }
        }

        let mut stmt = self
            .conn
            .prepare("SELECT id FROM tasks WHERE project_id IS ?1")?;
        let current: HashSet<String> = stmt
            .query_map(params![project_id], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        let given: HashSet<String> = ordered_ids.iter().cloned().collect();
        if given != current || ordered_ids.len() != current.len() {
            return Err(CoreError::OrderMismatch);
        }

        self.in_transaction(|| {
            for (index, task_id) in ordered_ids.iter().enumerate() {
                self.conn.execute(
                    "UPDATE tasks SET position = ?1 WHERE id = ?2",
                    params![index as i64, task_id],
                )?;
            }
            Ok(())
        })
    }

    // === Habit CRUD ===

    fn next_habit_position(&self, goal_id: &str) -> Result<i64> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(position) FROM habits WHERE goal_id = ?1",
            params![goal_id],
            |row| row.get(0),
        )?;
        Ok(max.map_or(0, |m| m + 1))
    }

    /// Create a new habit under an existing goal, appending it to the end of
    /// the goal's order. Returns the stored habit with the assigned position.
    pub fn create_habit(&self, habit: &Habit) -> Result<Habit> {
        if !self.exists("goals", &habit.goal_id)? {
            return Err(CoreError::NotFound {
                kind: "Goal",
                id: habit.goal_id.clone(),
            });
        }

        let mut stored = habit.clone();
        stored.position = Some(self.next_habit_position(&habit.goal_id)?);

        self.conn.execute(
            "INSERT INTO habits (
                id, goal_id, title, description, color, active, anchor_date,
                clock_time, days_mask, end_date, duration_minutes, created_at,
                position
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                stored.id,
                stored.goal_id,
                stored.title,
                stored.description,
                stored.color,
                stored.active,
                stored.rule.anchor_date.to_string(),
                stored.rule.clock_time.format(TIME_FMT).to_string(),
                i64::from(stored.rule.active_weekdays.mask()),
                stored.rule.end_date.map(|d| d.to_string()),
                stored.duration_minutes,
                stored.created_at.to_rfc3339(),
                stored.position,
            ],
        )?;
        Ok(stored)
    }

    /// Get a habit by ID.
    pub fn get_habit(&self, id: &str) -> Result<Option<Habit>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"))?;
        Ok(stmt.query_row(params![id], row_to_habit).optional()?)
    }

    /// List habits, optionally scoped to one goal, ordered by goal then
    /// position.
    pub fn list_habits(&self, goal_id: Option<&str>) -> Result<Vec<Habit>> {
        let habits = match goal_id {
            Some(goal_id) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {HABIT_COLUMNS} FROM habits WHERE goal_id = ?1
                     ORDER BY position ASC, created_at ASC"
                ))?;
                let rows = stmt.query_map(params![goal_id], row_to_habit)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {HABIT_COLUMNS} FROM habits
                     ORDER BY goal_id ASC, position ASC, created_at ASC"
                ))?;
                let rows = stmt.query_map([], row_to_habit)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(habits)
    }

    /// Update an existing habit.
    pub fn update_habit(&self, habit: &Habit) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE habits
             SET goal_id = ?1, title = ?2, description = ?3, color = ?4,
                 active = ?5, anchor_date = ?6, clock_time = ?7, days_mask = ?8,
                 end_date = ?9, duration_minutes = ?10, position = ?11
             WHERE id = ?12",
            params![
                habit.goal_id,
                habit.title,
                habit.description,
                habit.color,
                habit.active,
                habit.rule.anchor_date.to_string(),
                habit.rule.clock_time.format(TIME_FMT).to_string(),
                i64::from(habit.rule.active_weekdays.mask()),
                habit.rule.end_date.map(|d| d.to_string()),
                habit.duration_minutes,
                habit.position,
                habit.id,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                kind: "Habit",
                id: habit.id.clone(),
            });
        }
        Ok(())
    }

    /// Delete a habit and its completion log.
    pub fn delete_habit(&self, id: &str) -> Result<()> {
        if !self.exists("habits", id)? {
            return Err(CoreError::NotFound {
                kind: "Habit",
                id: id.to_string(),
            });
        }
        self.in_transaction(|| {
            self.conn
                .execute("DELETE FROM habit_logs WHERE habit_id = ?1", params![id])?;
            self.conn
                .execute("DELETE FROM habits WHERE id = ?1", params![id])?;
            Ok(())
        })
    }

    /// Total and active habit counts.
    pub fn habit_stats(&self) -> Result<HabitStats> {
        let (total, active): (u32, u32) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN active THEN 1 ELSE 0 END), 0)
             FROM habits",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(HabitStats {
            total_habits: total,
            active_habits: active,
        })
    }

    // === Completion log ===

    /// Record a completion for a date. Marking an already-marked date is a
    /// no-op; the (habit, date) pair stays unique.
    pub fn mark_habit(&self, habit_id: &str, done_on: NaiveDate) -> Result<()> {
        if !self.exists("habits", habit_id)? {
            return Err(CoreError::NotFound {
                kind: "Habit",
                id: habit_id.to_string(),
            });
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO habit_logs (habit_id, done_on) VALUES (?1, ?2)",
            params![habit_id, done_on.to_string()],
        )?;
        Ok(())
    }

    /// Remove a completion. Removing an absent pair is a no-op.
    pub fn unmark_habit(&self, habit_id: &str, done_on: NaiveDate) -> Result<()> {
        self.conn.execute(
            "DELETE FROM habit_logs WHERE habit_id = ?1 AND done_on = ?2",
            params![habit_id, done_on.to_string()],
        )?;
        Ok(())
    }

    /// All completion dates recorded for a habit.
    pub fn habit_completions(&self, habit_id: &str) -> Result<BTreeSet<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT done_on FROM habit_logs WHERE habit_id = ?1")?;
        let mut rows = stmt.query(params![habit_id])?;
        let mut dates = BTreeSet::new();
        while let Some(row) = rows.next()? {
            let done_on: String = row.get(0)?;
            if let Ok(date) = NaiveDate::parse_from_str(&done_on, DATE_FMT) {
                dates.insert(date);
            }
        }
        Ok(dates)
    }

    // === Progress ===

    /// Compute a fresh weekly snapshot for every habit.
    ///
    /// The whole log tail (from the earliest anchor onward) is fetched in
    /// one query and indexed per habit before the pure per-habit
    /// computation runs.
    pub fn progress_all(&self, today: NaiveDate) -> Result<Vec<HabitProgress>> {
        let habits = self.list_habits(None)?;
        if habits.is_empty() {
            return Ok(Vec::new());
        }

        let min_anchor = habits
            .iter()
            .map(|h| h.rule.anchor_date)
            .min()
            .unwrap_or(today);

        let mut stmt = self
            .conn
            .prepare("SELECT habit_id, done_on FROM habit_logs WHERE done_on >= ?1")?;
        let mut rows = stmt.query(params![min_anchor.to_string()])?;
        let mut by_habit: HashMap<String, BTreeSet<NaiveDate>> = HashMap::new();
        while let Some(row) = rows.next()? {
            let habit_id: String = row.get(0)?;
            let done_on: String = row.get(1)?;
            if let Ok(date) = NaiveDate::parse_from_str(&done_on, DATE_FMT) {
                by_habit.entry(habit_id).or_default().insert(date);
            }
        }

        let empty = BTreeSet::new();
        Ok(habits
            .iter()
            .map(|habit| {
                let log = by_habit.get(&habit.id).unwrap_or(&empty);
                HabitProgress {
                    habit_id: habit.id.clone(),
                    active: habit.active,
                    progress: progress::snapshot(&habit.rule, log, today),
                }
            })
            .collect())
    }
}

impl HabitRepository for OrganizerDb {
    fn rule(&self, habit_id: &str) -> Result<RecurrenceRule> {
        let habit = self.get_habit(habit_id)?.ok_or_else(|| CoreError::NotFound {
            kind: "Habit",
            id: habit_id.to_string(),
        })?;
        Ok(habit.rule)
    }

    fn completions(&self, habit_id: &str) -> Result<BTreeSet<NaiveDate>> {
        self.habit_completions(habit_id)
    }

    fn mark(&self, habit_id: &str, done_on: NaiveDate) -> Result<()> {
        self.mark_habit(habit_id, done_on)
    }

    fn unmark(&self, habit_id: &str, done_on: NaiveDate) -> Result<()> {
        self.unmark_habit(habit_id, done_on)
    }
}
