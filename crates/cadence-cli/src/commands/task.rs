//! Task management commands for CLI.
//!
//! `task create` covers all three task shapes: undated, scheduled once
//! (--date and --time), or a recurring series (--days plus --until, which
//! inserts one row per occurrence).

use cadence_core::{
    Config, OrganizerDb, Priority, RecurrenceRule, SchedulePatch, Task, TaskPatch, WeekdaySet,
};
use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;

use crate::common;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task: undated, scheduled once, or a recurring series
    Create {
        /// Task title
        title: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Project ID to associate with
        #[arg(long)]
        project_id: Option<String>,
        /// Date (YYYY-MM-DD); with --time, schedules the task
        #[arg(long, value_parser = common::parse_date)]
        date: Option<NaiveDate>,
        /// Time of day (HH:MM)
        #[arg(long, value_parser = common::parse_time)]
        time: Option<NaiveTime>,
        /// Active weekdays for a series, Monday=0 (e.g. "0,2,4");
        /// requires --date, --time, and --until
        #[arg(long, value_parser = common::parse_days)]
        days: Option<WeekdaySet>,
        /// Last series date (YYYY-MM-DD), inclusive
        #[arg(long, value_parser = common::parse_date)]
        until: Option<NaiveDate>,
        /// Duration in minutes (default from config)
        #[arg(long)]
        duration: Option<i64>,
        /// Color as #RRGGBB (default from config)
        #[arg(long)]
        color: Option<String>,
        /// Priority: low, medium, high, or urgent
        #[arg(long, value_parser = common::parse_priority)]
        priority: Option<Priority>,
    },
    /// List tasks, optionally within a date range
    List {
        /// Range start (YYYY-MM-DD)
        #[arg(long, value_parser = common::parse_date, requires = "end")]
        start: Option<NaiveDate>,
        /// Range end (YYYY-MM-DD)
        #[arg(long, value_parser = common::parse_date, requires = "start")]
        end: Option<NaiveDate>,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Update a task, or its whole series with --series
    Update {
        /// Task ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New duration in minutes
        #[arg(long)]
        duration: Option<i64>,
        /// New color
        #[arg(long)]
        color: Option<String>,
        /// Set done status
        #[arg(long)]
        done: Option<bool>,
        /// New priority
        #[arg(long, value_parser = common::parse_priority)]
        priority: Option<Priority>,
        /// New pomodoro count
        #[arg(long)]
        pomodoros: Option<i64>,
        /// Reschedule: date (YYYY-MM-DD), requires --time
        #[arg(long, value_parser = common::parse_date, requires = "time")]
        date: Option<NaiveDate>,
        /// Reschedule: time of day (HH:MM), requires --date
        #[arg(long, value_parser = common::parse_time, requires = "date")]
        time: Option<NaiveTime>,
        /// Clear the schedule, making the task undated
        #[arg(long, conflicts_with_all = ["date", "time"])]
        clear_schedule: bool,
        /// Apply to every member of the task's series
        #[arg(long)]
        series: bool,
    },
    /// Delete a task, or its whole series with --series
    Delete {
        /// Task ID
        id: String,
        /// Delete every member of the task's series
        #[arg(long)]
        series: bool,
    },
    /// Reassign task order within a project from an explicit ID list
    Reorder {
        /// Project scope; omit for tasks without a project
        #[arg(long)]
        project_id: Option<String>,
        /// Every task ID of the scope, in the desired order
        #[arg(required = true)]
        task_ids: Vec<String>,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = OrganizerDb::open()?;

    match action {
        TaskAction::Create {
            title,
            description,
            project_id,
            date,
            time,
            days,
            until,
            duration,
            color,
            priority,
        } => {
            let config = Config::load()?;
            let mut task = Task::new(title);
            task.description = description;
            task.project_id = project_id;
            task.duration_minutes = duration.unwrap_or(config.defaults.task_duration_minutes);
            task.color = color.unwrap_or_else(|| config.defaults.color.clone());
            task.priority = priority;

            match (days, date, time) {
                (Some(days), Some(date), Some(time)) => {
                    let until =
                        until.ok_or("a series requires --until (no implicit horizon)")?;
                    let rule = RecurrenceRule::new(date, time, days, None)?;
                    let tasks = db.create_series(&task, &rule, until)?;
                    println!("Series created: {} tasks", tasks.len());
                    println!("{}", serde_json::to_string_pretty(&tasks)?);
                }
                (Some(_), _, _) => {
                    return Err("a series requires --date and --time".into());
                }
                (None, Some(date), Some(time)) => {
                    task.schedule(date, time);
                    let task = db.create_task(&task)?;
                    println!("Task created: {}", task.id);
                    println!("{}", serde_json::to_string_pretty(&task)?);
                }
                (None, None, None) => {
                    let task = db.create_task(&task)?;
                    println!("Task created: {}", task.id);
                    println!("{}", serde_json::to_string_pretty(&task)?);
                }
                _ => {
                    return Err("provide both --date and --time, or neither".into());
                }
            }
        }
        TaskAction::List { start, end } => {
            let tasks = match (start, end) {
                (Some(start), Some(end)) => db.list_tasks_between(start, end)?,
                _ => db.list_tasks()?,
            };
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        TaskAction::Get { id } => match db.get_task(&id)? {
            Some(task) => println!("{}", serde_json::to_string_pretty(&task)?),
            None => println!("Task not found: {id}"),
        },
        TaskAction::Update {
            id,
            title,
            description,
            duration,
            color,
            done,
            priority,
            pomodoros,
            date,
            time,
            clear_schedule,
            series,
        } => {
            let schedule = if clear_schedule {
                SchedulePatch::Clear
            } else if let (Some(date), Some(time)) = (date, time) {
                SchedulePatch::Set { date, time }
            } else {
                SchedulePatch::Keep
            };
            let patch = TaskPatch {
                title,
                description,
                duration_minutes: duration,
                color,
                done,
                priority,
                project_id: None,
                pomodoro_count: pomodoros,
                schedule,
            };
            let updated = db.patch_task(&id, &patch, series)?;
            println!("Updated {} task(s):", updated.len());
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        TaskAction::Delete { id, series } => {
            let deleted = db.delete_task(&id, series)?;
            println!("Deleted {deleted} task(s)");
        }
        TaskAction::Reorder {
            project_id,
            task_ids,
        } => {
            db.reorder_tasks(project_id.as_deref(), &task_ids)?;
            println!("Reordered {} task(s)", task_ids.len());
        }
    }

    Ok(())
}
