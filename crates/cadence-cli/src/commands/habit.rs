//! Habit management commands for CLI.

use cadence_core::{
    expand_occurrences, get_progress, Config, Habit, OrganizerDb, RecurrenceRule, WeekdaySet,
};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::Subcommand;

use crate::common;

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit under a goal
    Create {
        /// Habit title
        title: String,
        /// Owning goal ID
        #[arg(long)]
        goal_id: String,
        /// Habit description
        #[arg(long)]
        description: Option<String>,
        /// Color as #RRGGBB (default from config)
        #[arg(long)]
        color: Option<String>,
        /// First possible occurrence date (YYYY-MM-DD)
        #[arg(long, value_parser = common::parse_date)]
        start: NaiveDate,
        /// Time of day (HH:MM)
        #[arg(long, value_parser = common::parse_time)]
        time: NaiveTime,
        /// Active weekdays, Monday=0 (e.g. "0,2,4")
        #[arg(long, value_parser = common::parse_days)]
        days: WeekdaySet,
        /// Last scheduled date (YYYY-MM-DD), inclusive; omit for unbounded
        #[arg(long, value_parser = common::parse_date)]
        until: Option<NaiveDate>,
        /// Duration in minutes (default from config)
        #[arg(long)]
        duration: Option<i64>,
    },
    /// List habits
    List {
        /// Filter by goal ID
        #[arg(long)]
        goal_id: Option<String>,
    },
    /// Get habit details
    Get {
        /// Habit ID
        id: String,
    },
    /// Update a habit
    Update {
        /// Habit ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New color
        #[arg(long)]
        color: Option<String>,
        /// Set active status
        #[arg(long)]
        active: Option<bool>,
        /// New first occurrence date (YYYY-MM-DD)
        #[arg(long, value_parser = common::parse_date)]
        start: Option<NaiveDate>,
        /// New time of day (HH:MM)
        #[arg(long, value_parser = common::parse_time)]
        time: Option<NaiveTime>,
        /// New active weekdays, Monday=0
        #[arg(long, value_parser = common::parse_days)]
        days: Option<WeekdaySet>,
        /// New last scheduled date (YYYY-MM-DD)
        #[arg(long, value_parser = common::parse_date, conflicts_with = "clear_until")]
        until: Option<NaiveDate>,
        /// Make the habit unbounded
        #[arg(long)]
        clear_until: bool,
        /// New duration in minutes
        #[arg(long)]
        duration: Option<i64>,
    },
    /// Delete a habit and its completion log
    Delete {
        /// Habit ID
        id: String,
    },
    /// Mark a completion (marking the same day twice is a no-op)
    Mark {
        /// Habit ID
        id: String,
        /// Completion date (YYYY-MM-DD), default today
        #[arg(long, value_parser = common::parse_date)]
        date: Option<NaiveDate>,
    },
    /// Remove a completion (removing an absent one is a no-op)
    Unmark {
        /// Habit ID
        id: String,
        /// Completion date (YYYY-MM-DD), default today
        #[arg(long, value_parser = common::parse_date)]
        date: Option<NaiveDate>,
    },
    /// Weekly progress: target, done count, and streak
    Progress {
        /// Habit ID; omit for every habit
        id: Option<String>,
        /// Reference date (YYYY-MM-DD), default today
        #[arg(long, value_parser = common::parse_date)]
        today: Option<NaiveDate>,
    },
    /// Habit counts
    Stats,
    /// Concrete occurrences of a habit's schedule within a range
    Expand {
        /// Habit ID
        id: String,
        /// Range start (YYYY-MM-DD)
        #[arg(long, value_parser = common::parse_date)]
        from: NaiveDate,
        /// Range end (YYYY-MM-DD)
        #[arg(long, value_parser = common::parse_date)]
        to: NaiveDate,
    },
}

pub fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = OrganizerDb::open()?;

    match action {
        HabitAction::Create {
            title,
            goal_id,
            description,
            color,
            start,
            time,
            days,
            until,
            duration,
        } => {
            let config = Config::load()?;
            let rule = RecurrenceRule::new(start, time, days, until)?;
            let mut habit = Habit::new(goal_id, title, rule);
            habit.description = description;
            habit.color = color.unwrap_or_else(|| config.defaults.color.clone());
            habit.duration_minutes = duration.unwrap_or(config.defaults.habit_duration_minutes);

            let habit = db.create_habit(&habit)?;
            println!("Habit created: {}", habit.id);
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::List { goal_id } => {
            let habits = db.list_habits(goal_id.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&habits)?);
        }
        HabitAction::Get { id } => match db.get_habit(&id)? {
            Some(habit) => println!("{}", serde_json::to_string_pretty(&habit)?),
            None => println!("Habit not found: {id}"),
        },
        HabitAction::Update {
            id,
            title,
            description,
            color,
            active,
            start,
            time,
            days,
            until,
            clear_until,
            duration,
        } => {
            let mut habit = db.get_habit(&id)?.ok_or(format!("Habit not found: {id}"))?;
            if let Some(t) = title {
                habit.title = t;
            }
            if let Some(d) = description {
                habit.description = Some(d);
            }
            if let Some(c) = color {
                habit.color = c;
            }
            if let Some(a) = active {
                habit.active = a;
            }
            if let Some(t) = time {
                habit.rule.clock_time = t;
            }
            if let Some(d) = days {
                habit.rule.active_weekdays = d;
            }
            let anchor = start.unwrap_or(habit.rule.anchor_date);
            let end = if clear_until {
                None
            } else {
                until.or(habit.rule.end_date)
            };
            habit.rule.set_bounds(anchor, end)?;
            if let Some(d) = duration {
                habit.duration_minutes = d;
            }

            db.update_habit(&habit)?;
            println!("Habit updated:");
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Delete { id } => {
            db.delete_habit(&id)?;
            println!("Habit deleted: {id}");
        }
        HabitAction::Mark { id, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            db.mark_habit(&id, date)?;
            println!("Marked {id} done on {date}");
        }
        HabitAction::Unmark { id, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            db.unmark_habit(&id, date)?;
            println!("Unmarked {id} on {date}");
        }
        HabitAction::Progress { id, today } => {
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            match id {
                Some(id) => {
                    let snapshot = get_progress(&db, &id, today)?;
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                }
                None => {
                    let rows = db.progress_all(today)?;
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
            }
        }
        HabitAction::Stats => {
            let stats = db.habit_stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        HabitAction::Expand { id, from, to } => {
            let occurrences = expand_occurrences(&db, &id, from, to)?;
            let formatted: Vec<String> = occurrences
                .iter()
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .collect();
            println!("{}", serde_json::to_string_pretty(&formatted)?);
        }
    }

    Ok(())
}
