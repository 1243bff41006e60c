//! # Cadence Core Library
//!
//! This library provides the core business logic for the Cadence personal
//! organizer: projects, goals, tasks, and recurring habits. It implements a
//! CLI-first philosophy where all operations are available via a standalone
//! CLI binary built on top of the same core library.
//!
//! ## Architecture
//!
//! - **Recurrence**: A pure schedule expander that turns a rule (anchor
//!   date, time of day, active weekdays, optional end date) plus a date
//!   range into concrete occurrence timestamps
//! - **Progress**: Pure weekly target/done counts and backward-looking
//!   streak computation over a completion log
//! - **Storage**: SQLite-backed store for all entities and the completion
//!   log, plus TOML-based configuration
//! - **Repository seam**: Progress and expansion consume the
//!   [`HabitRepository`] trait, keeping persistence out of the computed core
//!
//! ## Key Components
//!
//! - [`RecurrenceRule`]: When a recurring entry is scheduled
//! - [`ProgressSnapshot`]: Weekly target, done count, and streak
//! - [`OrganizerDb`]: Entity and completion-log persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod habit;
pub mod progress;
pub mod recurrence;
pub mod repo;
pub mod schedule;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, RecurrenceError, Result};
pub use habit::{Habit, HabitProgress, HabitStats};
pub use progress::ProgressSnapshot;
pub use recurrence::{RecurrenceRule, WeekdaySet};
pub use repo::{expand_occurrences, get_progress, HabitRepository};
pub use schedule::{Goal, Priority, Project, SchedulePatch, Task, TaskPatch};
pub use storage::{Config, OrganizerDb};
