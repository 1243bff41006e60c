//! Core error types for cadence-core.
//!
//! This module defines the error hierarchy using thiserror. Recurrence
//! validation failures are deterministic and surfaced immediately at
//! construction or call time; storage and config failures wrap their
//! underlying causes.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Core error type for cadence-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Recurrence-rule validation or expansion errors
    #[error("Recurrence error: {0}")]
    Recurrence(#[from] RecurrenceError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A referenced row does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Reorder payload does not cover exactly the tasks of the scope
    #[error("Reorder list does not match the tasks of the target project")]
    OrderMismatch,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation failures for recurrence rules and their expansion.
///
/// All variants are local caller errors, reproducible for the same inputs.
/// A duplicate completion mark is NOT an error anywhere in the crate; it is
/// absorbed as an idempotent no-op.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceError {
    /// Expansion called with an inverted range
    #[error("Invalid range: from ({from}) is after to ({to})")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    /// Weekday value outside 0 (Monday) through 6 (Sunday)
    #[error("Invalid weekday {0}: expected 0 (Monday) through 6 (Sunday)")]
    InvalidWeekday(u8),

    /// end_date earlier than anchor_date
    #[error("Invalid date order: end_date ({end}) is before anchor_date ({anchor})")]
    InvalidDateOrder { anchor: NaiveDate, end: NaiveDate },

    /// Series creation matched no occurrence in its range
    #[error("No occurrence matches the rule in [{from}, {to}]")]
    EmptySeries { from: NaiveDate, to: NaiveDate },
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
