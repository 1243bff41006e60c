//! Shared argument parsing helpers.

use cadence_core::{Priority, WeekdaySet};
use chrono::{NaiveDate, NaiveTime};

/// Parse a YYYY-MM-DD date argument.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("bad date {s:?}; expected YYYY-MM-DD"))
}

/// Parse a time argument, accepting HH:MM or HH:MM:SS.
pub fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| format!("bad time {s:?}; expected HH:MM or HH:MM:SS"))
}

/// Parse a comma-separated weekday list, Monday=0 through Sunday=6
/// (e.g. "0,2,4" for Mon/Wed/Fri).
pub fn parse_days(s: &str) -> Result<WeekdaySet, String> {
    let mut days = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let day: u8 = part.parse().map_err(|_| format!("bad weekday {part:?}"))?;
        days.push(day);
    }
    WeekdaySet::new(&days).map_err(|e| e.to_string())
}

/// Parse a priority name.
pub fn parse_priority(s: &str) -> Result<Priority, String> {
    match s {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        "urgent" => Ok(Priority::Urgent),
        _ => Err(format!("bad priority {s:?}; expected low, medium, high, or urgent")),
    }
}
