//! Standalone recurrence expansion, without the store.
//!
//! Useful for previewing a schedule before creating a habit or series.

use cadence_core::{RecurrenceRule, WeekdaySet};
use chrono::{NaiveDate, NaiveTime};
use clap::Args;

use crate::common;

#[derive(Args)]
pub struct ExpandArgs {
    /// First possible occurrence date (YYYY-MM-DD)
    #[arg(long, value_parser = common::parse_date)]
    pub anchor: NaiveDate,
    /// Time of day (HH:MM)
    #[arg(long, value_parser = common::parse_time)]
    pub time: NaiveTime,
    /// Active weekdays, Monday=0 (e.g. "0,2,4")
    #[arg(long, value_parser = common::parse_days)]
    pub days: WeekdaySet,
    /// Last scheduled date (YYYY-MM-DD), inclusive; omit for unbounded
    #[arg(long, value_parser = common::parse_date)]
    pub until: Option<NaiveDate>,
    /// Range start (YYYY-MM-DD)
    #[arg(long, value_parser = common::parse_date)]
    pub from: NaiveDate,
    /// Range end (YYYY-MM-DD)
    #[arg(long, value_parser = common::parse_date)]
    pub to: NaiveDate,
}

pub fn run(args: ExpandArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rule = RecurrenceRule::new(args.anchor, args.time, args.days, args.until)?;
    let occurrences = rule.expand(args.from, args.to)?;
    let formatted: Vec<String> = occurrences
        .iter()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .collect();
    println!("{}", serde_json::to_string_pretty(&formatted)?);
    Ok(())
}
