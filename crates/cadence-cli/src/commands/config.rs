//! Configuration management commands for CLI.

use cadence_core::Config;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Set default values for new entries
    Set {
        /// Default task duration in minutes
        #[arg(long)]
        task_duration: Option<i64>,
        /// Default habit duration in minutes
        #[arg(long)]
        habit_duration: Option<i64>,
        /// Default color as #RRGGBB
        #[arg(long)]
        color: Option<String>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Set {
            task_duration,
            habit_duration,
            color,
        } => {
            let mut config = Config::load()?;
            if let Some(minutes) = task_duration {
                config.defaults.task_duration_minutes = minutes;
            }
            if let Some(minutes) = habit_duration {
                config.defaults.habit_duration_minutes = minutes;
            }
            if let Some(color) = color {
                config.defaults.color = color;
            }
            config.save()?;
            println!("Configuration saved");
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
