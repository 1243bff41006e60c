//! Goal management commands for CLI.

use cadence_core::{Goal, OrganizerDb};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum GoalAction {
    /// Create a new goal
    Create {
        /// Goal title
        title: String,
        /// Goal description
        #[arg(long)]
        description: Option<String>,
    },
    /// List goals
    List,
    /// Update a goal
    Update {
        /// Goal ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a goal and all of its habits
    Delete {
        /// Goal ID
        id: String,
    },
}

pub fn run(action: GoalAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = OrganizerDb::open()?;

    match action {
        GoalAction::Create { title, description } => {
            let mut goal = Goal::new(title);
            goal.description = description;
            db.create_goal(&goal)?;
            println!("Goal created: {}", goal.id);
            println!("{}", serde_json::to_string_pretty(&goal)?);
        }
        GoalAction::List => {
            let goals = db.list_goals()?;
            println!("{}", serde_json::to_string_pretty(&goals)?);
        }
        GoalAction::Update {
            id,
            title,
            description,
        } => {
            let mut goal = db.get_goal(&id)?.ok_or(format!("Goal not found: {id}"))?;
            if let Some(t) = title {
                goal.title = t;
            }
            if let Some(d) = description {
                goal.description = Some(d);
            }
            db.update_goal(&goal)?;
            println!("Goal updated:");
            println!("{}", serde_json::to_string_pretty(&goal)?);
        }
        GoalAction::Delete { id } => {
            db.delete_goal(&id)?;
            println!("Goal deleted: {id}");
        }
    }

    Ok(())
}
