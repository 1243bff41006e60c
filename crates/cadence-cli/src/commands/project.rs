//! Project management commands for CLI.

use cadence_core::{OrganizerDb, Project};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Create {
        /// Project title
        title: String,
        /// Project description
        #[arg(long)]
        description: Option<String>,
    },
    /// List projects
    List,
    /// Get project details
    Get {
        /// Project ID
        id: String,
    },
    /// Update a project
    Update {
        /// Project ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a project (its tasks are detached, not deleted)
    Delete {
        /// Project ID
        id: String,
    },
}

pub fn run(action: ProjectAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = OrganizerDb::open()?;

    match action {
        ProjectAction::Create { title, description } => {
            let mut project = Project::new(title);
            project.description = description;
            db.create_project(&project)?;
            println!("Project created: {}", project.id);
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::List => {
            let projects = db.list_projects()?;
            println!("{}", serde_json::to_string_pretty(&projects)?);
        }
        ProjectAction::Get { id } => match db.get_project(&id)? {
            Some(project) => println!("{}", serde_json::to_string_pretty(&project)?),
            None => println!("Project not found: {id}"),
        },
        ProjectAction::Update {
            id,
            title,
            description,
        } => {
            let mut project = db
                .get_project(&id)?
                .ok_or(format!("Project not found: {id}"))?;
            if let Some(t) = title {
                project.title = t;
            }
            if let Some(d) = description {
                project.description = Some(d);
            }
            db.update_project(&project)?;
            println!("Project updated:");
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::Delete { id } => {
            db.delete_project(&id)?;
            println!("Project deleted: {id}");
        }
    }

    Ok(())
}
