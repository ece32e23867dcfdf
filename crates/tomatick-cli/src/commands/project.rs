//! Project management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use tomatick_core::storage::{ConfigFile, Database};
use tomatick_core::{ManualClock, NullNotifier, Project, SessionController};
use uuid::Uuid;

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Create {
        /// Project name
        name: String,
        /// Short description
        #[arg(long, default_value = "")]
        description: String,
        /// Display color, e.g. "#667eea"
        #[arg(long)]
        color: Option<String>,
        /// Target number of pomodoros
        #[arg(long, default_value = "10")]
        goal: u32,
    },
    /// List all projects
    List,
    /// Select the project completed sessions are attributed to
    Select {
        /// Project id, or omit to clear the selection
        id: Option<String>,
    },
    /// Show the active project
    Active,
    /// Delete a project (existing log records become uncategorized)
    Delete {
        /// Project id
        id: String,
    },
}

pub fn run(action: ProjectAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        ProjectAction::Create {
            name,
            description,
            color,
            goal,
        } => {
            let project = Project {
                id: Uuid::new_v4().to_string(),
                name,
                description,
                color,
                goal_pomodoros: goal,
                completed_pomodoros: 0,
                total_time_secs: 0,
                created_at: Utc::now(),
            };
            db.create_project(&project)?;
            println!("Project created: {}", project.id);
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::List => {
            let projects = db.list_projects()?;
            println!("{}", serde_json::to_string_pretty(&projects)?);
        }
        ProjectAction::Select { id } => {
            if let Some(ref id) = id {
                if db.find_project(id)?.is_none() {
                    eprintln!("unknown project: {id}");
                    std::process::exit(1);
                }
            }
            let mut controller = SessionController::new(
                Box::new(ConfigFile),
                Box::new(db),
                Box::new(NullNotifier),
                Box::new(ManualClock::default()),
            );
            match id {
                Some(id) => {
                    controller.select_project(Some(id.clone()));
                    println!("active project: {id}");
                }
                None => {
                    controller.select_project(None);
                    println!("active project cleared");
                }
            }
        }
        ProjectAction::Active => {
            let controller = SessionController::new(
                Box::new(ConfigFile),
                Box::new(db),
                Box::new(NullNotifier),
                Box::new(ManualClock::default()),
            );
            match controller.active_project() {
                Some(id) => println!("{id}"),
                None => println!("no active project"),
            }
        }
        ProjectAction::Delete { id } => {
            db.delete_project(&id)?;
            println!("Project deleted: {id}");
        }
    }
    Ok(())
}
