//! Project CLI commands
//!
//! Implements CLI commands for creating, inspecting and recomputing projects.

use chrono::{Local, NaiveDate};
use clap::Subcommand;

use super::report_outcome;
use crate::config::settings::Settings;
use crate::display::project::{
    format_history, format_project_details, format_project_list, format_reconciliation,
};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Money, ProjectStatus, ProjectTemplate};
use crate::services::ProjectService;
use crate::storage::Storage;

/// Project subcommands
#[derive(Subcommand)]
pub enum ProjectCommands {
    /// List all projects, including unmigrated legacy ones
    List,

    /// Create a new project
    Create {
        /// Project name
        name: String,
        /// Start date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(short, long)]
        end: Option<String>,
        /// Starter categories (empty, personal-budget, wedding, travel, renovation, event)
        #[arg(short, long, default_value = "empty")]
        template: String,
        /// Currency symbol recorded for this project
        #[arg(short, long)]
        currency: Option<String>,
    },

    /// Show project details and its budget tree
    Show {
        /// Project name, ID or ID prefix
        project: String,
    },

    /// Delete a project
    Delete {
        /// Project name, ID or ID prefix
        project: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Change a project's status
    Status {
        /// Project name, ID or ID prefix
        project: String,
        /// New status (in-progress, completed, archived)
        status: String,
    },

    /// Recompute the tree and reconcile the total budget
    Recompute {
        /// Project name, ID or ID prefix
        project: String,
    },

    /// Set the total budget (e.g. "€ 1500,00"; 0 restores the previous total)
    #[command(name = "set-total")]
    SetTotal {
        /// Project name, ID or ID prefix
        project: String,
        /// Amount
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Show the audit history of a project
    History {
        /// Project name, ID or ID prefix
        project: String,
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn parse_date(text: &str) -> BudgetResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
        BudgetError::Validation(format!("Invalid date '{}' (expected YYYY-MM-DD)", text))
    })
}

/// Handle a project command
pub fn handle_project_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ProjectCommands,
) -> BudgetResult<()> {
    let service = ProjectService::new(storage, settings);

    match cmd {
        ProjectCommands::List => {
            let listings = service.list()?;
            print!("{}", format_project_list(&listings, settings));
        }

        ProjectCommands::Create {
            name,
            start,
            end,
            template,
            currency,
        } => {
            let start = match start {
                Some(s) => parse_date(&s)?,
                None => Local::now().date_naive(),
            };
            let end = end.as_deref().map(parse_date).transpose()?;
            let template: ProjectTemplate = template.parse()?;

            let project = service.create(&name, start, end, template, currency.as_deref())?;

            println!("Created project: {}", project.name);
            println!("  Template: {}", template);
            println!("  Categories: {}", project.categories.len());
            println!("  ID: {}", project.id);
        }

        ProjectCommands::Show { project } => {
            let project = service.find(&project)?;
            print!("{}", format_project_details(&project, settings));
        }

        ProjectCommands::Delete { project, force } => {
            let project = service.find(&project)?;

            if !force {
                println!(
                    "This will delete '{}' and its whole budget tree.",
                    project.name
                );
                println!("To proceed, run again with --force flag:");
                println!("  budgetplan project delete {} --force", project.id);
                return Ok(());
            }

            let deleted = service.delete(&project.id)?;
            println!("Deleted project: {}", deleted.name);
        }

        ProjectCommands::Status { project, status } => {
            let project = service.find(&project)?;
            let status: ProjectStatus = status.parse()?;
            let updated = service.set_status(&project.id, status)?;
            println!("{}: {}", updated.name, updated.status);
        }

        ProjectCommands::Recompute { project } => {
            let project = service.find(&project)?;
            let outcome = service.recompute(&project.id)?;
            if let Some(reconciliation) = &outcome.reconciliation {
                println!(
                    "{}",
                    format_reconciliation(&outcome.project, reconciliation, settings)
                );
            }
            report_outcome(&outcome)?;
        }

        ProjectCommands::SetTotal { project, amount } => {
            let project = service.find(&project)?;
            let outcome = service.set_total(&project.id, Money::parse_lenient(&amount))?;
            if let Some(reconciliation) = &outcome.reconciliation {
                println!(
                    "{}",
                    format_reconciliation(&outcome.project, reconciliation, settings)
                );
            }
            report_outcome(&outcome)?;
        }

        ProjectCommands::History { project, limit } => {
            let project = service.find(&project)?;
            let mut entries = storage.audit().read_for_project(project.id.as_str())?;
            let start = entries.len().saturating_sub(limit);
            println!("{}", format_history(&entries.split_off(start)));
        }
    }

    Ok(())
}
