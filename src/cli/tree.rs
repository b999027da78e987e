//! Budget tree CLI commands
//!
//! Every command opens the project, applies one edit, runs the pending
//! recomputation and saves. Positions are one-based dotted paths as shown
//! by `project show`: `2` is a category, `2.1` a subcategory and `2.1.3`
//! an expense line.

use clap::Subcommand;

use super::report_outcome;
use crate::config::settings::Settings;
use crate::display::project::format_project_tree;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Money, NodePath};
use crate::services::{EditOutcome, ProjectService};
use crate::storage::Storage;

/// Tree subcommands
#[derive(Subcommand)]
pub enum TreeCommands {
    /// Add a category
    #[command(name = "add-category")]
    AddCategory {
        /// Project name, ID or ID prefix
        project: String,
        /// Category name
        name: String,
    },

    /// Add a subcategory under a category
    #[command(name = "add-subcategory")]
    AddSubcategory {
        /// Project name, ID or ID prefix
        project: String,
        /// Category position (e.g. 2)
        category: String,
        /// Subcategory name
        name: String,
    },

    /// Add an expense line under a subcategory
    #[command(name = "add-line")]
    AddLine {
        /// Project name, ID or ID prefix
        project: String,
        /// Subcategory position (e.g. 2.1)
        subcategory: String,
        /// Line name
        name: String,
        /// Amount (e.g. "€ 120,50" or "120.50")
        #[arg(allow_hyphen_values = true, default_value = "0")]
        amount: String,
    },

    /// Remove a category and everything below it
    #[command(name = "remove-category")]
    RemoveCategory {
        /// Project name, ID or ID prefix
        project: String,
        /// Category position (e.g. 2)
        category: String,
    },

    /// Remove a subcategory and its lines
    #[command(name = "remove-subcategory")]
    RemoveSubcategory {
        /// Project name, ID or ID prefix
        project: String,
        /// Subcategory position (e.g. 2.1)
        subcategory: String,
    },

    /// Remove an expense line
    #[command(name = "remove-line")]
    RemoveLine {
        /// Project name, ID or ID prefix
        project: String,
        /// Line position (e.g. 2.1.3)
        line: String,
    },

    /// Set the amount of any node
    #[command(name = "set-amount")]
    SetAmount {
        /// Project name, ID or ID prefix
        project: String,
        /// Node position (e.g. 2, 2.1 or 2.1.3)
        path: String,
        /// Amount
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Rename any node
    Rename {
        /// Project name, ID or ID prefix
        project: String,
        /// Node position (e.g. 2, 2.1 or 2.1.3)
        path: String,
        /// New name
        name: String,
    },
}

/// Parse a position and check it has the expected depth
fn parse_path(text: &str, expected: &str) -> BudgetResult<NodePath> {
    let path: NodePath = text.parse()?;
    let depth_ok = match (path, expected) {
        (NodePath::Category(_), "category") => true,
        (NodePath::Subcategory(..), "subcategory") => true,
        (NodePath::Line(..), "line") => true,
        (_, "any") => true,
        _ => false,
    };

    if depth_ok {
        Ok(path)
    } else {
        Err(BudgetError::Validation(format!(
            "'{}' is not a {} position",
            text, expected
        )))
    }
}

fn print_outcome(outcome: &EditOutcome, settings: &Settings) -> BudgetResult<()> {
    if let Some(path) = outcome.path {
        println!("Added {}", path);
    }
    print!("{}", format_project_tree(&outcome.project, settings));
    report_outcome(outcome)
}

/// Handle a tree command
pub fn handle_tree_command(
    storage: &Storage,
    settings: &Settings,
    cmd: TreeCommands,
) -> BudgetResult<()> {
    let service = ProjectService::new(storage, settings);

    let outcome = match cmd {
        TreeCommands::AddCategory { project, name } => {
            let project = service.find(&project)?;
            service.add_category(&project.id, &name)?
        }

        TreeCommands::AddSubcategory {
            project,
            category,
            name,
        } => {
            let project = service.find(&project)?;
            let c = parse_path(&category, "category")?.category_index();
            service.add_subcategory(&project.id, c, &name)?
        }

        TreeCommands::AddLine {
            project,
            subcategory,
            name,
            amount,
        } => {
            let project = service.find(&project)?;
            let (c, s) = match parse_path(&subcategory, "subcategory")? {
                NodePath::Subcategory(c, s) => (c, s),
                other => {
                    return Err(BudgetError::Validation(format!(
                        "'{}' is not a subcategory position",
                        other
                    )))
                }
            };
            service.add_line(&project.id, c, s, &name, Money::parse_lenient(&amount))?
        }

        TreeCommands::RemoveCategory { project, category } => {
            let project = service.find(&project)?;
            service.remove(&project.id, parse_path(&category, "category")?)?
        }

        TreeCommands::RemoveSubcategory {
            project,
            subcategory,
        } => {
            let project = service.find(&project)?;
            service.remove(&project.id, parse_path(&subcategory, "subcategory")?)?
        }

        TreeCommands::RemoveLine { project, line } => {
            let project = service.find(&project)?;
            service.remove(&project.id, parse_path(&line, "line")?)?
        }

        TreeCommands::SetAmount {
            project,
            path,
            amount,
        } => {
            let project = service.find(&project)?;
            let path = parse_path(&path, "any")?;
            service.set_amount(&project.id, path, Money::parse_lenient(&amount))?
        }

        TreeCommands::Rename {
            project,
            path,
            name,
        } => {
            let project = service.find(&project)?;
            service.rename(&project.id, parse_path(&path, "any")?, &name)?
        }
    };

    print_outcome(&outcome, settings)
}
