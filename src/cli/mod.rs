//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod backup;
pub mod project;
pub mod tree;

pub use backup::{handle_backup_command, BackupCommands};
pub use project::{handle_project_command, ProjectCommands};
pub use tree::{handle_tree_command, TreeCommands};

use crate::error::{BudgetError, BudgetResult};
use crate::services::EditOutcome;

/// Print the save notification; a failed save fails the command
fn report_outcome(outcome: &EditOutcome) -> BudgetResult<()> {
    if outcome.notification.is_error() {
        return Err(BudgetError::Storage(outcome.notification.message.clone()));
    }
    println!("{}", outcome.notification);
    Ok(())
}
