//! Backup CLI commands
//!
//! Snapshots of the primary project collection: create, list, restore and
//! prune by the retention policy.

use clap::Subcommand;
use std::path::PathBuf;

use crate::backup::BackupManager;
use crate::config::settings::Settings;
use crate::error::{BudgetError, BudgetResult};
use crate::storage::Storage;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a new backup
    Create,

    /// List all available backups
    List,

    /// Restore the project collection from a backup
    Restore {
        /// Backup filename or path (use 'latest' for most recent)
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete old backups according to retention policy
    Prune,
}

/// Handle a backup command
pub fn handle_backup_command(
    storage: &Storage,
    settings: &Settings,
    cmd: BackupCommands,
) -> BudgetResult<()> {
    let manager = storage.backups();

    match cmd {
        BackupCommands::Create => {
            let (backup_path, deleted) = manager.create_backup_with_retention()?;
            println!("Backup created: {}", backup_path.display());
            if !deleted.is_empty() {
                println!("Pruned {} old backup(s).", deleted.len());
            }
        }

        BackupCommands::List => {
            let backups = manager.list_backups()?;

            if backups.is_empty() {
                println!("No backups found.");
                println!("Create one with: budgetplan backup create");
                return Ok(());
            }

            for (i, backup) in backups.iter().enumerate() {
                let monthly_marker = if backup.is_monthly { " [monthly]" } else { "" };
                println!(
                    "  {}. {} ({}, {}){}",
                    i + 1,
                    backup.filename,
                    backup.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                    format_size(backup.size_bytes),
                    monthly_marker,
                );
            }

            println!();
            println!("Total: {} backup(s)", backups.len());
        }

        BackupCommands::Restore { backup, force } => {
            let backup_path = resolve_backup_path(manager, &backup)?;
            let archive = manager.read_archive(&backup_path)?;

            println!("File: {}", backup_path.display());
            println!("Projects: {}", archive.projects.len());

            if !force {
                println!();
                println!("WARNING: This will overwrite the current project collection!");
                println!("To proceed, run again with --force flag:");
                println!("  budgetplan backup restore {} --force", backup);
                return Ok(());
            }

            let pre_restore = manager.create_backup()?;
            println!("Pre-restore backup saved: {}", pre_restore.display());

            let restored = manager.restore(&backup_path)?;
            println!("Restored {} project(s).", restored);
        }

        BackupCommands::Prune => {
            let deleted = manager.enforce_retention()?;
            println!(
                "Deleted {} backup(s) (keeping {} daily, {} monthly).",
                deleted.len(),
                settings.backup_retention.daily_count,
                settings.backup_retention.monthly_count
            );
        }
    }

    Ok(())
}

/// Resolve a backup identifier to a full path
fn resolve_backup_path(manager: &BackupManager, backup: &str) -> BudgetResult<PathBuf> {
    let not_found = || BudgetError::NotFound {
        entity_type: "Backup",
        identifier: backup.to_string(),
    };

    if backup.eq_ignore_ascii_case("latest") {
        return manager.get_latest_backup()?.map(|b| b.path).ok_or_else(not_found);
    }

    let path = PathBuf::from(backup);
    if path.exists() {
        return Ok(path);
    }

    [backup.to_string(), format!("{}.json", backup)]
        .iter()
        .map(|name| manager.backup_dir().join(name))
        .find(|p| p.exists())
        .ok_or_else(not_found)
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
