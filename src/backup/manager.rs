//! Backup manager for the budget planner
//!
//! Handles rolling snapshots of the primary project collection with
//! configurable retention. Snapshots are dated JSON archives and double as
//! the last-resort location for project and total-budget recovery.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::paths::PlannerPaths;
use crate::config::settings::BackupRetention;
use crate::error::{BudgetError, BudgetResult};
use crate::storage::file_io::{read_json, write_json_atomic};
use crate::storage::projects::{read_collection, ProjectRecord};

const ARCHIVE_SCHEMA_VERSION: u32 = 1;

/// Metadata about a backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupInfo {
    pub filename: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    /// Oldest backup of its calendar month (kept longer)
    pub is_monthly: bool,
}

/// Backup archive format
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BackupArchive {
    pub schema_version: u32,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
}

/// Manages backup creation and retention
pub struct BackupManager {
    backup_dir: PathBuf,
    paths: PlannerPaths,
    retention: BackupRetention,
}

impl BackupManager {
    pub fn new(paths: PlannerPaths, retention: BackupRetention) -> Self {
        Self {
            backup_dir: paths.backup_dir(),
            paths,
            retention,
        }
    }

    pub fn backup_dir(&self) -> &PathBuf {
        &self.backup_dir
    }

    /// Snapshot the primary collection as it is on disk
    ///
    /// Returns the path to the created backup file.
    pub fn create_backup(&self) -> BudgetResult<PathBuf> {
        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| BudgetError::Io(format!("Failed to create backup directory: {}", e)))?;

        let mut now = Utc::now();
        let mut backup_path = self.backup_dir.join(backup_filename(&now));
        while backup_path.exists() {
            now += Duration::microseconds(1);
            backup_path = self.backup_dir.join(backup_filename(&now));
        }

        let archive = BackupArchive {
            schema_version: ARCHIVE_SCHEMA_VERSION,
            created_at: Some(now),
            projects: read_collection(&self.paths.projects_file())?,
        };
        write_json_atomic(&backup_path, &archive)?;

        info!(path = %backup_path.display(), projects = archive.projects.len(), "created backup");
        Ok(backup_path)
    }

    /// Read a backup archive
    pub fn read_archive(&self, path: &Path) -> BudgetResult<BackupArchive> {
        if !path.exists() {
            return Err(BudgetError::NotFound {
                entity_type: "Backup",
                identifier: path.display().to_string(),
            });
        }
        read_json(path)
    }

    /// Overwrite the primary collection with a backup's projects
    ///
    /// Returns the number of restored projects. Reload storage afterwards.
    pub fn restore(&self, path: &Path) -> BudgetResult<usize> {
        let archive = self.read_archive(path)?;
        if archive.schema_version > ARCHIVE_SCHEMA_VERSION {
            return Err(BudgetError::Validation(format!(
                "Backup schema version {} is newer than supported version {}",
                archive.schema_version, ARCHIVE_SCHEMA_VERSION
            )));
        }

        write_json_atomic(self.paths.projects_file(), &archive.projects)?;
        info!(path = %path.display(), projects = archive.projects.len(), "restored backup");
        Ok(archive.projects.len())
    }

    /// List all available backups, newest first
    pub fn list_backups(&self) -> BudgetResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)
            .map_err(|e| BudgetError::Io(format!("Failed to read backup directory: {}", e)))?
        {
            let entry = entry
                .map_err(|e| BudgetError::Io(format!("Failed to read directory entry: {}", e)))?;

            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                if let Some(info) = parse_backup_info(&path) {
                    backups.push(info);
                }
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        // The oldest backup of each month is the monthly one
        let mut seen_months = Vec::new();
        for backup in backups.iter_mut().rev() {
            let month = (backup.created_at.year(), backup.created_at.month());
            if !seen_months.contains(&month) {
                seen_months.push(month);
                backup.is_monthly = true;
            }
        }

        Ok(backups)
    }

    pub fn get_latest_backup(&self) -> BudgetResult<Option<BackupInfo>> {
        Ok(self.list_backups()?.into_iter().next())
    }

    /// Enforce retention policy by deleting old backups
    pub fn enforce_retention(&self) -> BudgetResult<Vec<PathBuf>> {
        let (monthly, daily): (Vec<_>, Vec<_>) = self
            .list_backups()?
            .into_iter()
            .partition(|b| b.is_monthly);

        let expired = daily
            .into_iter()
            .skip(self.retention.daily_count as usize)
            .chain(monthly.into_iter().skip(self.retention.monthly_count as usize));

        let mut deleted = Vec::new();
        for backup in expired {
            fs::remove_file(&backup.path)
                .map_err(|e| BudgetError::Io(format!("Failed to delete old backup: {}", e)))?;
            deleted.push(backup.path);
        }

        Ok(deleted)
    }

    /// Create a backup and then enforce retention policy
    pub fn create_backup_with_retention(&self) -> BudgetResult<(PathBuf, Vec<PathBuf>)> {
        let backup_path = self.create_backup()?;
        let deleted = self.enforce_retention()?;
        Ok((backup_path, deleted))
    }
}

fn backup_filename(at: &DateTime<Utc>) -> String {
    format!(
        "backup-{}-{:06}.json",
        at.format("%Y%m%d-%H%M%S"),
        at.timestamp_subsec_micros()
    )
}

fn parse_backup_info(path: &Path) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    let stamp = filename.strip_prefix("backup-")?.strip_suffix(".json")?;
    let created_at = parse_backup_timestamp(stamp)?;
    let size_bytes = fs::metadata(path).ok()?.len();

    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes,
        is_monthly: false,
    })
}

/// Parse `YYYYMMDD-HHMMSS-ffffff` (the fraction is optional)
fn parse_backup_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    let mut parts = stamp.split('-');
    let date_part = parts.next()?;
    let time_part = parts.next()?;
    let micros: u32 = match parts.next() {
        Some(fraction) => fraction.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || date_part.len() != 8 || time_part.len() != 6 {
        return None;
    }

    let date = NaiveDate::parse_from_str(date_part, "%Y%m%d").ok()?;
    let time = chrono::NaiveTime::parse_from_str(time_part, "%H%M%S").ok()?;
    let datetime = date.and_time(time) + Duration::microseconds(micros as i64);

    Some(DateTime::from_naive_utc_and_offset(datetime, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_manager() -> (BackupManager, PlannerPaths, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = PlannerPaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();

        let retention = BackupRetention {
            daily_count: 3,
            monthly_count: 2,
        };

        let manager = BackupManager::new(paths.clone(), retention);
        (manager, paths, temp_dir)
    }

    fn write_primary(paths: &PlannerPaths, ids: &[&str]) {
        let records: Vec<ProjectRecord> = ids
            .iter()
            .map(|id| ProjectRecord {
                id: id.to_string(),
                ..Default::default()
            })
            .collect();
        write_json_atomic(paths.projects_file(), &records).unwrap();
    }

    #[test]
    fn test_create_and_read_backup() {
        let (manager, paths, _temp) = create_test_manager();
        write_primary(&paths, &["a", "b"]);

        let backup_path = manager.create_backup().unwrap();
        assert!(backup_path.exists());

        let archive = manager.read_archive(&backup_path).unwrap();
        assert_eq!(archive.schema_version, 1);
        assert_eq!(archive.projects.len(), 2);
    }

    #[test]
    fn test_backup_of_empty_collection() {
        let (manager, _paths, _temp) = create_test_manager();
        let backup_path = manager.create_backup().unwrap();
        assert!(manager.read_archive(&backup_path).unwrap().projects.is_empty());
    }

    #[test]
    fn test_list_backups_newest_first() {
        let (manager, _paths, _temp) = create_test_manager();
        manager.create_backup().unwrap();
        manager.create_backup().unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert!(backups[0].created_at > backups[1].created_at);
        assert!(backups[1].is_monthly);
        assert!(!backups[0].is_monthly);
    }

    #[test]
    fn test_retention_policy() {
        let (manager, _paths, _temp) = create_test_manager();
        for _ in 0..6 {
            manager.create_backup().unwrap();
        }

        // One monthly backup plus five daily ones; three daily are kept
        let deleted = manager.enforce_retention().unwrap();
        assert_eq!(deleted.len(), 2);
        assert_eq!(manager.list_backups().unwrap().len(), 4);
    }

    #[test]
    fn test_restore() {
        let (manager, paths, _temp) = create_test_manager();
        write_primary(&paths, &["a", "b", "c"]);
        let backup_path = manager.create_backup().unwrap();

        write_primary(&paths, &[]);
        assert_eq!(manager.restore(&backup_path).unwrap(), 3);
        assert_eq!(read_collection(&paths.projects_file()).unwrap().len(), 3);
    }

    #[test]
    fn test_get_latest_backup() {
        let (manager, _paths, _temp) = create_test_manager();
        assert!(manager.get_latest_backup().unwrap().is_none());

        let path = manager.create_backup().unwrap();
        assert_eq!(manager.get_latest_backup().unwrap().unwrap().path, path);
    }

    #[test]
    fn test_parse_backup_timestamp() {
        let timestamp = parse_backup_timestamp("20251127-143022").unwrap();
        assert_eq!(timestamp.year(), 2025);
        assert_eq!(timestamp.month(), 11);
        assert_eq!(timestamp.day(), 27);

        let precise = parse_backup_timestamp("20251127-143022-000456").unwrap();
        assert!(precise > timestamp);
        assert!(parse_backup_timestamp("2025-11").is_none());
    }
}
