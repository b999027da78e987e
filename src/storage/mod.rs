//! Storage layer for the budget planner
//!
//! Projects live in JSON collection files. The primary collection is the only
//! one written; older legacy collections and the newest backup snapshot are
//! read-only fallbacks consulted, in that order, when a project or its total
//! budget cannot be found in the primary collection.

pub mod file_io;
pub mod projects;

pub use file_io::{read_json, write_json_atomic};
pub use projects::{ProjectRecord, ProjectRepository};

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::backup::BackupManager;
use crate::config::paths::PlannerPaths;
use crate::config::settings::Settings;
use crate::engine::TotalRecovery;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Money, ProjectId};

/// A place a project record may be found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    Primary,
    Legacy(PathBuf),
    Backup(PathBuf),
}

impl StorageLocation {
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Primary)
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary collection"),
            Self::Legacy(path) => write!(f, "legacy collection {}", path.display()),
            Self::Backup(path) => write!(f, "backup {}", path.display()),
        }
    }
}

/// A record together with where it was found
#[derive(Debug, Clone)]
pub struct LocatedRecord {
    pub record: ProjectRecord,
    pub location: StorageLocation,
}

/// Main storage coordinator
pub struct Storage {
    paths: PlannerPaths,
    pub projects: ProjectRepository,
    audit: AuditLogger,
    backups: BackupManager,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: PlannerPaths, settings: &Settings) -> BudgetResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            projects: ProjectRepository::new(paths.projects_file()),
            audit: AuditLogger::new(paths.audit_log()),
            backups: BackupManager::new(paths.clone(), settings.backup_retention.clone()),
            paths,
        })
    }

    pub fn paths(&self) -> &PlannerPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> BudgetResult<()> {
        self.projects.load()
    }

    /// Save all data to disk
    pub fn save_all(&self) -> BudgetResult<()> {
        self.projects.save()
    }

    /// Every location in lookup order
    pub fn locations(&self) -> Vec<StorageLocation> {
        let mut locations = vec![StorageLocation::Primary];
        locations.extend(
            self.paths
                .legacy_project_files()
                .into_iter()
                .map(StorageLocation::Legacy),
        );
        match self.backups.get_latest_backup() {
            Ok(Some(info)) => locations.push(StorageLocation::Backup(info.path)),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not list backups"),
        }
        locations
    }

    fn records_at(&self, location: &StorageLocation) -> BudgetResult<Vec<ProjectRecord>> {
        match location {
            StorageLocation::Primary => self.projects.get_all(),
            StorageLocation::Legacy(path) => projects::read_collection(path),
            StorageLocation::Backup(path) => Ok(self.backups.read_archive(path)?.projects),
        }
    }

    /// Records from the legacy collections whose ids are not in the primary one
    pub fn unmigrated_legacy_records(&self) -> BudgetResult<Vec<LocatedRecord>> {
        let primary = self.projects.get_all()?;
        let mut found: Vec<LocatedRecord> = Vec::new();

        for path in self.paths.legacy_project_files() {
            let location = StorageLocation::Legacy(path);
            let records = match self.records_at(&location) {
                Ok(records) => records,
                Err(e) => {
                    warn!(%location, error = %e, "skipping unreadable collection");
                    continue;
                }
            };
            for record in records {
                let known = primary.iter().any(|p| p.id == record.id)
                    || found.iter().any(|f| f.record.id == record.id);
                if !known {
                    found.push(LocatedRecord {
                        record,
                        location: location.clone(),
                    });
                }
            }
        }
        Ok(found)
    }

    /// Find a project record in the first location that has it
    ///
    /// # Errors
    ///
    /// `ProjectNotFound` when no location holds the id.
    pub fn find_project(&self, id: &ProjectId) -> BudgetResult<LocatedRecord> {
        for location in self.locations() {
            match self.records_at(&location) {
                Ok(records) => {
                    if let Some(record) = records.into_iter().find(|r| r.id == id.as_str()) {
                        debug!(project = %id, %location, "found project record");
                        return Ok(LocatedRecord { record, location });
                    }
                }
                Err(e) => warn!(%location, error = %e, "skipping unreadable collection"),
            }
        }
        Err(BudgetError::project_not_found(id.as_str()))
    }

    // === Audit ===

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> BudgetResult<()> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        summary: Option<String>,
    ) -> BudgetResult<()> {
        self.audit.log(&AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            summary,
        ))
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> BudgetResult<()> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }
}

impl TotalRecovery for Storage {
    fn recover_total(&self, id: &ProjectId) -> Option<Money> {
        for location in self.locations() {
            let records = match self.records_at(&location) {
                Ok(records) => records,
                Err(e) => {
                    warn!(%location, error = %e, "skipping unreadable collection during recovery");
                    continue;
                }
            };

            let total = records
                .iter()
                .filter(|r| r.id == id.as_str())
                .map(ProjectRecord::total_budget_amount)
                .find(|m| !m.is_zero());

            if let Some(total) = total {
                debug!(project = %id, %location, %total, "recovered total budget");
                return Some(total);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = PlannerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths, &Settings::default()).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn record(id: &str, total: Option<&str>) -> ProjectRecord {
        ProjectRecord {
            id: id.into(),
            project_name: format!("Project {}", id),
            project_date: "2026-01-01".into(),
            total_budget: total.map(String::from),
            ..Default::default()
        }
    }

    fn write_legacy(storage: &Storage, index: usize, records: &[ProjectRecord]) {
        let path = &storage.paths().legacy_project_files()[index];
        write_json_atomic(path, &records.to_vec()).unwrap();
    }

    #[test]
    fn test_storage_creation() {
        let (temp_dir, storage) = create_storage();
        assert!(temp_dir.path().join("data").exists());
        assert!(temp_dir.path().join("backups").exists());
        assert_eq!(storage.locations().len(), 3);
    }

    #[test]
    fn test_find_project_falls_back_to_legacy() {
        let (_temp, storage) = create_storage();
        write_legacy(&storage, 1, &[record("old", Some("€ 80,00"))]);

        let id: ProjectId = "old".parse().unwrap();
        let found = storage.find_project(&id).unwrap();
        assert!(matches!(found.location, StorageLocation::Legacy(_)));
        assert_eq!(found.record.project_name, "Project old");
    }

    #[test]
    fn test_missing_project_is_fatal() {
        let (_temp, storage) = create_storage();
        let id: ProjectId = "ghost".parse().unwrap();
        let err = storage.find_project(&id).unwrap_err();
        assert!(matches!(err, BudgetError::ProjectNotFound(_)));
    }

    #[test]
    fn test_recovery_takes_first_non_zero_hit() {
        let (_temp, storage) = create_storage();
        storage.projects.upsert(record("p", Some("€ 0,00"))).unwrap();
        write_legacy(&storage, 0, &[record("p", Some("€ 120,00"))]);
        write_legacy(&storage, 1, &[record("p", Some("€ 999,00"))]);

        let id: ProjectId = "p".parse().unwrap();
        assert_eq!(storage.recover_total(&id), Some(Money::from_cents(12000)));
    }

    #[test]
    fn test_primary_wins_over_legacy() {
        let (_temp, storage) = create_storage();
        storage.projects.upsert(record("p", Some("€ 300,00"))).unwrap();
        write_legacy(&storage, 0, &[record("p", Some("€ 120,00"))]);

        let id: ProjectId = "p".parse().unwrap();
        assert_eq!(storage.recover_total(&id), Some(Money::from_cents(30000)));
    }

    #[test]
    fn test_legacy_numeric_id_found() {
        let (_temp, storage) = create_storage();
        std::fs::write(
            &storage.paths().legacy_project_files()[1],
            r#"[{"id": 1712345678901, "projectName": "Garden", "totalBudget": "€ 80,00"}]"#,
        )
        .unwrap();

        let id: ProjectId = "1712345678901".parse().unwrap();
        let found = storage.find_project(&id).unwrap();
        assert_eq!(found.record.project_name, "Garden");
        assert!(matches!(found.location, StorageLocation::Legacy(_)));
        assert_eq!(storage.recover_total(&id), Some(Money::from_cents(8000)));
    }

    #[test]
    fn test_recovery_skips_corrupt_collection() {
        let (_temp, storage) = create_storage();
        std::fs::write(&storage.paths().legacy_project_files()[0], "garbage").unwrap();
        write_legacy(&storage, 1, &[record("p", Some("€ 45,00"))]);

        let id: ProjectId = "p".parse().unwrap();
        assert_eq!(storage.recover_total(&id), Some(Money::from_cents(4500)));
    }

    #[test]
    fn test_recovery_from_backup() {
        let (_temp, storage) = create_storage();
        storage.projects.upsert(record("p", Some("€ 60,00"))).unwrap();
        storage.save_all().unwrap();
        storage.backups().create_backup().unwrap();

        storage.projects.upsert(record("p", None)).unwrap();
        let id: ProjectId = "p".parse().unwrap();
        assert_eq!(storage.recover_total(&id), Some(Money::from_cents(6000)));
    }

    #[test]
    fn test_nothing_to_recover() {
        let (_temp, storage) = create_storage();
        let id: ProjectId = "p".parse().unwrap();
        assert_eq!(storage.recover_total(&id), None);
    }

    #[test]
    fn test_unmigrated_legacy_records() {
        let (_temp, storage) = create_storage();
        storage.projects.upsert(record("a", None)).unwrap();
        write_legacy(&storage, 0, &[record("a", None), record("b", None)]);
        write_legacy(&storage, 1, &[record("b", None), record("c", None)]);

        let legacy = storage.unmigrated_legacy_records().unwrap();
        let ids: Vec<_> = legacy.iter().map(|l| l.record.id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);
    }
}
