//! Backup system for the budget planner
//!
//! Rolling snapshots of the primary project collection with a daily/monthly
//! retention policy. By default the system keeps 30 daily and 12 monthly
//! backups (the oldest backup of each month counts as the monthly one).
//!
//! The newest snapshot is also the last storage location consulted when a
//! project or its total budget has to be recovered.

mod manager;

pub use manager::{BackupArchive, BackupInfo, BackupManager};
