//! Project service
//!
//! Business logic for projects: creation from templates, lookup across
//! every storage location, tree edits through an [`EditSession`], and
//! persisting the result with audit entries and a rolling backup.

use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::notify::Notification;
use crate::audit::{AuditEntry, EntityType};
use crate::config::settings::Settings;
use crate::engine::{EditSession, Reconciliation};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{
    resolve_currency_symbol, Money, NodePath, Project, ProjectId, ProjectStatus, ProjectTemplate,
};
use crate::storage::{ProjectRecord, Storage, StorageLocation};

/// A project together with where it is stored
#[derive(Debug, Clone)]
pub struct ProjectListing {
    pub project: Project,
    pub location: StorageLocation,
}

/// Result of one tree edit
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub project: Project,
    /// Node created by the edit, if any
    pub path: Option<NodePath>,
    /// Pass that ran before saving
    pub reconciliation: Option<Reconciliation>,
    pub notification: Notification,
}

/// Service for project management
pub struct ProjectService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> ProjectService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    // === Project operations ===

    /// Create a project seeded from a template
    pub fn create(
        &self,
        name: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        template: ProjectTemplate,
        currency: Option<&str>,
    ) -> BudgetResult<Project> {
        let mut project = Project::new(name.trim(), start_date);
        project.end_date = end_date;
        project.template = Some(template.id().to_string());
        project.currency = currency
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from);
        project.categories = template.categories();

        project
            .validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        let (_, record) = self.persist(&project)?;
        self.storage.log_create(
            EntityType::Project,
            project.id.to_string(),
            Some(project.name.clone()),
            &record,
        )?;

        info!(project = %project.id, template = %template, "created project");
        Ok(project)
    }

    /// Load a project from the first location that holds it
    pub fn get(&self, id: &ProjectId) -> BudgetResult<Project> {
        self.storage.find_project(id)?.record.into_project()
    }

    /// Find a project by id, id prefix or name (case-insensitive)
    pub fn find(&self, identifier: &str) -> BudgetResult<Project> {
        let identifier = identifier.trim();
        if let Ok(id) = identifier.parse::<ProjectId>() {
            match self.get(&id) {
                Ok(project) => return Ok(project),
                Err(BudgetError::ProjectNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let wanted = identifier.to_lowercase();
        let mut matches: Vec<Project> = self
            .list()?
            .into_iter()
            .map(|l| l.project)
            .filter(|p| p.id.as_str().starts_with(identifier) || p.name.to_lowercase() == wanted)
            .collect();

        match matches.len() {
            0 => Err(BudgetError::project_not_found(identifier)),
            1 => Ok(matches.remove(0)),
            n => Err(BudgetError::Validation(format!(
                "'{}' matches {} projects; use the full id",
                identifier, n
            ))),
        }
    }

    /// All projects: the primary collection first, then legacy records
    /// that were never migrated
    pub fn list(&self) -> BudgetResult<Vec<ProjectListing>> {
        let primary = self
            .storage
            .projects
            .get_all()?
            .into_iter()
            .map(|record| (record, StorageLocation::Primary));
        let legacy = self
            .storage
            .unmigrated_legacy_records()?
            .into_iter()
            .map(|l| (l.record, l.location));

        let mut listings = Vec::new();
        for (record, location) in primary.chain(legacy) {
            let id = record.id.clone();
            match record.into_project() {
                Ok(project) => listings.push(ProjectListing { project, location }),
                Err(e) => warn!(project = %id, %location, error = %e, "skipping unreadable project"),
            }
        }
        Ok(listings)
    }

    /// Delete a project from the primary collection
    ///
    /// Records that only exist in read-only locations cannot be deleted.
    pub fn delete(&self, id: &ProjectId) -> BudgetResult<Project> {
        let Some(record) = self.storage.projects.get(id)? else {
            let found = self.storage.find_project(id)?;
            return Err(BudgetError::Validation(format!(
                "Project {} is stored in the read-only {} and cannot be deleted",
                id, found.location
            )));
        };

        let project = record.clone().into_project()?;
        self.storage.projects.delete(id)?;
        self.storage.projects.save()?;

        self.storage.log_delete(
            EntityType::Project,
            id.to_string(),
            Some(project.name.clone()),
            &record,
        )?;

        info!(project = %id, "deleted project");
        Ok(project)
    }

    pub fn set_status(&self, id: &ProjectId, status: ProjectStatus) -> BudgetResult<Project> {
        let mut project = self.get(id)?;
        let old_status = project.status;
        project.set_status(status);

        let (before, after) = self.persist(&project)?;
        let summary = format!("status: {} -> {}", old_status, status);
        match before {
            Some(before) => self.storage.log_update(
                EntityType::Project,
                id.to_string(),
                Some(project.name.clone()),
                &before,
                &after,
                Some(summary),
            )?,
            None => self.storage.log_create(
                EntityType::Project,
                id.to_string(),
                Some(project.name.clone()),
                &after,
            )?,
        }

        Ok(project)
    }

    // === Sessions ===

    pub fn open_session(&self, id: &ProjectId, now: Instant) -> BudgetResult<EditSession> {
        let project = self.get(id)?;
        debug!(project = %id, "opened edit session");
        Ok(EditSession::open(project, self.settings, now))
    }

    /// Persist a session's project
    ///
    /// Never fails: problems come back as a notification and leave the
    /// session as it was, so the caller can retry.
    pub fn save_session(&self, session: &mut EditSession) -> Notification {
        self.commit(session, None)
    }

    /// Run the pending recomputation pass, if any, at its due time
    fn settle(&self, session: &mut EditSession) -> Option<Reconciliation> {
        let due = session.trigger().due_at()?;
        session.poll(due, self.storage)
    }

    fn commit(&self, session: &mut EditSession, entry: Option<AuditEntry>) -> Notification {
        let project = session.project();

        if let Err(e) = project.validate() {
            return Notification::error(format!("Cannot save '{}': {}", project.name, e));
        }

        // Snapshot before writing so the newest backup holds the previous state
        let mut problems = Vec::new();
        match self.storage.backups().create_backup_with_retention() {
            Ok((path, deleted)) => {
                debug!(backup = %path.display(), expired = deleted.len(), "snapshot taken")
            }
            Err(e) => {
                warn!(project = %project.id, error = %e, "failed to create backup");
                problems.push(format!("backup not created ({})", e));
            }
        }

        let (before, after) = match self.persist(project) {
            Ok(records) => records,
            Err(e) => {
                warn!(project = %project.id, error = %e, "failed to save project");
                return Notification::error(format!("Could not save '{}': {}", project.name, e));
            }
        };

        let symbol = self.symbol_for(project);
        let total = project.total_budget.format_with_symbol(symbol);

        if let Err(e) = self.audit_commit(project, before.as_ref(), &after, entry) {
            warn!(project = %project.id, error = %e, "failed to write audit entry");
            problems.push(format!("audit log not written ({})", e));
        }

        let name = project.name.clone();
        session.mark_saved();

        if problems.is_empty() {
            Notification::success(format!("Saved '{}' (total {})", name, total))
        } else {
            Notification::warning(format!("Saved '{}' but {}", name, problems.join(", ")))
        }
    }

    fn audit_commit(
        &self,
        project: &Project,
        before: Option<&ProjectRecord>,
        after: &ProjectRecord,
        entry: Option<AuditEntry>,
    ) -> BudgetResult<()> {
        let logs_total = matches!(&entry, Some(e) if e.entity_type == EntityType::TotalBudget);

        let entry = match (entry, before) {
            (Some(entry), _) => entry,
            (None, Some(before)) => AuditEntry::update(
                EntityType::Project,
                project.id.to_string(),
                Some(project.name.clone()),
                before,
                after,
                None,
            ),
            (None, None) => AuditEntry::create(
                EntityType::Project,
                project.id.to_string(),
                Some(project.name.clone()),
                after,
            ),
        };
        self.storage.audit().log(&entry)?;

        let old_total = before.and_then(|b| b.total_budget.clone());
        if !logs_total && old_total != after.total_budget {
            self.storage.log_update(
                EntityType::TotalBudget,
                project.id.to_string(),
                Some(project.name.clone()),
                &old_total,
                &after.total_budget,
                Some(format!(
                    "total: {} -> {}",
                    old_total.as_deref().unwrap_or("none"),
                    after.total_budget.as_deref().unwrap_or("none")
                )),
            )?;
        }
        Ok(())
    }

    /// Write a project into the primary collection
    ///
    /// Returns the record it replaced and the record written. The in-memory
    /// collection is rolled back when the file write fails.
    fn persist(&self, project: &Project) -> BudgetResult<(Option<ProjectRecord>, ProjectRecord)> {
        let record = ProjectRecord::from_project(project, self.symbol_for(project));
        let previous = self.storage.projects.get(&project.id)?;

        self.storage.projects.upsert(record.clone())?;
        if let Err(e) = self.storage.projects.save() {
            let rollback = match &previous {
                Some(previous) => self.storage.projects.upsert(previous.clone()),
                None => self.storage.projects.delete(&project.id).map(|_| ()),
            };
            if let Err(rollback) = rollback {
                warn!(project = %project.id, error = %rollback, "failed to roll back project collection");
            }
            return Err(e);
        }

        Ok((previous, record))
    }

    fn symbol_for<'p>(&'p self, project: &'p Project) -> &'p str {
        resolve_currency_symbol(None, project.currency.as_deref(), Some(self.settings))
    }

    // === Tree edits ===

    /// Open a session, apply one edit, run the pending pass and save
    fn edit<F>(&self, id: &ProjectId, edit: F) -> BudgetResult<EditOutcome>
    where
        F: FnOnce(&mut EditSession, Instant) -> BudgetResult<(Option<NodePath>, Option<AuditEntry>)>,
    {
        let now = Instant::now();
        let mut session = self.open_session(id, now)?;
        let (path, entry) = edit(&mut session, now)?;
        let reconciliation = self.settle(&mut session);
        let notification = self.commit(&mut session, entry);

        Ok(EditOutcome {
            project: session.into_project(),
            path,
            reconciliation,
            notification,
        })
    }

    pub fn add_category(&self, id: &ProjectId, name: &str) -> BudgetResult<EditOutcome> {
        self.edit(id, |session, now| {
            let path = session.add_category(name, now)?;
            Ok((Some(path), Some(node_created(session.project(), path))))
        })
    }

    pub fn add_subcategory(
        &self,
        id: &ProjectId,
        category: usize,
        name: &str,
    ) -> BudgetResult<EditOutcome> {
        self.edit(id, |session, now| {
            let path = session.add_subcategory(category, name, now)?;
            Ok((Some(path), Some(node_created(session.project(), path))))
        })
    }

    pub fn add_line(
        &self,
        id: &ProjectId,
        category: usize,
        subcategory: usize,
        name: &str,
        amount: Money,
    ) -> BudgetResult<EditOutcome> {
        self.edit(id, |session, now| {
            let path = session.add_line(category, subcategory, name, amount, now)?;
            Ok((Some(path), Some(node_created(session.project(), path))))
        })
    }

    pub fn remove(&self, id: &ProjectId, path: NodePath) -> BudgetResult<EditOutcome> {
        self.edit(id, |session, now| {
            let before = node_json(session.project(), path);
            session.remove(path, now)?;
            let entry = AuditEntry::delete(
                entity_for(path),
                node_entity_id(session.project(), path),
                None,
                &before,
            );
            Ok((None, Some(entry)))
        })
    }

    pub fn rename(&self, id: &ProjectId, path: NodePath, name: &str) -> BudgetResult<EditOutcome> {
        self.edit(id, |session, _now| {
            let before = node_json(session.project(), path);
            session.rename(path, name)?;
            let entry = node_updated(session.project(), path, before, "renamed");
            Ok((None, Some(entry)))
        })
    }

    pub fn set_amount(
        &self,
        id: &ProjectId,
        path: NodePath,
        amount: Money,
    ) -> BudgetResult<EditOutcome> {
        self.edit(id, |session, now| {
            let before = node_json(session.project(), path);
            session.set_amount(path, amount, now)?;
            let entry = node_updated(session.project(), path, before, "amount set");
            Ok((None, Some(entry)))
        })
    }

    /// Edit the total-budget field
    pub fn set_total(&self, id: &ProjectId, amount: Money) -> BudgetResult<EditOutcome> {
        self.edit(id, |session, now| {
            let project = session.project();
            let symbol = self.symbol_for(project);
            let before = project.total_budget.format_with_symbol(symbol);
            let entered = amount.format_with_symbol(symbol);
            let entry = AuditEntry::update(
                EntityType::TotalBudget,
                project.id.to_string(),
                Some(project.name.clone()),
                &before,
                &entered,
                Some(format!("total edited: {} -> {}", before, entered)),
            );

            session.edit_total(amount, now);
            Ok((None, Some(entry)))
        })
    }

    /// Force a full recomputation pass and save the result
    pub fn recompute(&self, id: &ProjectId) -> BudgetResult<EditOutcome> {
        let mut session = self.open_session(id, Instant::now())?;
        let reconciliation = session.recompute(self.storage);
        debug!(project = %id, source = %reconciliation.source, "recomputed project");
        let notification = self.save_session(&mut session);

        Ok(EditOutcome {
            project: session.into_project(),
            path: None,
            reconciliation: Some(reconciliation),
            notification,
        })
    }
}

fn entity_for(path: NodePath) -> EntityType {
    match path {
        NodePath::Category(_) => EntityType::Category,
        NodePath::Subcategory(..) => EntityType::Subcategory,
        NodePath::Line(..) => EntityType::ExpenseLine,
    }
}

fn node_entity_id(project: &Project, path: NodePath) -> String {
    format!("{}/{}", project.id, path)
}

fn to_json<T: Serialize>(value: &T) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}

/// JSON form of the node at `path`, if it exists
fn node_json(project: &Project, path: NodePath) -> Option<serde_json::Value> {
    match path {
        NodePath::Category(c) => project.category(c).ok().and_then(to_json),
        NodePath::Subcategory(c, s) => project.subcategory(c, s).ok().and_then(to_json),
        NodePath::Line(c, s, l) => project
            .subcategory(c, s)
            .ok()
            .and_then(|sub| sub.line(l))
            .and_then(to_json),
    }
}

fn node_name(project: &Project, path: NodePath) -> Option<String> {
    node_json(project, path).and_then(|v| v.get("name")?.as_str().map(String::from))
}

fn node_created(project: &Project, path: NodePath) -> AuditEntry {
    AuditEntry::create(
        entity_for(path),
        node_entity_id(project, path),
        node_name(project, path),
        &node_json(project, path),
    )
}

fn node_updated(
    project: &Project,
    path: NodePath,
    before: Option<serde_json::Value>,
    what: &str,
) -> AuditEntry {
    AuditEntry::update(
        entity_for(path),
        node_entity_id(project, path),
        node_name(project, path),
        &before,
        &node_json(project, path),
        Some(format!("{} at {}", what, path)),
    )
}
