//! Project records and collections
//!
//! A collection file is a JSON array of project records. Records keep the
//! camelCase layout and formatted amount strings (`"€ 1234,50"`) that other
//! tools read, while the rest of the crate works on [`Project`] values.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{BudgetError, BudgetResult};
use crate::models::{
    Category, ExpenseLine, Money, Project, ProjectId, ProjectStatus, Subcategory,
};

use super::file_io::{read_json, write_json_atomic};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub lines: Vec<LineRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<SubcategoryRecord>,
}

/// Stored form of a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    #[serde(deserialize_with = "deserialize_record_id")]
    pub id: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_end_date: Option<String>,
    #[serde(default)]
    pub total_budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub project_status: Option<String>,
    #[serde(default)]
    pub link_to_wallet: bool,
    #[serde(default)]
    pub link_to_wishlist: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Ids written as JSON numbers (millisecond timestamps) read as their digits
fn deserialize_record_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

fn parse_amount(text: &Option<String>) -> Money {
    text.as_deref().map(Money::parse_lenient).unwrap_or_default()
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    // Timestamps like 2026-05-01T10:00:00Z keep only their date part
    let text = text.split('T').next().unwrap_or(text);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

fn parse_timestamp(text: &Option<String>) -> Option<DateTime<Utc>> {
    text.as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
}

impl ProjectRecord {
    /// Total budget as stored, parsed leniently
    pub fn total_budget_amount(&self) -> Money {
        parse_amount(&self.total_budget)
    }

    /// Convert to the in-memory tree
    ///
    /// Missing amounts count as zero; unreadable dates and statuses fall back
    /// with a warning instead of rejecting the whole record.
    pub fn into_project(self) -> BudgetResult<Project> {
        let id: ProjectId = self.id.parse()?;

        let created_at = parse_timestamp(&self.created_at).unwrap_or_else(Utc::now);
        let updated_at = parse_timestamp(&self.updated_at).unwrap_or(created_at);

        let start_date = parse_date(&self.project_date).unwrap_or_else(|| {
            warn!(project = %id, date = %self.project_date, "unreadable start date, using creation date");
            created_at.date_naive()
        });

        let end_date = self
            .project_end_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .and_then(|d| {
                let parsed = parse_date(d);
                if parsed.is_none() {
                    warn!(project = %id, date = %d, "unreadable end date, dropping it");
                }
                parsed
            });

        let status = match self.project_status.as_deref() {
            None => ProjectStatus::default(),
            Some(s) => s.parse().unwrap_or_else(|_| {
                warn!(project = %id, status = %s, "unknown project status, using in-progress");
                ProjectStatus::default()
            }),
        };

        let categories = self
            .categories
            .iter()
            .map(|c| Category {
                name: c.name.clone(),
                amount: parse_amount(&c.amount),
                subcategories: c
                    .subcategories
                    .iter()
                    .map(|s| Subcategory {
                        name: s.name.clone(),
                        amount: parse_amount(&s.amount),
                        lines: s
                            .lines
                            .iter()
                            .map(|l| ExpenseLine::new(l.name.clone(), parse_amount(&l.amount)))
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Ok(Project {
            id,
            name: self.project_name.clone(),
            start_date,
            end_date,
            status,
            total_budget: parse_amount(&self.total_budget),
            currency: self.currency.filter(|c| !c.trim().is_empty()),
            template: self.template,
            link_to_wallet: self.link_to_wallet,
            link_to_wishlist: self.link_to_wishlist,
            categories,
            created_at,
            updated_at,
        })
    }

    /// Convert back to the stored layout, formatting amounts with `symbol`
    pub fn from_project(project: &Project, symbol: &str) -> Self {
        let fmt = |m: Money| Some(m.format_with_symbol(symbol));

        Self {
            id: project.id.to_string(),
            project_name: project.name.clone(),
            project_date: project.start_date.format("%Y-%m-%d").to_string(),
            project_end_date: project
                .end_date
                .map(|d| d.format("%Y-%m-%d").to_string()),
            total_budget: fmt(project.total_budget),
            currency: project.currency.clone(),
            template: project.template.clone(),
            categories: project
                .categories
                .iter()
                .map(|c| CategoryRecord {
                    name: c.name.clone(),
                    amount: fmt(c.amount),
                    subcategories: c
                        .subcategories
                        .iter()
                        .map(|s| SubcategoryRecord {
                            name: s.name.clone(),
                            amount: fmt(s.amount),
                            lines: s
                                .lines
                                .iter()
                                .map(|l| LineRecord {
                                    name: l.name.clone(),
                                    amount: fmt(l.amount),
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
            project_status: Some(project.status.to_string()),
            link_to_wallet: project.link_to_wallet,
            link_to_wishlist: project.link_to_wishlist,
            created_at: Some(project.created_at.to_rfc3339()),
            updated_at: Some(project.updated_at.to_rfc3339()),
        }
    }
}

/// Read a whole collection file; a missing file is an empty collection
pub fn read_collection(path: &Path) -> BudgetResult<Vec<ProjectRecord>> {
    read_json(path)
}

/// Repository for the primary, writable project collection
pub struct ProjectRepository {
    path: PathBuf,
    records: RwLock<Vec<ProjectRecord>>,
}

impl ProjectRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the collection from disk
    pub fn load(&self) -> BudgetResult<()> {
        let loaded = read_collection(&self.path)?;

        let mut records = self
            .records
            .write()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        *records = loaded;
        Ok(())
    }

    /// Save the collection to disk
    pub fn save(&self) -> BudgetResult<()> {
        let records = self
            .records
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        write_json_atomic(&self.path, &*records)
    }

    pub fn get(&self, id: &ProjectId) -> BudgetResult<Option<ProjectRecord>> {
        let records = self
            .records
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(records.iter().find(|r| r.id == id.as_str()).cloned())
    }

    /// All records, in stored order
    pub fn get_all(&self) -> BudgetResult<Vec<ProjectRecord>> {
        let records = self
            .records
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(records.clone())
    }

    /// Replace the record with the same id in place, or append it
    pub fn upsert(&self, record: ProjectRecord) -> BudgetResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    pub fn delete(&self, id: &ProjectId) -> BudgetResult<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let before = records.len();
        records.retain(|r| r.id != id.as_str());
        Ok(records.len() != before)
    }

    pub fn count(&self) -> BudgetResult<usize> {
        let records = self
            .records
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LEGACY_JSON: &str = r#"[
        {
            "id": "1712345678901",
            "projectName": "Mariage",
            "projectDate": "01/06/2026",
            "totalBudget": "€ 15 000,00",
            "template": "wedding",
            "projectStatus": "completed",
            "linkToWallet": true,
            "categories": [
                {
                    "name": "Reception",
                    "amount": "€ 1 200,50",
                    "subcategories": [
                        {
                            "name": "Catering",
                            "lines": [
                                { "name": "Menu", "amount": "€ 1000,00" },
                                { "name": "Cake" }
                            ]
                        }
                    ]
                }
            ]
        }
    ]"#;

    fn create_test_repo() -> (TempDir, ProjectRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = ProjectRepository::new(temp_dir.path().join("projects.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_legacy_record_to_project() {
        let records: Vec<ProjectRecord> = serde_json::from_str(LEGACY_JSON).unwrap();
        let project = records[0].clone().into_project().unwrap();

        assert_eq!(project.id.as_str(), "1712345678901");
        assert_eq!(project.start_date, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
        assert_eq!(project.status, ProjectStatus::Completed);
        assert_eq!(project.total_budget, Money::from_cents(1_500_000));
        assert!(project.link_to_wallet);

        let category = &project.categories[0];
        assert_eq!(category.amount, Money::from_cents(120_050));
        // Missing amount fields count as zero
        assert!(category.subcategories[0].amount.is_zero());
        assert!(category.subcategories[0].lines[1].amount.is_zero());
    }

    #[test]
    fn test_numeric_id_read_as_text() {
        let (temp, _) = create_test_repo();
        let path = temp.path().join("budget_projects.json");
        std::fs::write(
            &path,
            r#"[{"id": 1712345678901, "projectName": "Garden", "totalBudget": "€ 80,00"},
                {"id": "abc", "projectName": "Attic"}]"#,
        )
        .unwrap();

        let records = read_collection(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1712345678901");

        let project = records[0].clone().into_project().unwrap();
        assert_eq!(project.id.as_str(), "1712345678901");
        assert_eq!(project.total_budget, Money::from_cents(8000));
    }

    #[test]
    fn test_unknown_status_and_bad_date_fall_back() {
        let record = ProjectRecord {
            id: "x".into(),
            project_name: "Odd".into(),
            project_date: "someday".into(),
            project_end_date: Some("later".into()),
            project_status: Some("paused".into()),
            created_at: Some("2026-02-03T10:00:00Z".into()),
            ..Default::default()
        };
        let project = record.into_project().unwrap();
        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.start_date, NaiveDate::from_ymd_opt(2026, 2, 3).unwrap());
        assert!(project.end_date.is_none());
    }

    #[test]
    fn test_blank_id_rejected() {
        let record = ProjectRecord::default();
        assert!(record.into_project().unwrap_err().is_validation());
    }

    #[test]
    fn test_from_project_formats_amounts() {
        let records: Vec<ProjectRecord> = serde_json::from_str(LEGACY_JSON).unwrap();
        let project = records[0].clone().into_project().unwrap();
        let record = ProjectRecord::from_project(&project, "€");

        assert_eq!(record.total_budget.as_deref(), Some("€ 15000,00"));
        assert_eq!(record.categories[0].amount.as_deref(), Some("€ 1200,50"));
        assert_eq!(
            record.categories[0].subcategories[0].lines[0].amount.as_deref(),
            Some("€ 1000,00")
        );
        assert_eq!(record.project_date, "2026-06-01");
        assert_eq!(record.project_status.as_deref(), Some("completed"));

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("projectName").is_some());
        assert!(json.get("totalBudget").is_some());
        assert!(json.get("linkToWallet").is_some());

        let again = record.into_project().unwrap();
        assert_eq!(again.categories, project.categories);
        assert_eq!(again.total_budget, project.total_budget);
    }

    #[test]
    fn test_repository_upsert_keeps_order() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        for id in ["a", "b", "c"] {
            repo.upsert(ProjectRecord {
                id: id.into(),
                ..Default::default()
            })
            .unwrap();
        }
        repo.upsert(ProjectRecord {
            id: "b".into(),
            project_name: "Updated".into(),
            ..Default::default()
        })
        .unwrap();

        let all = repo.get_all().unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(all[1].project_name, "Updated");
    }

    #[test]
    fn test_repository_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        repo.upsert(ProjectRecord {
            id: "p1".into(),
            project_name: "Trip".into(),
            total_budget: Some("€ 250,00".into()),
            ..Default::default()
        })
        .unwrap();
        repo.save().unwrap();

        let repo2 = ProjectRepository::new(temp_dir.path().join("projects.json"));
        repo2.load().unwrap();
        let id: ProjectId = "p1".parse().unwrap();
        let record = repo2.get(&id).unwrap().unwrap();
        assert_eq!(record.total_budget_amount(), Money::from_cents(25000));

        assert!(repo2.delete(&id).unwrap());
        assert!(!repo2.delete(&id).unwrap());
        assert_eq!(repo2.count().unwrap(), 0);
    }
}
