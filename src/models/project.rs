//! Project budget tree models
//!
//! A project owns an ordered list of categories; each category owns
//! subcategories and each subcategory owns expense lines. Children never
//! outlive their parent: removing a node drops its whole subtree.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::ProjectId;
use super::money::Money;
use crate::error::{BudgetError, BudgetResult};

const MAX_NAME_LEN: usize = 100;

/// Lifecycle status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    InProgress,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "in-progress" | "inprogress" | "active" => Ok(Self::InProgress),
            "completed" | "done" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            other => Err(BudgetError::Validation(format!(
                "Unknown project status '{}' (expected in-progress, completed or archived)",
                other
            ))),
        }
    }
}

/// Leaf of the budget tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub name: String,
    pub amount: Money,
}

impl ExpenseLine {
    pub fn new(name: impl Into<String>, amount: Money) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// Second level of the budget tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub name: String,
    /// Derived from the lines when there are any, manual otherwise
    pub amount: Money,
    pub lines: Vec<ExpenseLine>,
}

impl Subcategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: Money::zero(),
            lines: Vec::new(),
        }
    }

    pub fn with_amount(name: impl Into<String>, amount: Money) -> Self {
        let mut sub = Self::new(name);
        sub.amount = amount;
        sub
    }

    pub fn line(&self, idx: usize) -> Option<&ExpenseLine> {
        self.lines.get(idx)
    }
}

/// Top level of the budget tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Derived from the subcategories when there are any, manual otherwise
    pub amount: Money,
    pub subcategories: Vec<Subcategory>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: Money::zero(),
            subcategories: Vec::new(),
        }
    }

    pub fn with_amount(name: impl Into<String>, amount: Money) -> Self {
        let mut cat = Self::new(name);
        cat.amount = amount;
        cat
    }
}

/// Position of a node in the tree, zero-based
///
/// Parsed from and displayed as one-based dotted paths: `2`, `2.1`, `2.1.3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodePath {
    Category(usize),
    Subcategory(usize, usize),
    Line(usize, usize, usize),
}

impl NodePath {
    pub fn category_index(&self) -> usize {
        match *self {
            Self::Category(c) | Self::Subcategory(c, _) | Self::Line(c, _, _) => c,
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Category(c) => write!(f, "{}", c + 1),
            Self::Subcategory(c, s) => write!(f, "{}.{}", c + 1, s + 1),
            Self::Line(c, s, l) => write!(f, "{}.{}.{}", c + 1, s + 1, l + 1),
        }
    }
}

impl FromStr for NodePath {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            BudgetError::Validation(format!(
                "Invalid node path '{}' (expected e.g. 2, 2.1 or 2.1.3)",
                s
            ))
        };

        let parts = s
            .trim()
            .split('.')
            .map(|p| match p.parse::<usize>() {
                Ok(n) if n > 0 => Ok(n - 1),
                _ => Err(invalid()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [c] => Ok(Self::Category(*c)),
            [c, s] => Ok(Self::Subcategory(*c, *s)),
            [c, s, l] => Ok(Self::Line(*c, *s, *l)),
            _ => Err(invalid()),
        }
    }
}

/// A budget plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: ProjectStatus,
    pub total_budget: Money,
    /// Currency symbol recorded for this project, if any
    pub currency: Option<String>,
    pub template: Option<String>,
    pub link_to_wallet: bool,
    pub link_to_wishlist: bool,
    pub categories: Vec<Category>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create an empty in-progress project
    pub fn new(name: impl Into<String>, start_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            name: name.into(),
            start_date,
            end_date: None,
            status: ProjectStatus::InProgress,
            total_budget: Money::zero(),
            currency: None,
            template: None,
            link_to_wallet: false,
            link_to_wishlist: false,
            categories: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        validate_name(&self.name)?;

        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ProjectValidationError::EndBeforeStart);
            }
        }

        Ok(())
    }

    pub fn set_status(&mut self, status: ProjectStatus) {
        self.status = status;
        self.touch();
    }

    // === Node access ===

    pub fn category(&self, c: usize) -> BudgetResult<&Category> {
        self.categories
            .get(c)
            .ok_or_else(|| BudgetError::category_not_found(NodePath::Category(c).to_string()))
    }

    pub fn category_mut(&mut self, c: usize) -> BudgetResult<&mut Category> {
        self.categories
            .get_mut(c)
            .ok_or_else(|| BudgetError::category_not_found(NodePath::Category(c).to_string()))
    }

    pub fn subcategory(&self, c: usize, s: usize) -> BudgetResult<&Subcategory> {
        self.category(c)?.subcategories.get(s).ok_or_else(|| {
            BudgetError::subcategory_not_found(NodePath::Subcategory(c, s).to_string())
        })
    }

    pub fn subcategory_mut(&mut self, c: usize, s: usize) -> BudgetResult<&mut Subcategory> {
        self.category_mut(c)?.subcategories.get_mut(s).ok_or_else(|| {
            BudgetError::subcategory_not_found(NodePath::Subcategory(c, s).to_string())
        })
    }

    pub fn line_mut(&mut self, c: usize, s: usize, l: usize) -> BudgetResult<&mut ExpenseLine> {
        self.subcategory_mut(c, s)?
            .lines
            .get_mut(l)
            .ok_or_else(|| BudgetError::line_not_found(NodePath::Line(c, s, l).to_string()))
    }

    /// Current amount stored at a node
    pub fn amount_at(&self, path: NodePath) -> BudgetResult<Money> {
        match path {
            NodePath::Category(c) => Ok(self.category(c)?.amount),
            NodePath::Subcategory(c, s) => Ok(self.subcategory(c, s)?.amount),
            NodePath::Line(c, s, l) => self
                .subcategory(c, s)?
                .line(l)
                .map(|line| line.amount)
                .ok_or_else(|| BudgetError::line_not_found(path.to_string())),
        }
    }

    /// Overwrite the amount stored at a node
    pub fn set_amount_at(&mut self, path: NodePath, amount: Money) -> BudgetResult<()> {
        match path {
            NodePath::Category(c) => self.category_mut(c)?.amount = amount,
            NodePath::Subcategory(c, s) => self.subcategory_mut(c, s)?.amount = amount,
            NodePath::Line(c, s, l) => self.line_mut(c, s, l)?.amount = amount,
        }
        Ok(())
    }

    pub fn rename_at(&mut self, path: NodePath, name: &str) -> BudgetResult<()> {
        let name = checked_name(name)?;
        match path {
            NodePath::Category(c) => self.category_mut(c)?.name = name,
            NodePath::Subcategory(c, s) => self.subcategory_mut(c, s)?.name = name,
            NodePath::Line(c, s, l) => self.line_mut(c, s, l)?.name = name,
        }
        Ok(())
    }

    // === Structural edits ===

    pub fn add_category(&mut self, name: &str) -> BudgetResult<NodePath> {
        self.categories.push(Category::new(checked_name(name)?));
        Ok(NodePath::Category(self.categories.len() - 1))
    }

    pub fn add_subcategory(&mut self, c: usize, name: &str) -> BudgetResult<NodePath> {
        let name = checked_name(name)?;
        let category = self.category_mut(c)?;
        category.subcategories.push(Subcategory::new(name));
        Ok(NodePath::Subcategory(c, category.subcategories.len() - 1))
    }

    pub fn add_line(
        &mut self,
        c: usize,
        s: usize,
        name: &str,
        amount: Money,
    ) -> BudgetResult<NodePath> {
        let name = checked_name(name)?;
        let sub = self.subcategory_mut(c, s)?;
        sub.lines.push(ExpenseLine::new(name, amount));
        Ok(NodePath::Line(c, s, sub.lines.len() - 1))
    }

    /// Remove a node and everything below it
    pub fn remove_at(&mut self, path: NodePath) -> BudgetResult<()> {
        match path {
            NodePath::Category(c) => {
                self.category(c)?;
                self.categories.remove(c);
            }
            NodePath::Subcategory(c, s) => {
                self.subcategory(c, s)?;
                self.category_mut(c)?.subcategories.remove(s);
            }
            NodePath::Line(c, s, l) => {
                self.line_mut(c, s, l)?;
                self.subcategory_mut(c, s)?.lines.remove(l);
            }
        }
        Ok(())
    }

    pub fn line_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| &c.subcategories)
            .map(|s| s.lines.len())
            .sum()
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn validate_name(name: &str) -> Result<(), ProjectValidationError> {
    if name.trim().is_empty() {
        return Err(ProjectValidationError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ProjectValidationError::NameTooLong(name.chars().count()));
    }
    Ok(())
}

fn checked_name(name: &str) -> BudgetResult<String> {
    validate_name(name).map_err(|e| BudgetError::Validation(e.to_string()))?;
    Ok(name.trim().to_string())
}

/// Validation errors for projects and tree nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectValidationError {
    EmptyName,
    NameTooLong(usize),
    EndBeforeStart,
}

impl fmt::Display for ProjectValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Name too long ({} chars, max {})", len, MAX_NAME_LEN)
            }
            Self::EndBeforeStart => write!(f, "End date cannot be before start date"),
        }
    }
}

impl std::error::Error for ProjectValidationError {}
