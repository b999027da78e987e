//! Core data models for the budget planner
//!
//! This module contains the budget tree (projects, categories, subcategories,
//! expense lines), the decimal money type and project templates.

pub mod ids;
pub mod money;
pub mod project;
pub mod template;

pub use ids::ProjectId;
pub use money::{resolve_currency_symbol, Money, DEFAULT_CURRENCY_SYMBOL};
pub use project::{
    Category, ExpenseLine, NodePath, Project, ProjectStatus, ProjectValidationError, Subcategory,
};
pub use template::ProjectTemplate;
