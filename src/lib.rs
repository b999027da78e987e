//! Budget planner - hierarchical project budgeting
//!
//! A project's budget is a tree of categories, subcategories and expense
//! lines. Amounts are entered at any level and summed bottom-up; the
//! project's total budget is then reconciled so a total the user chose is
//! never overwritten by a later sum.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Budget tree, money and templates
//! - `engine`: Aggregation, total reconciliation and recompute scheduling
//! - `storage`: JSON collections, legacy locations and recovery
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `backup`: Rolling snapshots of the project collection
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use budget_planner::config::{paths::PlannerPaths, settings::Settings};
//! use budget_planner::services::ProjectService;
//! use budget_planner::storage::Storage;
//!
//! let paths = PlannerPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let mut storage = Storage::new(paths, &settings)?;
//! storage.load_all()?;
//!
//! let service = ProjectService::new(&storage, &settings);
//! for listing in service.list()? {
//!     println!("{}", listing.project.name);
//! }
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{BudgetError, BudgetResult};
