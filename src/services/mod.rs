//! Service layer for the budget planner
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, recomputation, and audit and backup bookkeeping.

pub mod notify;
pub mod project;

pub use notify::{Notification, NotificationKind};
pub use project::{EditOutcome, ProjectListing, ProjectService};
