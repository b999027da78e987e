//! Display formatting for terminal output
//!
//! Provides utilities for formatting projects and their budget trees for
//! terminal display.

pub mod project;

pub use project::{
    format_history, format_project_details, format_project_list, format_project_tree,
    format_reconciliation,
};
