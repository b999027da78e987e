//! Audit logging for project mutations
//!
//! Every create, update and delete of a project or one of its tree nodes is
//! appended to `audit.log` as one JSON line, with the before/after values.
//! Tree nodes use `<project id>/<node path>` as their entity id, so all
//! entries of one project can be filtered by prefix.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
