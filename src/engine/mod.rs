//! Budget aggregation engine
//!
//! - `aggregate`: bottom-up recomputation of the tree
//! - `reconcile`: choosing the project's total budget
//! - `trigger`: when a recomputation pass runs
//! - `session`: one editing session tying the three together
//!
//! The engine works on the plain in-memory tree only; storage and display
//! adapters convert to and from formatted strings at the edges.

pub mod aggregate;
pub mod reconcile;
pub mod session;
pub mod trigger;

pub use aggregate::{
    recompute_category_total, recompute_category_tree, recompute_project_total,
    recompute_subcategory_total, recompute_tree,
};
pub use reconcile::{
    reconcile_total, NoRecovery, Reconciliation, ReconcileState, TotalRecovery, TotalSource,
};
pub use session::EditSession;
pub use trigger::{ChangeKind, RecomputeTrigger};
