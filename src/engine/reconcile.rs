//! Total-budget reconciliation
//!
//! A user may set a target total independent of the itemized tree, so the
//! computed sum is only one candidate. Every pass evaluates, in order:
//!
//! 1. the captured original total, if non-zero, always wins;
//! 2. a non-zero value already in the total field is adopted as original;
//! 3. a positive computed sum is written and adopted as original;
//! 4. a total recovered from storage for this project id;
//! 5. zero.

use std::fmt;

use tracing::debug;

use crate::models::{Money, ProjectId};

/// Last-resort lookup of a previously persisted total budget
pub trait TotalRecovery {
    /// First non-zero total stored for `id`, searching every known location
    fn recover_total(&self, id: &ProjectId) -> Option<Money>;
}

/// Recovery source that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRecovery;

impl TotalRecovery for NoRecovery {
    fn recover_total(&self, _id: &ProjectId) -> Option<Money> {
        None
    }
}

impl<F> TotalRecovery for F
where
    F: Fn(&ProjectId) -> Option<Money>,
{
    fn recover_total(&self, id: &ProjectId) -> Option<Money> {
        self(id)
    }
}

/// Per-session reconciliation memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileState {
    original_total: Option<Money>,
}

impl ReconcileState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_original(total: Money) -> Self {
        let mut state = Self::new();
        state.capture(total);
        state
    }

    pub fn original_total(&self) -> Option<Money> {
        self.original_total
    }

    /// Record `total` as the authoritative value; zero is never captured
    pub fn capture(&mut self, total: Money) {
        if !total.is_zero() {
            self.original_total = Some(total);
        }
    }
}

/// Which rule produced the reconciled total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalSource {
    Original,
    Manual,
    Computed,
    Recovered,
    Zero,
}

impl fmt::Display for TotalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Original => "original",
            Self::Manual => "manual",
            Self::Computed => "computed",
            Self::Recovered => "recovered",
            Self::Zero => "zero",
        };
        f.write_str(label)
    }
}

/// Outcome of one reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub total: Money,
    pub source: TotalSource,
}

/// Decide the total budget for a project
///
/// `current` is what the total field holds right now and `computed` the
/// category sum from the aggregation pass.
pub fn reconcile_total(
    state: &mut ReconcileState,
    current: Money,
    computed: Money,
    project_id: &ProjectId,
    recovery: &dyn TotalRecovery,
) -> Reconciliation {
    let outcome = if let Some(original) = state.original_total.filter(|m| !m.is_zero()) {
        Reconciliation {
            total: original,
            source: TotalSource::Original,
        }
    } else if !current.is_zero() {
        state.capture(current);
        Reconciliation {
            total: current,
            source: TotalSource::Manual,
        }
    } else if computed.is_positive() {
        state.capture(computed);
        Reconciliation {
            total: computed,
            source: TotalSource::Computed,
        }
    } else if let Some(recovered) = recovery
        .recover_total(project_id)
        .filter(|m| !m.is_zero())
    {
        state.capture(recovered);
        Reconciliation {
            total: recovered,
            source: TotalSource::Recovered,
        }
    } else {
        Reconciliation {
            total: Money::zero(),
            source: TotalSource::Zero,
        }
    };

    debug!(
        project = %project_id,
        total = %outcome.total,
        source = %outcome.source,
        "reconciled total budget"
    );

    outcome
}
