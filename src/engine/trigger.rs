//! Recompute scheduling
//!
//! Decides *when* a recomputation pass runs. Structural edits are due
//! immediately, value edits wait for an idle window that restarts on every
//! new keystroke, and bulk rebuilds wait a short settle delay. Callers pass
//! the current `Instant`, which keeps the schedule deterministic and free of
//! background threads.
//!
//! Changes reported while a pass is running are the pass's own writes and
//! are ignored.

use std::time::{Duration, Instant};

use crate::config::Settings;

/// Kind of mutation observed in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// An amount was typed into a node
    Value,
    /// A node was added or removed
    Structural,
    /// The whole tree was (re)built, e.g. on load or template switch
    BulkLoad,
}

#[derive(Debug, Clone)]
pub struct RecomputeTrigger {
    debounce: Duration,
    settle: Duration,
    due_at: Option<Instant>,
    in_pass: bool,
    coalesced: usize,
}

impl RecomputeTrigger {
    pub fn new(debounce: Duration, settle: Duration) -> Self {
        Self {
            debounce,
            settle,
            due_at: None,
            in_pass: false,
            coalesced: 0,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.debounce(), settings.settle())
    }

    /// Report a change; returns false when it was ignored
    pub fn notify(&mut self, kind: ChangeKind, now: Instant) -> bool {
        if self.in_pass {
            return false;
        }

        let due = match kind {
            ChangeKind::Structural => now,
            ChangeKind::BulkLoad => now + self.settle,
            ChangeKind::Value => match self.due_at {
                // An immediate pass is already owed; it will see this edit too
                Some(pending) if pending <= now => pending,
                _ => now + self.debounce,
            },
        };

        self.due_at = Some(match (kind, self.due_at) {
            (ChangeKind::Value, _) | (_, None) => due,
            (_, Some(pending)) => pending.min(due),
        });
        self.coalesced += 1;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.due_at.is_some()
    }

    pub fn due_at(&self) -> Option<Instant> {
        self.due_at
    }

    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.due_at, Some(due) if due <= now)
    }

    /// Start a pass if one is due; returns the number of changes it covers
    pub fn begin_pass(&mut self, now: Instant) -> Option<usize> {
        if self.in_pass || !self.is_due(now) {
            return None;
        }
        Some(self.begin_forced_pass())
    }

    /// Start a pass regardless of schedule
    pub fn begin_forced_pass(&mut self) -> usize {
        self.in_pass = true;
        self.due_at = None;
        std::mem::take(&mut self.coalesced)
    }

    pub fn end_pass(&mut self) {
        self.in_pass = false;
    }

    pub fn in_pass(&self) -> bool {
        self.in_pass
    }
}

impl Default for RecomputeTrigger {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}
