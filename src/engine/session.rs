//! Editing session over one project
//!
//! Owns the in-memory tree, the reconciliation memory and the recompute
//! schedule for the lifetime of one editing session. Every mutation goes
//! through here so the schedule sees it.

use std::time::Instant;

use tracing::debug;

use super::aggregate::recompute_tree;
use super::reconcile::{reconcile_total, Reconciliation, ReconcileState, TotalRecovery};
use super::trigger::{ChangeKind, RecomputeTrigger};
use crate::config::Settings;
use crate::error::BudgetResult;
use crate::models::{Category, Money, NodePath, Project};

#[derive(Debug, Clone)]
pub struct EditSession {
    project: Project,
    reconcile: ReconcileState,
    trigger: RecomputeTrigger,
    last: Option<Reconciliation>,
    dirty: bool,
}

impl EditSession {
    /// Start a session; the first pass runs after the settle delay
    ///
    /// A non-zero stored total is captured as the original before any edit
    /// can reach it.
    pub fn open(project: Project, settings: &Settings, now: Instant) -> Self {
        let mut trigger = RecomputeTrigger::from_settings(settings);
        trigger.notify(ChangeKind::BulkLoad, now);
        let reconcile = ReconcileState::with_original(project.total_budget);

        Self {
            project,
            reconcile,
            trigger,
            last: None,
            dirty: false,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn into_project(self) -> Project {
        self.project
    }

    pub fn reconcile_state(&self) -> &ReconcileState {
        &self.reconcile
    }

    pub fn trigger(&self) -> &RecomputeTrigger {
        &self.trigger
    }

    pub fn last_reconciliation(&self) -> Option<Reconciliation> {
        self.last
    }

    /// Whether the project changed since it was opened or last saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    fn changed(&mut self, kind: ChangeKind, now: Instant) {
        self.dirty = true;
        self.project.touch();
        self.trigger.notify(kind, now);
    }

    // === Structural edits ===

    pub fn add_category(&mut self, name: &str, now: Instant) -> BudgetResult<NodePath> {
        let path = self.project.add_category(name)?;
        self.changed(ChangeKind::Structural, now);
        Ok(path)
    }

    pub fn add_subcategory(
        &mut self,
        category: usize,
        name: &str,
        now: Instant,
    ) -> BudgetResult<NodePath> {
        let path = self.project.add_subcategory(category, name)?;
        self.changed(ChangeKind::Structural, now);
        Ok(path)
    }

    pub fn add_line(
        &mut self,
        category: usize,
        subcategory: usize,
        name: &str,
        amount: Money,
        now: Instant,
    ) -> BudgetResult<NodePath> {
        let path = self.project.add_line(category, subcategory, name, amount)?;
        self.changed(ChangeKind::Structural, now);
        Ok(path)
    }

    pub fn remove(&mut self, path: NodePath, now: Instant) -> BudgetResult<()> {
        self.project.remove_at(path)?;
        self.changed(ChangeKind::Structural, now);
        Ok(())
    }

    /// Swap the whole category tree, e.g. after a template switch
    pub fn replace_categories(&mut self, categories: Vec<Category>, now: Instant) {
        self.project.categories = categories;
        self.changed(ChangeKind::BulkLoad, now);
    }

    // === Value edits ===

    /// Names never feed the totals, so renaming schedules nothing
    pub fn rename(&mut self, path: NodePath, name: &str) -> BudgetResult<()> {
        self.project.rename_at(path, name)?;
        self.dirty = true;
        self.project.touch();
        Ok(())
    }

    pub fn set_amount(&mut self, path: NodePath, amount: Money, now: Instant) -> BudgetResult<()> {
        self.project.set_amount_at(path, amount)?;
        self.changed(ChangeKind::Value, now);
        Ok(())
    }

    /// User edit of the total-budget field
    ///
    /// A non-zero value becomes the new original; clearing the field leaves
    /// the original in place, so the next pass restores it.
    pub fn edit_total(&mut self, amount: Money, now: Instant) {
        self.project.total_budget = amount;
        self.reconcile.capture(amount);
        self.changed(ChangeKind::Value, now);
    }

    // === Recomputation ===

    /// Run a pass if the schedule says one is due
    pub fn poll(&mut self, now: Instant, recovery: &dyn TotalRecovery) -> Option<Reconciliation> {
        let covered = self.trigger.begin_pass(now)?;
        debug!(project = %self.project.id, changes = covered, "running scheduled recompute");
        Some(self.run_pass(recovery))
    }

    /// Run a pass now, whatever the schedule
    pub fn recompute(&mut self, recovery: &dyn TotalRecovery) -> Reconciliation {
        self.trigger.begin_forced_pass();
        self.run_pass(recovery)
    }

    fn run_pass(&mut self, recovery: &dyn TotalRecovery) -> Reconciliation {
        let before = self.project.clone();

        let computed = recompute_tree(&mut self.project);
        let outcome = reconcile_total(
            &mut self.reconcile,
            self.project.total_budget,
            computed,
            &self.project.id,
            recovery,
        );
        self.project.total_budget = outcome.total;
        self.trigger.end_pass();

        if self.project != before {
            self.dirty = true;
            self.project.touch();
        }
        self.last = Some(outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reconcile::{NoRecovery, TotalSource};
    use crate::models::ProjectId;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn euros(text: &str) -> Money {
        Money::parse_lenient(text)
    }

    fn empty_project() -> Project {
        Project::new("Test", NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
    }

    fn open(project: Project) -> (EditSession, Instant) {
        let now = Instant::now();
        (EditSession::open(project, &Settings::default(), now), now)
    }

    #[test]
    fn test_scenario_single_branch() {
        let (mut session, now) = open(empty_project());
        session.add_category("A", now).unwrap();
        session.add_subcategory(0, "S1", now).unwrap();
        session.add_line(0, 0, "one", euros("€ 10,00"), now).unwrap();
        session.add_line(0, 0, "two", euros("€ 5,00"), now).unwrap();

        let outcome = session.poll(now, &NoRecovery).unwrap();
        let project = session.project();

        assert_eq!(project.subcategory(0, 0).unwrap().amount, euros("€ 15,00"));
        assert_eq!(project.category(0).unwrap().amount, euros("€ 15,00"));
        assert_eq!(project.total_budget, euros("€ 15,00"));
        assert_eq!(outcome.source, TotalSource::Computed);
    }

    #[test]
    fn test_first_pass_waits_for_settle() {
        let (mut session, now) = open(empty_project());
        assert!(session.poll(now, &NoRecovery).is_none());
        assert!(session
            .poll(now + Duration::from_millis(50), &NoRecovery)
            .is_some());
    }

    #[test]
    fn test_original_restored_after_total_cleared() {
        let (mut session, now) = open(empty_project());
        session.add_category("A", now).unwrap();
        session.set_amount(NodePath::Category(0), euros("€ 300,00"), now).unwrap();
        session.edit_total(euros("€ 500,00"), now);
        session.recompute(&NoRecovery);

        session.edit_total(euros("€ 0,00"), now);
        let outcome = session.recompute(&NoRecovery);

        assert_eq!(outcome.total, euros("€ 500,00"));
        assert_eq!(outcome.source, TotalSource::Original);
        assert_eq!(session.project().total_budget, euros("€ 500,00"));
    }

    #[test]
    fn test_stored_total_survives_clear_with_positive_sum() {
        let mut project = empty_project();
        project.add_category("A").unwrap();
        project.set_amount_at(NodePath::Category(0), euros("€ 300,00")).unwrap();
        project.total_budget = euros("€ 500,00");

        let (mut session, now) = open(project);
        assert_eq!(session.reconcile_state().original_total(), Some(euros("€ 500,00")));

        session.edit_total(Money::zero(), now);
        let outcome = session
            .poll(now + Duration::from_millis(300), &NoRecovery)
            .unwrap();

        assert_eq!(outcome.total, euros("€ 500,00"));
        assert_eq!(outcome.source, TotalSource::Original);
        assert_eq!(session.project().total_budget, euros("€ 500,00"));
    }

    #[test]
    fn test_explicit_total_edit_replaces_original() {
        let (mut session, now) = open(empty_project());
        session.edit_total(euros("€ 500,00"), now);
        session.recompute(&NoRecovery);

        session.edit_total(euros("€ 650,00"), now);
        let outcome = session.recompute(&NoRecovery);
        assert_eq!(outcome.total, euros("€ 650,00"));
    }

    #[test]
    fn test_computed_total_not_overwritten_by_later_sums() {
        let (mut session, now) = open(empty_project());
        session.add_category("A", now).unwrap();
        session.set_amount(NodePath::Category(0), euros("€ 100,00"), now).unwrap();
        assert_eq!(session.recompute(&NoRecovery).total, euros("€ 100,00"));

        session.add_category("B", now).unwrap();
        session.set_amount(NodePath::Category(1), euros("€ 50,00"), now).unwrap();
        assert_eq!(session.recompute(&NoRecovery).total, euros("€ 100,00"));
    }

    #[test]
    fn test_full_pass_idempotent() {
        let (mut session, now) = open(empty_project());
        session.add_category("A", now).unwrap();
        session.add_subcategory(0, "S", now).unwrap();
        session.add_line(0, 0, "x", euros("€ 7,50"), now).unwrap();

        session.recompute(&NoRecovery);
        session.mark_saved();
        let total = session.project().total_budget;

        session.recompute(&NoRecovery);
        assert_eq!(session.project().total_budget, total);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_empty_project_uses_recovery_then_zero() {
        let (mut session, _) = open(empty_project());
        let recovery = |_: &ProjectId| Some(euros("€ 420,00"));
        let outcome = session.recompute(&recovery);
        assert_eq!(outcome.source, TotalSource::Recovered);
        assert_eq!(session.project().total_budget, euros("€ 420,00"));

        let (mut session, _) = open(empty_project());
        let outcome = session.recompute(&NoRecovery);
        assert_eq!(outcome.source, TotalSource::Zero);
        assert!(session.project().total_budget.is_zero());
    }

    #[test]
    fn test_value_edit_debounced_structural_immediate() {
        let (mut session, now) = open(empty_project());
        session.recompute(&NoRecovery);

        session.add_category("A", now).unwrap();
        assert!(session.poll(now, &NoRecovery).is_some());

        session.set_amount(NodePath::Category(0), euros("€ 9,00"), now).unwrap();
        assert!(session.poll(now, &NoRecovery).is_none());
        assert!(session
            .poll(now + Duration::from_millis(300), &NoRecovery)
            .is_some());
    }

    #[test]
    fn test_rename_schedules_nothing() {
        let (mut session, now) = open(empty_project());
        session.add_category("A", now).unwrap();
        session.recompute(&NoRecovery);

        session.rename(NodePath::Category(0), "Renamed").unwrap();
        assert!(!session.trigger().is_pending());
        assert!(session.is_dirty());
    }

    #[test]
    fn test_failed_edit_changes_nothing() {
        let (mut session, now) = open(empty_project());
        session.recompute(&NoRecovery);
        session.mark_saved();

        assert!(session.add_subcategory(4, "Nope", now).is_err());
        assert!(!session.is_dirty());
        assert!(!session.trigger().is_pending());
    }
}
