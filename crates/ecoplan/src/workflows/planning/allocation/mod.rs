//! Deterministic policy enforcement over a scored candidate set.
//!
//! Stages run in a fixed order, each on the survivors of the previous one:
//! disruption ceiling, payback ceiling, then budget allocation. The budget stage
//! must run last because it ranks the surviving set by value density.

mod greedy;
mod stages;

pub use greedy::{Allocation, Allocator, GreedyAllocator};

use super::domain::{
    ConstraintKind, EnforcedConstraint, EnforcementReport, Policy, ScoredAction,
};
use tracing::debug;

/// Default cost under which an action with no computable payback is kept.
pub const DEFAULT_NEGLIGIBLE_COST: f64 = 5_000.0;

/// Stateless filter that applies a [`Policy`] to scored actions.
pub struct PolicyFilter<A = GreedyAllocator> {
    negligible_cost: f64,
    allocator: A,
}

impl Default for PolicyFilter<GreedyAllocator> {
    fn default() -> Self {
        Self::new(DEFAULT_NEGLIGIBLE_COST)
    }
}

impl PolicyFilter<GreedyAllocator> {
    pub fn new(negligible_cost: f64) -> Self {
        Self::with_allocator(negligible_cost, GreedyAllocator)
    }
}

impl<A: Allocator> PolicyFilter<A> {
    pub fn with_allocator(negligible_cost: f64, allocator: A) -> Self {
        let negligible_cost = if negligible_cost.is_finite() {
            negligible_cost.max(0.0)
        } else {
            DEFAULT_NEGLIGIBLE_COST
        };
        Self {
            negligible_cost,
            allocator,
        }
    }

    pub fn negligible_cost(&self) -> f64 {
        self.negligible_cost
    }

    /// Filter and allocate. Never fails: missing policy fields or an empty input
    /// just pass through.
    pub fn apply(
        &self,
        actions: Vec<ScoredAction>,
        policy: Option<&Policy>,
    ) -> (Vec<ScoredAction>, EnforcementReport) {
        let mut report = EnforcementReport::default();
        let Some(policy) = policy else {
            return (actions, report);
        };

        let mut survivors = actions;

        if let Some(max) = policy.max_disruption {
            let (kept, dropped) = stages::within_disruption(survivors, max);
            survivors = kept;
            if dropped > 0 {
                report.notes.push(format!(
                    "Dropped {dropped} action(s) exceeding max disruption ({}).",
                    max.label()
                ));
            }
            report.enforced.push(EnforcedConstraint {
                constraint: ConstraintKind::MaxDisruption,
                dropped,
                detail: format!("disruption capped at {}", max.label()),
            });
        }

        if let Some(ceiling) = policy.payback_ceiling_months {
            let (kept, dropped) =
                stages::within_payback(survivors, ceiling, self.negligible_cost);
            survivors = kept;
            if dropped > 0 {
                report.notes.push(format!(
                    "Filtered {dropped} action(s) by payback <= {ceiling} months."
                ));
            }
            report.enforced.push(EnforcedConstraint {
                constraint: ConstraintKind::PaybackCeiling,
                dropped,
                detail: format!(
                    "payback capped at {ceiling} months; unassessable payback allowed up to cost {:.2}",
                    self.negligible_cost
                ),
            });
        }

        if let Some(budget) = policy.target_budget {
            let budget = if budget.is_finite() { budget.max(0.0) } else { 0.0 };
            let before = survivors.len();
            let allocation = self.allocator.allocate(survivors, budget);
            let dropped = before - allocation.selected.len();
            survivors = allocation.selected;
            report.notes.push(format!(
                "Applied budget cap. Spent ~{:.2} of {:.2}.",
                allocation.spent, budget
            ));
            report.enforced.push(EnforcedConstraint {
                constraint: ConstraintKind::BudgetCap,
                dropped,
                detail: format!("spent {:.2} of {:.2}", allocation.spent, budget),
            });
        }

        debug!(
            kept = survivors.len(),
            stages = report.enforced.len(),
            "policy applied"
        );

        (survivors, report)
    }
}
