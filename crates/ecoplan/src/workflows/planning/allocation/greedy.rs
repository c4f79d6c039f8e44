use std::cmp::Ordering;

use super::super::domain::ScoredAction;

/// Outcome of fitting a set of actions into a budget.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub selected: Vec<ScoredAction>,
    pub spent: f64,
}

/// Budget allocation strategy used by the last policy stage.
pub trait Allocator: Send + Sync {
    fn allocate(&self, actions: Vec<ScoredAction>, budget: f64) -> Allocation;
}

/// Value-density greedy fill.
///
/// Actions are ranked by energy saved per currency unit, descending, and taken
/// in that order whenever they still fit. There is no backtracking, so the
/// result is an approximation of the best subset, not an exact knapsack solve.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyAllocator;

impl Allocator for GreedyAllocator {
    fn allocate(&self, mut actions: Vec<ScoredAction>, budget: f64) -> Allocation {
        let budget = if budget.is_finite() { budget.max(0.0) } else { 0.0 };

        // stable: equal densities keep proposal order
        actions.sort_by(|a, b| {
            b.value_density()
                .partial_cmp(&a.value_density())
                .unwrap_or(Ordering::Equal)
        });

        let mut spent = 0.0;
        let mut selected = Vec::with_capacity(actions.len());
        for action in actions {
            let cost = action.cost();
            if spent + cost <= budget {
                spent += cost;
                selected.push(action);
            }
        }

        Allocation { selected, spent }
    }
}
