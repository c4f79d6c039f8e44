//! Typed recursive merge of retry patches into the planning input.
//!
//! Patch fields win; nested structures merge field by field; an absent nested
//! target is created from its defaults before merging.

use super::domain::{InputPatch, Policy, PolicyPatch};
use crate::workflows::intake::NormalizedInput;

pub trait Merge {
    type Patch;

    fn merge(&mut self, patch: &Self::Patch);
}

impl Merge for Policy {
    type Patch = PolicyPatch;

    fn merge(&mut self, patch: &PolicyPatch) {
        if let Some(budget) = patch.target_budget {
            self.target_budget = Some(budget);
        }
        if let Some(ceiling) = patch.payback_ceiling_months {
            self.payback_ceiling_months = Some(ceiling);
        }
        if let Some(goal) = patch.emissions_goal_pct {
            self.emissions_goal_pct = Some(goal);
        }
        if let Some(level) = patch.max_disruption {
            self.max_disruption = Some(level);
        }
    }
}

impl<T> Merge for Option<T>
where
    T: Merge + Default,
{
    type Patch = T::Patch;

    fn merge(&mut self, patch: &T::Patch) {
        self.get_or_insert_with(T::default).merge(patch);
    }
}

impl Merge for NormalizedInput {
    type Patch = InputPatch;

    fn merge(&mut self, patch: &InputPatch) {
        if let Some(policy) = &patch.policy {
            self.policy.merge(policy);
        }
    }
}

/// Non-mutating form used by the loop: the previous input stays untouched.
pub fn merged<T>(base: &T, patch: &T::Patch) -> T
where
    T: Merge + Clone,
{
    let mut next = base.clone();
    next.merge(patch);
    next
}
