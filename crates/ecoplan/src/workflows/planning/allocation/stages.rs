use super::super::domain::{Disruption, ScoredAction};

/// Keep actions whose disruption rank is at or under `max`.
pub(crate) fn within_disruption(
    actions: Vec<ScoredAction>,
    max: Disruption,
) -> (Vec<ScoredAction>, usize) {
    let before = actions.len();
    let kept: Vec<ScoredAction> = actions
        .into_iter()
        .filter(|action| action.disruption().rank() <= max.rank())
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Keep actions that pay back within `ceiling_months`.
///
/// An action with no computable payback survives only while its cost is at or
/// under `negligible_cost`.
pub(crate) fn within_payback(
    actions: Vec<ScoredAction>,
    ceiling_months: u32,
    negligible_cost: f64,
) -> (Vec<ScoredAction>, usize) {
    let ceiling = f64::from(ceiling_months);
    let before = actions.len();
    let kept: Vec<ScoredAction> = actions
        .into_iter()
        .filter(|action| match action.payback_months {
            Some(months) => months <= ceiling,
            None => action.cost() <= negligible_cost,
        })
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}
