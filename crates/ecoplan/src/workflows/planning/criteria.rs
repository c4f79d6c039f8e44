use serde::{Deserialize, Serialize};

use super::domain::{Baseline, Criteria, Disruption, InputPatch, Plan};

const GOAL_TOLERANCE: f64 = 1e-9;

/// A single failed acceptance predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    DataIncomplete { missing: Vec<String> },
    OverBudget { spent: f64, limit: f64 },
    PaybackTooLong { blended_months: f64, ceiling_months: f64 },
    EmissionsShortfall { achieved_pct: f64, goal_pct: f64 },
    DisruptionTooHigh { seen: Disruption, cap: Disruption },
}

impl Violation {
    pub fn summary(&self) -> String {
        match self {
            Violation::DataIncomplete { missing } => {
                format!("data incomplete: missing {}", missing.join(", "))
            }
            Violation::OverBudget { spent, limit } => {
                format!("over budget: capex {spent:.0} > {limit:.0}")
            }
            Violation::PaybackTooLong {
                blended_months,
                ceiling_months,
            } => format!("payback too long: {blended_months:.1} > {ceiling_months:.1} months"),
            Violation::EmissionsShortfall {
                achieved_pct,
                goal_pct,
            } => format!("emissions reduction shortfall: {achieved_pct:.1}% < {goal_pct:.1}%"),
            Violation::DisruptionTooHigh { seen, cap } => format!(
                "disruption too high: max seen {} > cap {}",
                seen.label(),
                cap.label()
            ),
        }
    }
}

/// Verdict for one plan plus the policy patch that should steer a retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub accepted: bool,
    pub reason: String,
    pub violations: Vec<Violation>,
    pub patch: InputPatch,
}

/// `proposed` when it is stricter than `current`; `None` when `current` already is.
fn tighter_upper<T: PartialOrd + Copy>(current: Option<T>, proposed: T) -> Option<T> {
    match current {
        Some(current) if current <= proposed => None,
        _ => Some(proposed),
    }
}

fn tighter_lower(current: Option<f64>, proposed: f64) -> Option<f64> {
    match current {
        Some(current) if current >= proposed => None,
        _ => Some(proposed),
    }
}

/// Judge a finished plan against the acceptance criteria.
///
/// Every applicable predicate is evaluated; failures are reported together.
/// The patch only carries policy fields that tighten the policy the plan was
/// built under, so a retry never relaxes a household's own limits.
pub fn check(plan: &Plan, baseline: &Baseline, criteria: &Criteria) -> CheckOutcome {
    let mut violations = Vec::new();
    let mut patch = InputPatch::default();
    let totals = &plan.totals;
    let policy = plan.policy.as_ref();

    if criteria.require_data_complete {
        let mut missing = Vec::new();
        if baseline.monthly_kwh <= 0.0 {
            missing.push("monthly_kwh".to_string());
        }
        if baseline.tariff_per_kwh <= 0.0 {
            missing.push("tariff_per_kwh".to_string());
        }
        if !missing.is_empty() {
            violations.push(Violation::DataIncomplete { missing });
        }
    }

    if let Some(limit) = criteria.max_budget.filter(|limit| limit.is_finite()) {
        let limit = limit.max(0.0);
        if totals.total_cost > limit {
            violations.push(Violation::OverBudget {
                spent: totals.total_cost,
                limit,
            });
            if let Some(budget) =
                tighter_upper(policy.and_then(|policy| policy.target_budget), limit)
            {
                patch.policy_mut().target_budget = Some(budget);
            }
        }
    }

    if let (Some(ceiling), Some(blended)) = (
        criteria
            .payback_ceiling_months
            .filter(|ceiling| ceiling.is_finite()),
        totals.blended_payback_months,
    ) {
        let ceiling = ceiling.max(0.0);
        if blended > ceiling {
            violations.push(Violation::PaybackTooLong {
                blended_months: blended,
                ceiling_months: ceiling,
            });
            // policy ceilings are whole months; round down so the retry is at least as strict
            let months = ceiling.floor().min(f64::from(u32::MAX)) as u32;
            if let Some(months) = tighter_upper(
                policy.and_then(|policy| policy.payback_ceiling_months),
                months,
            ) {
                patch.policy_mut().payback_ceiling_months = Some(months);
            }
        }
    }

    if let Some(goal) = criteria.emissions_goal_pct.filter(|goal| goal.is_finite()) {
        if baseline.monthly_kwh > 0.0 {
            let goal = goal.clamp(0.0, 100.0);
            let achieved = totals.kwh_saved_per_month / baseline.monthly_kwh * 100.0;
            if achieved + GOAL_TOLERANCE < goal {
                violations.push(Violation::EmissionsShortfall {
                    achieved_pct: achieved,
                    goal_pct: goal,
                });
                if let Some(goal) =
                    tighter_lower(policy.and_then(|policy| policy.emissions_goal_pct), goal)
                {
                    patch.policy_mut().emissions_goal_pct = Some(goal);
                }
            }
        }
    }

    if let Some(cap) = criteria.max_disruption {
        let seen = plan
            .candidates
            .iter()
            .map(|action| action.disruption())
            .max();
        if let Some(seen) = seen.filter(|seen| seen.rank() > cap.rank()) {
            violations.push(Violation::DisruptionTooHigh { seen, cap });
            if let Some(cap) = tighter_upper(policy.and_then(|policy| policy.max_disruption), cap)
            {
                patch.policy_mut().max_disruption = Some(cap);
            }
        }
    }

    let accepted = violations.is_empty();
    let reason = if accepted {
        "OK".to_string()
    } else {
        violations
            .iter()
            .map(Violation::summary)
            .collect::<Vec<_>>()
            .join("; ")
    };

    CheckOutcome {
        accepted,
        reason,
        violations,
        patch: if accepted { InputPatch::default() } else { patch },
    }
}
