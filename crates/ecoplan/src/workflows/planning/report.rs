use std::cmp::Ordering;
use std::fmt::Write as _;

use super::domain::{
    Baseline, EnforcementReport, Plan, PlanFlag, PlanTotals, Policy, ScoredAction,
};

/// Actions at or under this cost count as quick wins regardless of payback.
pub const QUICK_WIN_MAX_COST: f64 = 10_000.0;
/// Actions paying back within this many months count as quick wins.
pub const QUICK_WIN_MAX_PAYBACK_MONTHS: f64 = 6.0;
/// Reductions above this share of the baseline are flagged for a human look.
const HUMAN_REVIEW_REDUCTION_PCT: f64 = 50.0;

pub(crate) fn totals(selected: &[ScoredAction], baseline: &Baseline) -> PlanTotals {
    let kwh: f64 = selected.iter().map(|a| a.kwh_saved_per_month).sum();
    let money: f64 = selected.iter().map(|a| a.money_saved_per_month).sum();
    let co2: f64 = selected.iter().map(|a| a.co2_kg_saved_per_month).sum();
    let cost: f64 = selected.iter().map(ScoredAction::cost).sum();

    let blended_payback_months = (money > 0.0).then(|| cost / money);
    let reduction_pct = if baseline.monthly_kwh > 0.0 {
        kwh / baseline.monthly_kwh * 100.0
    } else {
        0.0
    };

    PlanTotals {
        kwh_saved_per_month: kwh,
        money_saved_per_month: money,
        co2_kg_saved_per_month: co2,
        total_cost: cost,
        blended_payback_months,
        reduction_pct,
    }
}

fn quick_wins(selected: &[ScoredAction]) -> Vec<ScoredAction> {
    let mut wins: Vec<ScoredAction> = selected
        .iter()
        .filter(|action| {
            action.cost() <= QUICK_WIN_MAX_COST
                || action
                    .payback_months
                    .is_some_and(|months| months <= QUICK_WIN_MAX_PAYBACK_MONTHS)
        })
        .cloned()
        .collect();

    wins.sort_by(|a, b| {
        a.cost()
            .partial_cmp(&b.cost())
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                let pa = a.payback_months.unwrap_or(f64::MAX);
                let pb = b.payback_months.unwrap_or(f64::MAX);
                pa.partial_cmp(&pb).unwrap_or(Ordering::Equal)
            })
            .then_with(|| {
                b.kwh_saved_per_month
                    .partial_cmp(&a.kwh_saved_per_month)
                    .unwrap_or(Ordering::Equal)
            })
    });
    wins
}

fn flags(totals: &PlanTotals, baseline: &Baseline) -> Vec<PlanFlag> {
    let mut flags = Vec::new();
    let bill = baseline.monthly_bill();
    if bill > 0.0 && totals.money_saved_per_month > bill {
        flags.push(PlanFlag::SavingsExceedBill);
    }
    if totals.reduction_pct > HUMAN_REVIEW_REDUCTION_PCT {
        flags.push(PlanFlag::NeedsHumanReview);
    }
    flags
}

fn summary(
    totals: &PlanTotals,
    quick_wins: &[ScoredAction],
    selected: usize,
    emissions_pct: f64,
    unmet: &[String],
) -> String {
    let mut text = String::from("### Action Plan\n");
    if selected == 0 {
        text.push_str("- No actions fit the current constraints.\n");
    }
    let _ = writeln!(
        text,
        "- Estimated monthly savings: {:.2}",
        totals.money_saved_per_month
    );
    let _ = writeln!(
        text,
        "- Energy reduction: {:.2} kWh/mo (~{:.1}%)",
        totals.kwh_saved_per_month, totals.reduction_pct
    );
    let _ = writeln!(
        text,
        "- CO2 reduction: {:.2} kg/mo (~{:.1}%)",
        totals.co2_kg_saved_per_month, emissions_pct
    );
    let _ = writeln!(text, "- One-time cost: {:.0}", totals.total_cost);

    if !quick_wins.is_empty() {
        text.push_str("\nQuick wins (low cost / fast payback):\n");
        for action in quick_wins {
            let payback = action
                .payback_months
                .map(|months| format!(", payback ~{months:.1} mo"))
                .unwrap_or_default();
            let _ = writeln!(
                text,
                "- {}: ~{:.1} kWh/mo, ~{:.0}/mo, cost ~{:.0}{}",
                action.label(),
                action.kwh_saved_per_month,
                action.money_saved_per_month,
                action.cost(),
                payback
            );
        }
    }

    for warning in unmet {
        let _ = writeln!(text, "\n> {warning}");
    }

    text.trim_end().to_string()
}

/// Build the plan for one attempt from the filter output.
pub(crate) fn assemble(
    selected: Vec<ScoredAction>,
    candidates: Vec<ScoredAction>,
    mut enforcement: EnforcementReport,
    baseline: &Baseline,
    policy: Option<&Policy>,
    emission_factor: f64,
) -> Plan {
    let totals = totals(&selected, baseline);

    let emissions_baseline = baseline.monthly_kwh * emission_factor.max(0.0);
    let emissions_pct = if emissions_baseline > 0.0 {
        totals.co2_kg_saved_per_month / emissions_baseline * 100.0
    } else {
        0.0
    };

    if let Some(goal) = policy.and_then(|policy| policy.emissions_goal_pct) {
        if emissions_pct + 1e-9 < goal {
            enforcement.unmet_constraints.push(format!(
                "CO2 goal not fully met: achieved ~{emissions_pct:.1}% vs goal {goal:.1}%. \
                 Consider higher-impact actions or relaxing budget/payback constraints."
            ));
        }
    }

    let quick_wins = quick_wins(&selected);
    let flags = flags(&totals, baseline);
    let summary = summary(
        &totals,
        &quick_wins,
        selected.len(),
        emissions_pct,
        &enforcement.unmet_constraints,
    );

    Plan {
        actions: selected,
        candidates,
        quick_wins,
        totals,
        enforcement,
        flags,
        summary,
        policy: policy.cloned(),
    }
}
