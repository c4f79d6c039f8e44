use super::domain::{Baseline, CandidateAction, SavingsEstimate, ScoredAction};
use crate::workflows::numeric::finite_non_negative;

/// Monthly energy saved by a candidate against `baseline_kwh`.
///
/// Percentage ranges always resolve to their lower end.
pub fn kwh_saved_per_month(candidate: &CandidateAction, baseline_kwh: f64) -> f64 {
    let baseline_kwh = finite_non_negative(baseline_kwh);
    match candidate.savings {
        SavingsEstimate::Absolute { kwh_per_month } => finite_non_negative(kwh_per_month),
        SavingsEstimate::Range { pct_min, .. } => {
            let pct = if pct_min.is_finite() {
                pct_min.clamp(0.0, 100.0)
            } else {
                0.0
            };
            baseline_kwh * pct / 100.0
        }
    }
}

/// Derive savings, emissions and payback for one candidate.
pub fn score(
    candidate: &CandidateAction,
    baseline: &Baseline,
    emission_factor: f64,
) -> ScoredAction {
    let kwh = kwh_saved_per_month(candidate, baseline.monthly_kwh);
    let money = finite_non_negative(kwh * finite_non_negative(baseline.tariff_per_kwh));
    let co2 = finite_non_negative(kwh * finite_non_negative(emission_factor));
    let cost = finite_non_negative(candidate.est_cost);

    let payback_months = match candidate.declared_payback_months {
        Some(declared) if declared.is_finite() && declared >= 0.0 => Some(declared),
        _ if money > 0.0 => Some(cost / money),
        _ => None,
    };

    ScoredAction {
        candidate: candidate.clone(),
        kwh_saved_per_month: kwh,
        money_saved_per_month: money,
        co2_kg_saved_per_month: co2,
        payback_months,
    }
}

/// Score a whole proposal in order.
pub fn score_all(
    candidates: &[CandidateAction],
    baseline: &Baseline,
    emission_factor: f64,
) -> Vec<ScoredAction> {
    candidates
        .iter()
        .map(|candidate| score(candidate, baseline, emission_factor))
        .collect()
}
