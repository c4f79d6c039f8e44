use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::workflows::intake::NormalizedInput;
use crate::workflows::numeric::{coerce_f64, coerce_string, finite_non_negative};

/// Ordinal inconvenience of carrying out an action: `none < low < medium < high`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disruption {
    None,
    Low,
    #[default]
    Medium,
    High,
}

impl Disruption {
    pub fn rank(self) -> u8 {
        match self {
            Disruption::None => 0,
            Disruption::Low => 1,
            Disruption::Medium => 2,
            Disruption::High => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Disruption::None => "none",
            Disruption::Low => "low",
            Disruption::Medium => "medium",
            Disruption::High => "high",
        }
    }

    /// Unknown labels fall back to `medium`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" => Disruption::None,
            "low" => Disruption::Low,
            "high" => Disruption::High,
            _ => Disruption::Medium,
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::String(text) => Self::parse_lenient(text),
            _ => Disruption::Medium,
        }
    }
}

impl<'de> Deserialize<'de> for Disruption {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(Disruption::from_value(&raw))
    }
}

/// Candidate exactly as a proposer produced it. Every field is untrusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    #[serde(default)]
    pub action: Value,
    #[serde(default)]
    pub steps: Value,
    #[serde(default, alias = "pct_kwh_reduction_min")]
    pub pct_reduction_min: Value,
    #[serde(default, alias = "pct_kwh_reduction_max")]
    pub pct_reduction_max: Value,
    #[serde(default)]
    pub kwh_saved_per_month: Value,
    #[serde(default)]
    pub est_cost: Value,
    #[serde(default)]
    pub notes: Value,
    #[serde(default)]
    pub disruption: Value,
    #[serde(default)]
    pub payback_months: Value,
}

impl RawCandidate {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: Value::String(action.into()),
            ..Self::default()
        }
    }

    pub fn with_pct_range(mut self, min: f64, max: f64) -> Self {
        self.pct_reduction_min = Value::from(min);
        self.pct_reduction_max = Value::from(max);
        self
    }

    pub fn with_kwh_saved(mut self, kwh: f64) -> Self {
        self.kwh_saved_per_month = Value::from(kwh);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.est_cost = Value::from(cost);
        self
    }

    pub fn with_disruption(mut self, level: &str) -> Self {
        self.disruption = Value::String(level.to_string());
        self
    }

    pub fn with_payback(mut self, months: f64) -> Self {
        self.payback_months = Value::from(months);
        self
    }

    pub fn with_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps = Value::Array(
            steps
                .into_iter()
                .map(|step| Value::String(step.into()))
                .collect(),
        );
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Value::String(notes.into());
        self
    }
}

/// How a candidate states its savings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SavingsEstimate {
    Absolute { kwh_per_month: f64 },
    Range { pct_min: f64, pct_max: f64 },
}

/// Validated candidate action. Built from a [`RawCandidate`] without ever failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAction {
    pub action: String,
    pub steps: Vec<String>,
    pub savings: SavingsEstimate,
    pub est_cost: f64,
    pub notes: String,
    pub disruption: Disruption,
    pub declared_payback_months: Option<f64>,
}

impl CandidateAction {
    pub fn from_raw(raw: &RawCandidate) -> Self {
        let action = coerce_string(&raw.action).unwrap_or_else(|| "Unnamed action".to_string());

        let steps = match &raw.steps {
            Value::Array(items) => items.iter().filter_map(coerce_string).collect(),
            Value::String(text) if !text.trim().is_empty() => vec![text.trim().to_string()],
            _ => Vec::new(),
        };

        let savings = match coerce_f64(&raw.kwh_saved_per_month) {
            Some(kwh) => SavingsEstimate::Absolute {
                kwh_per_month: kwh.max(0.0),
            },
            None => {
                let pct_min = coerce_f64(&raw.pct_reduction_min).unwrap_or(0.0);
                let pct_max = coerce_f64(&raw.pct_reduction_max).unwrap_or(pct_min);
                SavingsEstimate::Range { pct_min, pct_max }
            }
        };

        let declared_payback_months =
            coerce_f64(&raw.payback_months).filter(|months| *months >= 0.0);

        Self {
            action,
            steps,
            savings,
            est_cost: coerce_f64(&raw.est_cost).unwrap_or(0.0).max(0.0),
            notes: coerce_string(&raw.notes).unwrap_or_default(),
            disruption: Disruption::from_value(&raw.disruption),
            declared_payback_months,
        }
    }
}

/// Candidate plus the deterministic savings derived for one baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAction {
    pub candidate: CandidateAction,
    pub kwh_saved_per_month: f64,
    pub money_saved_per_month: f64,
    pub co2_kg_saved_per_month: f64,
    pub payback_months: Option<f64>,
}

impl ScoredAction {
    pub fn label(&self) -> &str {
        &self.candidate.action
    }

    pub fn cost(&self) -> f64 {
        self.candidate.est_cost
    }

    pub fn disruption(&self) -> Disruption {
        self.candidate.disruption
    }

    /// Energy saved per currency unit spent. Free actions that save anything rank first.
    pub fn value_density(&self) -> f64 {
        let cost = self.cost();
        if cost <= 0.0 {
            if self.kwh_saved_per_month > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        } else {
            self.kwh_saved_per_month / cost
        }
    }
}

fn default_max_disruption() -> Option<Disruption> {
    Some(Disruption::Medium)
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(coerce_f64(&raw))
}

/// Whole months, floored and clamped at zero.
fn lenient_months<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(coerce_f64(&raw).map(|months| months.floor().clamp(0.0, f64::from(u32::MAX)) as u32))
}

/// A present ceiling is always a ceiling: `null` and unknown labels mean `medium`.
fn lenient_ceiling<'de, D>(deserializer: D) -> Result<Option<Disruption>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(Some(Disruption::from_value(&raw)))
}

/// Constraints that steer which actions get selected. Absent fields impose nothing,
/// except the disruption ceiling which defaults to `medium`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_budget: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_months",
        skip_serializing_if = "Option::is_none"
    )]
    pub payback_ceiling_months: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub emissions_goal_pct: Option<f64>,
    #[serde(
        default = "default_max_disruption",
        deserialize_with = "lenient_ceiling",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_disruption: Option<Disruption>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            target_budget: None,
            payback_ceiling_months: None,
            emissions_goal_pct: None,
            max_disruption: default_max_disruption(),
        }
    }
}

impl Policy {
    /// A policy with every field unset, including the disruption ceiling.
    /// Only reachable from code; a deserialized policy always carries a ceiling.
    pub fn unconstrained() -> Self {
        Self {
            max_disruption: None,
            ..Self::default()
        }
    }

    /// Drop values that cannot be honoured: non-finite numbers, negative budgets,
    /// goals outside 0..=100.
    pub fn sanitized(mut self) -> Self {
        self.target_budget = self
            .target_budget
            .filter(|budget| budget.is_finite())
            .map(|budget| budget.max(0.0));
        self.emissions_goal_pct = self
            .emissions_goal_pct
            .filter(|goal| goal.is_finite())
            .map(|goal| goal.clamp(0.0, 100.0));
        self
    }
}

/// Partial policy update derived from a failed criteria check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payback_ceiling_months: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissions_goal_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_disruption: Option<Disruption>,
}

impl PolicyPatch {
    pub fn is_empty(&self) -> bool {
        self.target_budget.is_none()
            && self.payback_ceiling_months.is_none()
            && self.emissions_goal_pct.is_none()
            && self.max_disruption.is_none()
    }
}

/// Patch applied to the planning input between attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyPatch>,
}

impl InputPatch {
    pub fn is_empty(&self) -> bool {
        self.policy.as_ref().map_or(true, PolicyPatch::is_empty)
    }

    pub(crate) fn policy_mut(&mut self) -> &mut PolicyPatch {
        self.policy.get_or_insert_with(PolicyPatch::default)
    }
}

/// Acceptance thresholds for a finished plan. Distinct from [`Policy`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_budget: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub payback_ceiling_months: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub emissions_goal_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_disruption: Option<Disruption>,
    #[serde(default)]
    pub require_data_complete: bool,
}

/// Consumption and price figures every score is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub monthly_kwh: f64,
    pub tariff_per_kwh: f64,
}

impl Baseline {
    pub fn new(monthly_kwh: f64, tariff_per_kwh: f64) -> Self {
        Self {
            monthly_kwh: finite_non_negative(monthly_kwh),
            tariff_per_kwh: finite_non_negative(tariff_per_kwh),
        }
    }

    pub fn monthly_bill(&self) -> f64 {
        self.monthly_kwh * self.tariff_per_kwh
    }
}

/// Policy stage that was active while filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    MaxDisruption,
    PaybackCeiling,
    BudgetCap,
}

/// Audit entry for one enforced policy field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnforcedConstraint {
    pub constraint: ConstraintKind,
    pub dropped: usize,
    pub detail: String,
}

/// What the policy filter did, in stage order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnforcementReport {
    pub notes: Vec<String>,
    pub enforced: Vec<EnforcedConstraint>,
    pub unmet_constraints: Vec<String>,
}

/// Aggregates over the selected actions only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanTotals {
    pub kwh_saved_per_month: f64,
    pub money_saved_per_month: f64,
    pub co2_kg_saved_per_month: f64,
    pub total_cost: f64,
    pub blended_payback_months: Option<f64>,
    pub reduction_pct: f64,
}

/// Sanity flags raised while assembling a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanFlag {
    SavingsExceedBill,
    NeedsHumanReview,
}

/// Result of one attempt: selection, totals, and the audit trail behind them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<ScoredAction>,
    pub candidates: Vec<ScoredAction>,
    pub quick_wins: Vec<ScoredAction>,
    pub totals: PlanTotals,
    pub enforcement: EnforcementReport,
    pub flags: Vec<PlanFlag>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
}

impl Plan {
    pub fn empty() -> Self {
        Self {
            summary: "No actions selected.".to_string(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Identifier of one top-level planning invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

/// Record of one Plan -> Check cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub attempt: usize,
    pub input: NormalizedInput,
    pub criteria: Criteria,
    pub plan: Plan,
    pub accepted: bool,
    pub reason: String,
    pub patch: InputPatch,
    pub patch_applied_next: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposer_error: Option<String>,
}

/// Terminal state of a planning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Accepted,
    Exhausted,
    Cancelled,
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Accepted => "accepted",
            RunStatus::Exhausted => "exhausted",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

/// Everything handed back to the caller: the last plan and the full attempt trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningRun {
    pub run_id: RunId,
    pub status: RunStatus,
    pub final_plan: Plan,
    pub attempts: Vec<Attempt>,
}

impl PlanningRun {
    pub fn accepted(&self) -> bool {
        self.status == RunStatus::Accepted
    }

    /// Reason recorded on the last attempt, if any ran.
    pub fn final_reason(&self) -> Option<&str> {
        self.attempts.last().map(|attempt| attempt.reason.as_str())
    }
}
