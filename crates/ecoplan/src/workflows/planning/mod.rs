//! Policy-constrained planning: scoring, policy enforcement, acceptance checks
//! and the bounded retry loop that ties them together.

pub mod allocation;
pub mod criteria;
pub mod domain;
pub mod merge;
pub mod planner;
pub mod proposer;
pub(crate) mod report;
pub mod router;
pub mod scoring;
pub mod sink;

#[cfg(test)]
mod tests;

pub use allocation::{Allocation, Allocator, GreedyAllocator, PolicyFilter, DEFAULT_NEGLIGIBLE_COST};
pub use criteria::{check, CheckOutcome, Violation};
pub use domain::{
    Attempt, Baseline, CandidateAction, ConstraintKind, Criteria, Disruption, EnforcedConstraint,
    EnforcementReport, InputPatch, Plan, PlanFlag, PlanTotals, PlanningRun, Policy, PolicyPatch,
    RawCandidate, RunId, RunStatus, SavingsEstimate, ScoredAction,
};
pub use merge::{merged, Merge};
pub use planner::{
    CancellationFlag, PlannerSettings, PlanningError, PlanningLoop, PlanningRequest,
};
pub use proposer::{
    build_prompt, parse_response, ApplianceArea, BoundedProposer, CatalogEntry, CatalogError,
    CatalogProposer, Proposer, ProposerError, ScriptedProposer, TextProposer, TextSource,
};
pub use report::{QUICK_WIN_MAX_COST, QUICK_WIN_MAX_PAYBACK_MONTHS};
pub use router::planning_router;
pub use scoring::{score, score_all};
pub use sink::{AttemptEvent, AttemptSink, SinkError};
