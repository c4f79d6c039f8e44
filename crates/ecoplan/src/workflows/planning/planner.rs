//! The planning loop: propose, score, filter, check, and retry with a patch.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::allocation::{PolicyFilter, DEFAULT_NEGLIGIBLE_COST};
use super::criteria;
use super::domain::{
    Attempt, CandidateAction, Criteria, InputPatch, Plan, PlanningRun, RunId, RunStatus,
};
use super::merge::merged;
use super::proposer::{BoundedProposer, Proposer};
use super::report;
use super::scoring;
use super::sink::{AttemptEvent, AttemptSink};
use crate::config::PlannerConfig;
use crate::workflows::intake::{
    GuardrailNormalizer, NormalizedInput, Normalizer, RawHousehold, DEFAULT_TARIFF,
};

/// Smallest and largest attempt budget a loop accepts.
pub const MIN_ITERATIONS: usize = 1;
pub const MAX_ITERATIONS: usize = 3;

/// Construction-time knobs for [`PlanningLoop`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSettings {
    pub max_iterations: usize,
    pub emission_factor: f64,
    pub negligible_cost: f64,
    pub default_tariff: f64,
    /// `None` calls the proposer inline with no deadline.
    pub proposer_timeout: Option<Duration>,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            max_iterations: 2,
            emission_factor: 0.6,
            negligible_cost: DEFAULT_NEGLIGIBLE_COST,
            default_tariff: DEFAULT_TARIFF,
            proposer_timeout: None,
        }
    }
}

impl From<&PlannerConfig> for PlannerSettings {
    fn from(config: &PlannerConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            emission_factor: config.emission_factor,
            negligible_cost: config.negligible_cost,
            default_tariff: config.default_tariff,
            proposer_timeout: Some(config.proposer_timeout),
        }
    }
}

/// Cooperative stop signal, checked before each attempt starts.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Caller-facing input: the raw household and the thresholds a plan must meet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningRequest {
    pub household: RawHousehold,
    #[serde(default)]
    pub criteria: Criteria,
}

/// Contract violations inside the loop. Ordinary planning outcomes are never errors.
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error("run {run_id} finished as {status} without producing a plan")]
    MissingPlan { run_id: String, status: &'static str },
    #[error("planning worker failed: {0}")]
    WorkerFailed(String),
}

enum LoopState {
    Planning { iteration: usize, patch: InputPatch },
    Acting { iteration: usize },
    Checking {
        iteration: usize,
        plan: Plan,
        proposer_error: Option<String>,
    },
    Retrying { iteration: usize, patch: InputPatch },
    Accepted,
    Exhausted,
    Cancelled,
}

/// Bounded propose/check loop. One instance serves any number of independent runs.
pub struct PlanningLoop {
    proposer: Arc<dyn Proposer>,
    normalizer: Arc<dyn Normalizer>,
    filter: PolicyFilter,
    settings: PlannerSettings,
    sink: Option<Arc<dyn AttemptSink>>,
    sequence: AtomicU64,
}

impl PlanningLoop {
    pub fn new(proposer: Arc<dyn Proposer>, settings: PlannerSettings) -> Self {
        let settings = PlannerSettings {
            max_iterations: settings.max_iterations.clamp(MIN_ITERATIONS, MAX_ITERATIONS),
            ..settings
        };
        let proposer: Arc<dyn Proposer> = match settings.proposer_timeout {
            Some(timeout) => Arc::new(BoundedProposer::new(proposer, timeout)),
            None => proposer,
        };

        Self {
            proposer,
            normalizer: Arc::new(GuardrailNormalizer::new(settings.default_tariff)),
            filter: PolicyFilter::new(settings.negligible_cost),
            settings,
            sink: None,
            sequence: AtomicU64::new(1),
        }
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn AttemptSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    pub fn proposer_name(&self) -> &str {
        self.proposer.name()
    }

    pub fn run(&self, request: &PlanningRequest) -> Result<PlanningRun, PlanningError> {
        self.run_with_cancel(request, &CancellationFlag::default())
    }

    pub fn run_with_cancel(
        &self,
        request: &PlanningRequest,
        cancel: &CancellationFlag,
    ) -> Result<PlanningRun, PlanningError> {
        let run_id = self.next_run_id();
        let max_iterations = self.settings.max_iterations;
        info!(
            run_id = %run_id.0,
            proposer = self.proposer.name(),
            max_iterations,
            "planning run started"
        );

        let mut input = self.normalizer.normalize(&request.household);
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut last_plan: Option<Plan> = None;
        let mut state = LoopState::Planning {
            iteration: 0,
            patch: InputPatch::default(),
        };

        let status = loop {
            state = match state {
                LoopState::Planning { iteration, patch } => {
                    if cancel.is_cancelled() {
                        LoopState::Cancelled
                    } else {
                        input = merged(&input, &patch);
                        LoopState::Acting { iteration }
                    }
                }
                LoopState::Acting { iteration } => {
                    let (plan, proposer_error) = self.act(&input);
                    LoopState::Checking {
                        iteration,
                        plan,
                        proposer_error,
                    }
                }
                LoopState::Checking {
                    iteration,
                    plan,
                    proposer_error,
                } => {
                    let outcome = criteria::check(&plan, &input.baseline(), &request.criteria);
                    let retry = !outcome.accepted && iteration + 1 < max_iterations;
                    let patch_applied_next = retry && !outcome.patch.is_empty();

                    let attempt = Attempt {
                        attempt: iteration + 1,
                        input: input.clone(),
                        criteria: request.criteria.clone(),
                        plan: plan.clone(),
                        accepted: outcome.accepted,
                        reason: outcome.reason,
                        patch: outcome.patch.clone(),
                        patch_applied_next,
                        proposer_error,
                    };
                    info!(
                        run_id = %run_id.0,
                        attempt = attempt.attempt,
                        accepted = attempt.accepted,
                        selected = attempt.plan.actions.len(),
                        reason = %attempt.reason,
                        "attempt checked"
                    );
                    self.record(&run_id, &attempt);
                    attempts.push(attempt);
                    last_plan = Some(plan);

                    if outcome.accepted {
                        LoopState::Accepted
                    } else if retry {
                        LoopState::Retrying {
                            iteration,
                            patch: outcome.patch,
                        }
                    } else {
                        LoopState::Exhausted
                    }
                }
                LoopState::Retrying { iteration, patch } => {
                    debug!(run_id = %run_id.0, next = iteration + 2, "retrying with patch");
                    LoopState::Planning {
                        iteration: iteration + 1,
                        patch,
                    }
                }
                LoopState::Accepted => break RunStatus::Accepted,
                LoopState::Exhausted => break RunStatus::Exhausted,
                LoopState::Cancelled => break RunStatus::Cancelled,
            };
        };

        let final_plan = match (last_plan, status) {
            (Some(plan), _) => plan,
            (None, RunStatus::Cancelled) => Plan::empty(),
            (None, status) => {
                error!(
                    run_id = %run_id.0,
                    status = status.label(),
                    "run reached a terminal state without a plan"
                );
                return Err(PlanningError::MissingPlan {
                    run_id: run_id.0,
                    status: status.label(),
                });
            }
        };

        info!(
            run_id = %run_id.0,
            status = status.label(),
            attempts = attempts.len(),
            "planning run finished"
        );

        Ok(PlanningRun {
            run_id,
            status,
            final_plan,
            attempts,
        })
    }

    fn act(&self, input: &NormalizedInput) -> (Plan, Option<String>) {
        let (raw, proposer_error) = match self.proposer.propose(input) {
            Ok(raw) => (raw, None),
            Err(err) => {
                warn!(
                    proposer = self.proposer.name(),
                    error = %err,
                    "proposer failed; attempt continues with no candidates"
                );
                (Vec::new(), Some(err.to_string()))
            }
        };

        let candidates: Vec<CandidateAction> = raw.iter().map(CandidateAction::from_raw).collect();
        let baseline = input.baseline();
        let scored =
            scoring::score_all(&candidates, &baseline, self.settings.emission_factor);
        let policy = input.policy.as_ref();
        let (selected, mut enforcement) = self.filter.apply(scored.clone(), policy);
        if scored.is_empty() {
            enforcement
                .notes
                .push("No candidate actions were proposed.".to_string());
        }

        let plan = report::assemble(
            selected,
            scored,
            enforcement,
            &baseline,
            policy,
            self.settings.emission_factor,
        );
        (plan, proposer_error)
    }

    fn record(&self, run_id: &RunId, attempt: &Attempt) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(err) = sink.record(&AttemptEvent::from_attempt(run_id, attempt)) {
            warn!(run_id = %run_id.0, attempt = attempt.attempt, error = %err, "attempt sink failed");
        }
    }

    fn next_run_id(&self) -> RunId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        RunId(format!("run-{id:06}"))
    }
}
