use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::workflows::intake::RawHousehold;
use crate::workflows::planning::domain::{
    Baseline, CandidateAction, Criteria, Disruption, Policy, RawCandidate, ScoredAction,
};
use crate::workflows::planning::planner::{PlannerSettings, PlanningLoop, PlanningRequest};
use crate::workflows::planning::proposer::Proposer;
use crate::workflows::planning::scoring::score;
use crate::workflows::planning::sink::{AttemptEvent, AttemptSink, SinkError};

pub(super) const EMISSION_FACTOR: f64 = 0.6;

pub(super) fn baseline() -> Baseline {
    Baseline::new(320.0, 62.0)
}

pub(super) fn scored(raw: RawCandidate) -> ScoredAction {
    score(&CandidateAction::from_raw(&raw), &baseline(), EMISSION_FACTOR)
}

/// Scored action with an absolute saving, so density is easy to reason about.
pub(super) fn action(label: &str, kwh: f64, cost: f64, disruption: Disruption) -> ScoredAction {
    scored(
        RawCandidate::new(label)
            .with_kwh_saved(kwh)
            .with_cost(cost)
            .with_disruption(disruption.label()),
    )
}

pub(super) fn free_setpoint() -> RawCandidate {
    RawCandidate::new("Raise AC setpoint")
        .with_pct_range(10.0, 20.0)
        .with_cost(0.0)
        .with_disruption("none")
}

pub(super) fn inverter_retrofit() -> RawCandidate {
    RawCandidate::new("Inverter AC retrofit")
        .with_pct_range(5.0, 5.0)
        .with_cost(50_000.0)
        .with_disruption("medium")
}

/// Three paid actions totalling 18 000.
pub(super) fn paid_bundle() -> Vec<RawCandidate> {
    vec![
        RawCandidate::new("LED bulbs")
            .with_pct_range(5.0, 8.0)
            .with_cost(3_000.0)
            .with_disruption("low"),
        RawCandidate::new("Smart strips")
            .with_pct_range(2.0, 4.0)
            .with_cost(4_000.0)
            .with_disruption("none"),
        RawCandidate::new("Window film")
            .with_pct_range(4.0, 6.0)
            .with_cost(11_000.0)
            .with_disruption("medium"),
    ]
}

pub(super) fn household(policy: Option<Policy>) -> RawHousehold {
    let mut raw: RawHousehold = serde_json::from_value(json!({
        "monthly_kwh": 320,
        "tariff_per_kwh": 62,
        "floor_area_m2": 85,
        "ac_units": [{ "watt": 1500, "hours_per_day": 6, "star_rating": 3, "count": 1 }],
        "lighting": { "bulbs": 12, "watt_per_bulb": 40, "hours_per_day": 5 }
    }))
    .expect("household fixture parses");
    raw.policy = policy;
    raw
}

pub(super) fn request(policy: Option<Policy>, criteria: Criteria) -> PlanningRequest {
    PlanningRequest {
        household: household(policy),
        criteria,
    }
}

pub(super) fn settings(max_iterations: usize) -> PlannerSettings {
    PlannerSettings {
        max_iterations,
        ..PlannerSettings::default()
    }
}

pub(super) fn planning_loop<P>(proposer: P, max_iterations: usize) -> PlanningLoop
where
    P: Proposer + 'static,
{
    PlanningLoop::new(Arc::new(proposer), settings(max_iterations))
}

#[derive(Default)]
pub(super) struct MemorySink {
    events: Mutex<Vec<AttemptEvent>>,
}

impl MemorySink {
    pub(super) fn events(&self) -> Vec<AttemptEvent> {
        self.events.lock().expect("sink mutex poisoned").clone()
    }
}

impl AttemptSink for MemorySink {
    fn record(&self, event: &AttemptEvent) -> Result<(), SinkError> {
        self.events
            .lock()
            .expect("sink mutex poisoned")
            .push(event.clone());
        Ok(())
    }
}

pub(super) struct BrokenSink;

impl AttemptSink for BrokenSink {
    fn record(&self, _event: &AttemptEvent) -> Result<(), SinkError> {
        Err(SinkError::Unavailable("disk full".to_string()))
    }
}
