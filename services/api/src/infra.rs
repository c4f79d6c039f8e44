use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

use ecoplan::config::PlannerConfig;
use ecoplan::error::AppError;
use ecoplan::workflows::planning::{
    AttemptEvent, AttemptSink, CatalogProposer, PlannerSettings, PlanningLoop, ProposerError,
    RunId, SinkError, TextProposer,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) attempts: Arc<InMemoryAttemptSink>,
}

/// Runs kept by [`InMemoryAttemptSink`] before the oldest is evicted.
pub(crate) const RETAINED_RUNS: usize = 256;

#[derive(Default)]
struct AttemptLog {
    by_run: HashMap<RunId, Vec<AttemptEvent>>,
    order: VecDeque<RunId>,
}

/// Attempt audit trail for the most recent [`RETAINED_RUNS`] runs.
#[derive(Clone)]
pub(crate) struct InMemoryAttemptSink {
    log: Arc<Mutex<AttemptLog>>,
    capacity: usize,
}

impl Default for InMemoryAttemptSink {
    fn default() -> Self {
        Self::with_capacity(RETAINED_RUNS)
    }
}

impl AttemptSink for InMemoryAttemptSink {
    fn record(&self, event: &AttemptEvent) -> Result<(), SinkError> {
        let mut log = self
            .log
            .lock()
            .map_err(|_| SinkError::Unavailable("attempt log mutex poisoned".to_string()))?;
        let AttemptLog { by_run, order } = &mut *log;

        if !by_run.contains_key(&event.run_id) {
            while order.len() >= self.capacity {
                match order.pop_front() {
                    Some(oldest) => {
                        by_run.remove(&oldest);
                    }
                    None => break,
                }
            }
            order.push_back(event.run_id.clone());
        }
        by_run
            .entry(event.run_id.clone())
            .or_default()
            .push(event.clone());
        Ok(())
    }
}

impl InMemoryAttemptSink {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            log: Arc::new(Mutex::new(AttemptLog::default())),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn events_for(&self, run_id: &RunId) -> Result<Vec<AttemptEvent>, SinkError> {
        let log = self
            .log
            .lock()
            .map_err(|_| SinkError::Unavailable("attempt log mutex poisoned".to_string()))?;
        Ok(log.by_run.get(run_id).cloned().unwrap_or_default())
    }
}

/// Catalog from `catalog` when given, else from config, else the built-in table.
pub(crate) fn load_catalog(
    config: &PlannerConfig,
    catalog: Option<&Path>,
) -> Result<CatalogProposer, AppError> {
    match catalog.or(config.catalog_csv.as_deref()) {
        Some(path) => {
            let proposer = CatalogProposer::from_path(path)?;
            info!(
                path = %path.display(),
                entries = proposer.entries().len(),
                "loaded action catalog"
            );
            Ok(proposer)
        }
        None => Ok(CatalogProposer::builtin()),
    }
}

pub(crate) fn build_planning_loop(
    config: &PlannerConfig,
    catalog: Option<&Path>,
    sink: Option<Arc<dyn AttemptSink>>,
) -> Result<PlanningLoop, AppError> {
    let proposer = load_catalog(config, catalog)?;
    let planner = PlanningLoop::new(Arc::new(proposer), PlannerSettings::from(config));
    Ok(match sink {
        Some(sink) => planner.with_sink(sink),
        None => planner,
    })
}

/// Planning loop whose proposer answers every prompt with the same recorded text.
pub(crate) fn replay_planning_loop(config: &PlannerConfig, recorded: String) -> PlanningLoop {
    let proposer = TextProposer::new(move |_prompt: &str| -> Result<String, ProposerError> {
        Ok(recorded.clone())
    });
    PlanningLoop::new(Arc::new(proposer), PlannerSettings::from(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn catalog_override_takes_precedence_over_config() {
        let dir = std::env::temp_dir().join(format!("ecoplan-catalog-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("catalog.csv");
        let mut file = std::fs::File::create(&path).expect("catalog file");
        writeln!(
            file,
            "action,steps,pct_min,pct_max,kwh_saved,cost,disruption,notes,area,high_impact"
        )
        .expect("header written");
        writeln!(file, "Seal ducts,,4,6,,2000,low,,other,false").expect("row written");

        let config = PlannerConfig {
            catalog_csv: Some(dir.join("missing.csv")),
            ..PlannerConfig::default()
        };
        let proposer = load_catalog(&config, Some(&path)).expect("override loads");
        assert_eq!(proposer.entries().len(), 1);

        let missing = load_catalog(&config, None);
        assert!(matches!(missing, Err(AppError::Catalog(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn sink_groups_events_by_run() {
        let sink = InMemoryAttemptSink::default();
        let planner = build_planning_loop(
            &PlannerConfig::default(),
            None,
            Some(Arc::new(sink.clone())),
        )
        .expect("planner builds");

        let request = serde_json::from_value(serde_json::json!({
            "household": { "monthly_kwh": 300, "tariff_per_kwh": 60 },
            "criteria": { "max_budget": 1000 }
        }))
        .expect("request parses");
        let run = planner.run(&request).expect("run completes");

        let events = sink.events_for(&run.run_id).expect("events readable");
        assert_eq!(events.len(), run.attempts.len());
        assert!(sink
            .events_for(&RunId("run-999999".to_string()))
            .expect("events readable")
            .is_empty());
    }

    #[test]
    fn recorded_response_drives_the_plan() {
        let recorded = r#"Plan follows.
{"recommendations": [
  {"action": "Raise setpoint", "pct_kwh_reduction_min": 10, "est_cost": 0, "disruption": "none"},
  {"action": "Heat pump", "kwh_saved_per_month": 80, "est_cost": "120k", "disruption": "high"}
]}"#;
        let planner = replay_planning_loop(&PlannerConfig::default(), recorded.to_string());

        let request = serde_json::from_value(serde_json::json!({
            "household": { "monthly_kwh": 320, "tariff_per_kwh": 62, "policy": {} }
        }))
        .expect("request parses");
        let run = planner.run(&request).expect("run completes");

        assert!(run.accepted());
        assert_eq!(planner.proposer_name(), "text");
        let labels: Vec<&str> = run.final_plan.actions.iter().map(|a| a.label()).collect();
        assert_eq!(labels, vec!["Raise setpoint"]);
        assert_eq!(run.final_plan.candidates.len(), 2);
    }

    #[test]
    fn oldest_runs_are_evicted_past_capacity() {
        let sink = InMemoryAttemptSink::with_capacity(2);
        let planner = build_planning_loop(
            &PlannerConfig::default(),
            None,
            Some(Arc::new(sink.clone())),
        )
        .expect("planner builds");
        let request = serde_json::from_value(serde_json::json!({
            "household": { "monthly_kwh": 300, "tariff_per_kwh": 60 }
        }))
        .expect("request parses");

        let runs: Vec<RunId> = (0..3)
            .map(|_| planner.run(&request).expect("run completes").run_id)
            .collect();

        assert!(sink.events_for(&runs[0]).expect("readable").is_empty());
        assert!(!sink.events_for(&runs[1]).expect("readable").is_empty());
        assert!(!sink.events_for(&runs[2]).expect("readable").is_empty());
    }
}
