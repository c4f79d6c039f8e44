use crate::infra::{build_planning_loop, replay_planning_loop};
use clap::Args;
use ecoplan::config::AppConfig;
use ecoplan::error::AppError;
use ecoplan::telemetry::{self, LogSink};
use ecoplan::workflows::intake::{RawAcUnit, RawHousehold, RawLighting};
use ecoplan::workflows::planning::{
    Criteria, Disruption, PlanningRequest, PlanningRun, Policy, ScoredAction,
};
use serde_json::json;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct PlanArgs {
    /// JSON file holding `{ "household": {...}, "criteria": {...} }`
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Action catalog CSV (defaults to PLANNER_CATALOG_CSV, then the built-in table)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Replay a recorded generator response instead of using the catalog
    #[arg(long, conflicts_with = "catalog")]
    pub(crate) response: Option<PathBuf>,
    /// Attempt budget for this run (clamped to 1..=3)
    #[arg(long)]
    pub(crate) max_iterations: Option<usize>,
    /// Print the full run as JSON instead of the text report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Acceptance budget for the sample household.
    #[arg(long, default_value_t = 10_000.0)]
    pub(crate) budget: f64,
    /// Required reduction in percent of baseline consumption.
    #[arg(long)]
    pub(crate) emissions_goal: Option<f64>,
    /// Print the full run as JSON instead of the text report
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_plan(args: PlanArgs) -> Result<(), AppError> {
    let PlanArgs {
        input,
        catalog,
        response,
        max_iterations,
        json,
    } = args;

    let mut config = AppConfig::load()?;
    if let Some(max_iterations) = max_iterations {
        config.planner.max_iterations = max_iterations;
    }
    telemetry::init_with_sink(&config.telemetry, LogSink::Stderr)?;

    let reader = BufReader::new(File::open(&input)?);
    let request: PlanningRequest = serde_json::from_reader(reader)?;

    let planner = match response {
        Some(path) => replay_planning_loop(&config.planner, std::fs::read_to_string(path)?),
        None => build_planning_loop(&config.planner, catalog.as_deref(), None)?,
    };
    let run = planner.run(&request)?;
    print_run(&run, json)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_with_sink(&config.telemetry, LogSink::Stderr)?;

    let request = demo_request(&args);
    let planner = build_planning_loop(&config.planner, None, None)?;

    if !args.json {
        println!("Energy plan demo");
        println!(
            "Household: 320 kWh/mo at {} per kWh, 2 AC units, 14 bulbs",
            config.planner.default_tariff
        );
        println!(
            "Criteria: budget {:.0}{}",
            args.budget,
            args.emissions_goal
                .map(|goal| format!(", reduction goal {goal:.0}%"))
                .unwrap_or_default()
        );
    }

    let run = planner.run(&request)?;
    print_run(&run, args.json)
}

fn demo_request(args: &DemoArgs) -> PlanningRequest {
    let household = RawHousehold {
        monthly_kwh: json!(320),
        floor_area_m2: json!("85"),
        ac_units: vec![
            RawAcUnit {
                watt: json!(1500),
                hours_per_day: json!(8),
                star_rating: json!(2),
                count: json!(1),
            },
            RawAcUnit {
                watt: json!("1.2k"),
                hours_per_day: json!("4"),
                star_rating: json!(4),
                count: json!(1),
            },
        ],
        lighting: Some(RawLighting {
            bulbs: json!(14),
            watt_per_bulb: json!(40),
            hours_per_day: json!(5),
        }),
        policy: Some(Policy {
            max_disruption: Some(Disruption::Medium),
            ..Policy::default()
        }),
        ..RawHousehold::default()
    };

    PlanningRequest {
        household,
        criteria: Criteria {
            max_budget: Some(args.budget),
            emissions_goal_pct: args.emissions_goal,
            ..Criteria::default()
        },
    }
}

fn print_run(run: &PlanningRun, as_json: bool) -> Result<(), AppError> {
    if as_json {
        let rendered = serde_json::to_string_pretty(run).map_err(std::io::Error::other)?;
        println!("{rendered}");
    } else {
        render_run(run);
    }
    Ok(())
}

pub(crate) fn render_run(run: &PlanningRun) {
    println!(
        "\nRun {}: {} after {} attempt(s)",
        run.run_id.0,
        run.status.label(),
        run.attempts.len()
    );

    for attempt in &run.attempts {
        let verdict = if attempt.accepted { "accepted" } else { "rejected" };
        println!(
            "- attempt {}: {} ({}), {} selected, cost {:.0}",
            attempt.attempt,
            verdict,
            attempt.reason,
            attempt.plan.actions.len(),
            attempt.plan.totals.total_cost
        );
        if let Some(err) = &attempt.proposer_error {
            println!("  proposer: {err}");
        }
        if attempt.patch_applied_next {
            if let Some(policy) = &attempt.patch.policy {
                println!(
                    "  retrying with {}",
                    serde_json::to_string(policy).unwrap_or_default()
                );
            }
        }
    }

    let plan = &run.final_plan;
    println!("\n{}", plan.summary);

    if !plan.actions.is_empty() {
        println!("\nSelected actions");
        for action in &plan.actions {
            print_action(action);
        }
    }

    if !plan.enforcement.notes.is_empty() {
        println!("\nPolicy notes");
        for note in &plan.enforcement.notes {
            println!("- {note}");
        }
    }

    if !plan.flags.is_empty() {
        let flags: Vec<String> = plan
            .flags
            .iter()
            .map(|flag| format!("{flag:?}"))
            .collect();
        println!("\nReview flags: {}", flags.join(", "));
    }
}

fn print_action(action: &ScoredAction) {
    let payback = action
        .payback_months
        .map(|months| format!("{months:.1} mo"))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "- {} [{}]: {:.1} kWh/mo, {:.0}/mo, cost {:.0}, payback {}",
        action.label(),
        action.disruption().label(),
        action.kwh_saved_per_month,
        action.money_saved_per_month,
        action.cost(),
        payback
    );
    for step in &action.candidate.steps {
        println!("    * {step}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoplan::config::PlannerConfig;

    #[test]
    fn demo_request_runs_against_builtin_catalog() {
        let args = DemoArgs {
            budget: 10_000.0,
            emissions_goal: None,
            json: false,
        };
        let planner =
            build_planning_loop(&PlannerConfig::default(), None, None).expect("planner builds");

        let run = planner.run(&demo_request(&args)).expect("run completes");

        assert!(run.accepted());
        assert!(run.final_plan.totals.total_cost <= 10_000.0);
        assert_eq!(run.attempts[0].input.ac_units.len(), 2);
        assert_eq!(run.attempts[0].input.ac_units[1].watt, 1_200.0);
    }
}
