use super::common::*;

use crate::workflows::planning::allocation::{Allocator, GreedyAllocator, PolicyFilter};
use crate::workflows::planning::domain::{ConstraintKind, Disruption, Policy, ScoredAction};

fn labels(actions: &[ScoredAction]) -> Vec<&str> {
    actions.iter().map(ScoredAction::label).collect()
}

fn mixed_set() -> Vec<ScoredAction> {
    vec![
        action("Setpoint", 20.0, 0.0, Disruption::None),
        action("LED bulbs", 16.0, 3_000.0, Disruption::Low),
        action("Window film", 12.0, 11_000.0, Disruption::Medium),
        action("Inverter AC", 60.0, 180_000.0, Disruption::High),
        action("Smart strips", 6.0, 4_000.0, Disruption::None),
    ]
}

#[test]
fn no_policy_is_identity() {
    let filter = PolicyFilter::default();
    let input = mixed_set();

    let (output, report) = filter.apply(input.clone(), None);

    assert_eq!(output, input);
    assert!(report.notes.is_empty());
    assert!(report.enforced.is_empty());
}

#[test]
fn unconstrained_policy_keeps_everything_in_order() {
    let (output, report) = PolicyFilter::default().apply(mixed_set(), Some(&Policy::unconstrained()));

    assert_eq!(output, mixed_set());
    assert!(report.enforced.is_empty());
}

#[test]
fn no_survivor_exceeds_the_disruption_ceiling() {
    for max in [
        Disruption::None,
        Disruption::Low,
        Disruption::Medium,
        Disruption::High,
    ] {
        let policy = Policy {
            max_disruption: Some(max),
            ..Policy::unconstrained()
        };
        let (output, report) = PolicyFilter::default().apply(mixed_set(), Some(&policy));

        assert!(output.iter().all(|a| a.disruption().rank() <= max.rank()));
        let expected_dropped = mixed_set()
            .iter()
            .filter(|a| a.disruption() > max)
            .count();
        assert_eq!(report.enforced[0].constraint, ConstraintKind::MaxDisruption);
        assert_eq!(report.enforced[0].dropped, expected_dropped);
    }
}

#[test]
fn disruption_note_names_the_ceiling() {
    let policy = Policy {
        max_disruption: Some(Disruption::Low),
        ..Policy::unconstrained()
    };
    let (_, report) = PolicyFilter::default().apply(mixed_set(), Some(&policy));

    assert_eq!(
        report.notes,
        vec!["Dropped 2 action(s) exceeding max disruption (low).".to_string()]
    );
}

#[test]
fn payback_stage_keeps_cheap_actions_without_payback() {
    let mut no_payback = action("Draught stoppers", 0.0, 1_200.0, Disruption::Low);
    no_payback.payback_months = None;
    let mut pricey_no_payback = action("Mystery gadget", 0.0, 8_000.0, Disruption::Low);
    pricey_no_payback.payback_months = None;

    let policy = Policy {
        payback_ceiling_months: Some(12),
        ..Policy::unconstrained()
    };
    let mut actions = mixed_set();
    actions.push(no_payback);
    actions.push(pricey_no_payback);

    let (output, report) = PolicyFilter::default().apply(actions, Some(&policy));

    let kept = labels(&output);
    assert!(kept.contains(&"Draught stoppers"));
    assert!(!kept.contains(&"Mystery gadget"));
    assert!(!kept.contains(&"Inverter AC"));
    assert!(report
        .notes
        .iter()
        .any(|note| note.starts_with("Filtered ") && note.ends_with("by payback <= 12 months.")));
}

#[test]
fn negligible_cost_threshold_is_configurable() {
    let mut gadget = action("Mystery gadget", 0.0, 8_000.0, Disruption::Low);
    gadget.payback_months = None;
    let policy = Policy {
        payback_ceiling_months: Some(6),
        ..Policy::unconstrained()
    };

    let (output, _) = PolicyFilter::new(10_000.0).apply(vec![gadget], Some(&policy));

    assert_eq!(labels(&output), vec!["Mystery gadget"]);
}

#[test]
fn budget_is_never_exceeded() {
    for budget in [0.0, 2_999.0, 3_000.0, 7_000.0, 15_000.0, 1_000_000.0] {
        let policy = Policy {
            target_budget: Some(budget),
            ..Policy::unconstrained()
        };
        let (output, report) = PolicyFilter::default().apply(mixed_set(), Some(&policy));

        let total: f64 = output.iter().map(ScoredAction::cost).sum();
        assert!(total <= budget, "spent {total} of {budget}");
        assert!(report.notes.last().is_some_and(|note| note.starts_with("Applied budget cap.")));
    }
}

#[test]
fn free_action_is_selected_even_with_zero_budget() {
    let policy = Policy {
        target_budget: Some(0.0),
        ..Policy::unconstrained()
    };
    let (output, report) =
        PolicyFilter::default().apply(vec![scored(free_setpoint())], Some(&policy));

    assert_eq!(labels(&output), vec!["Raise AC setpoint"]);
    assert_eq!(
        report.notes,
        vec!["Applied budget cap. Spent ~0.00 of 0.00.".to_string()]
    );
}

#[test]
fn greedy_ranks_by_value_density_and_skips_what_no_longer_fits() {
    let actions = vec![
        action("Dense but big", 50.0, 9_000.0, Disruption::Low),
        action("Densest", 30.0, 2_000.0, Disruption::Low),
        action("Filler", 5.0, 1_000.0, Disruption::Low),
    ];

    let allocation = GreedyAllocator.allocate(actions, 10_000.0);

    assert_eq!(labels(&allocation.selected), vec!["Densest", "Filler"]);
    assert_eq!(allocation.spent, 3_000.0);
}

#[test]
fn empty_input_with_budget_yields_empty_selection_and_note() {
    let policy = Policy {
        target_budget: Some(5_000.0),
        ..Policy::default()
    };

    let (output, report) = PolicyFilter::default().apply(Vec::new(), Some(&policy));

    assert!(output.is_empty());
    assert_eq!(report.notes.len(), 1);
    assert_eq!(report.enforced.len(), 2);
}
