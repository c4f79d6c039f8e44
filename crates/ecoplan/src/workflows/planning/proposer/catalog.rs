use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::{Proposer, ProposerError};
use crate::workflows::intake::NormalizedInput;
use crate::workflows::planning::domain::{Disruption, RawCandidate};

/// Part of the household an action touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplianceArea {
    #[serde(alias = "AC", alias = "hvac")]
    Ac,
    Lighting,
    Standby,
    Envelope,
    #[serde(other)]
    Other,
}

/// One row of the static fallback table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub action: String,
    #[serde(default, deserialize_with = "pipe_separated")]
    pub steps: Vec<String>,
    #[serde(default, deserialize_with = "empty_as_zero")]
    pub pct_min: f64,
    #[serde(default, deserialize_with = "empty_as_zero")]
    pub pct_max: f64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub kwh_saved: Option<f64>,
    #[serde(default, deserialize_with = "empty_as_zero")]
    pub cost: f64,
    #[serde(default)]
    pub disruption: Disruption,
    #[serde(default)]
    pub notes: String,
    pub area: ApplianceArea,
    #[serde(default)]
    pub high_impact: bool,
}

impl CatalogEntry {
    fn to_candidate(&self) -> RawCandidate {
        let candidate = RawCandidate::new(self.action.clone())
            .with_steps(self.steps.iter().cloned())
            .with_pct_range(self.pct_min, self.pct_max)
            .with_cost(self.cost)
            .with_disruption(self.disruption.label())
            .with_notes(self.notes.clone());
        match self.kwh_saved {
            Some(kwh) => candidate.with_kwh_saved(kwh),
            None => candidate,
        }
    }

    fn applies_to(&self, input: &NormalizedInput) -> bool {
        match self.area {
            ApplianceArea::Ac => input.has_air_conditioning(),
            ApplianceArea::Lighting => input.has_lighting(),
            ApplianceArea::Standby | ApplianceArea::Envelope | ApplianceArea::Other => true,
        }
    }
}

/// Catalog loading failure.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("catalog contains no entries")]
    Empty,
}

/// Static fallback proposer backed by a table of well-known measures.
///
/// The table is biased by the household's current policy the same way a
/// generated proposal would be: entries above the disruption ceiling are left
/// out, and high-impact retrofits only appear once an emissions goal is set.
#[derive(Debug, Clone)]
pub struct CatalogProposer {
    entries: Vec<CatalogEntry>,
}

impl Default for CatalogProposer {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CatalogProposer {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_entries())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut entries = Vec::new();
        for row in csv_reader.deserialize::<CatalogEntry>() {
            entries.push(row?);
        }
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

impl Proposer for CatalogProposer {
    fn propose(&self, input: &NormalizedInput) -> Result<Vec<RawCandidate>, ProposerError> {
        let policy = input.policy.as_ref();
        let ceiling = policy.and_then(|policy| policy.max_disruption);
        let wants_high_impact = policy
            .and_then(|policy| policy.emissions_goal_pct)
            .is_some_and(|goal| goal > 0.0);

        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.applies_to(input))
            .filter(|entry| ceiling.map_or(true, |max| entry.disruption <= max))
            .filter(|entry| !entry.high_impact || wants_high_impact)
            .map(CatalogEntry::to_candidate)
            .collect())
    }

    fn name(&self) -> &str {
        "catalog"
    }
}

fn pipe_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .split('|')
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .map(str::to_string)
        .collect())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn empty_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(empty_as_none(deserializer)?.unwrap_or(0.0))
}

fn entry(
    action: &str,
    steps: &[&str],
    pct: (f64, f64),
    cost: f64,
    disruption: Disruption,
    area: ApplianceArea,
    notes: &str,
) -> CatalogEntry {
    CatalogEntry {
        action: action.to_string(),
        steps: steps.iter().map(|step| step.to_string()).collect(),
        pct_min: pct.0,
        pct_max: pct.1,
        kwh_saved: None,
        cost,
        disruption,
        notes: notes.to_string(),
        area,
        high_impact: false,
    }
}

fn builtin_entries() -> Vec<CatalogEntry> {
    let mut inverter = entry(
        "Replace the oldest AC with an inverter unit",
        &["Pick a 5-star inverter model sized to the room", "Recycle the old unit"],
        (15.0, 25.0),
        180_000.0,
        Disruption::High,
        ApplianceArea::Ac,
        "Largest single saving when an old fixed-speed unit runs daily.",
    );
    inverter.high_impact = true;

    let mut roof = entry(
        "Insulate the ceiling and coat the roof",
        &["Lay ceiling insulation", "Apply reflective roof coating"],
        (8.0, 12.0),
        90_000.0,
        Disruption::High,
        ApplianceArea::Envelope,
        "Cuts heat gain and with it cooling load.",
    );
    roof.high_impact = true;

    vec![
        entry(
            "Raise AC setpoint to 25-26 C",
            &["Set thermostat to 25 C", "Use the fan mode at night"],
            (5.0, 10.0),
            0.0,
            Disruption::None,
            ApplianceArea::Ac,
            "Each degree higher trims roughly 3-5% of cooling energy.",
        ),
        entry(
            "Clean and service AC filters",
            &["Wash filters monthly", "Book a coil service once a year"],
            (3.0, 5.0),
            2_500.0,
            Disruption::Low,
            ApplianceArea::Ac,
            "",
        ),
        entry(
            "Switch remaining bulbs to LED",
            &["Replace the most-used bulbs first"],
            (5.0, 10.0),
            3_000.0,
            Disruption::Low,
            ApplianceArea::Lighting,
            "",
        ),
        entry(
            "Put outdoor lighting on timers",
            &["Fit a plug-in or DIN timer"],
            (1.0, 3.0),
            6_000.0,
            Disruption::Low,
            ApplianceArea::Lighting,
            "",
        ),
        entry(
            "Cut standby loads with switched power strips",
            &["Group TV and media devices on one strip", "Switch off at night"],
            (2.0, 4.0),
            4_000.0,
            Disruption::None,
            ApplianceArea::Standby,
            "",
        ),
        entry(
            "Add window shading on sun-facing rooms",
            &["Fit external blinds or film on west windows"],
            (3.0, 6.0),
            25_000.0,
            Disruption::Medium,
            ApplianceArea::Envelope,
            "",
        ),
        inverter,
        roof,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::intake::{AcUnit, Lighting};
    use crate::workflows::planning::domain::Policy;

    fn household(policy: Option<Policy>) -> NormalizedInput {
        NormalizedInput {
            monthly_kwh: 320.0,
            tariff_per_kwh: 62.0,
            floor_area_m2: 90.0,
            ac_units: vec![AcUnit {
                watt: 1200.0,
                hours_per_day: 8.0,
                star_rating: 2,
                count: 1,
            }],
            lighting: Lighting {
                bulbs: 10,
                watt_per_bulb: 40.0,
                hours_per_day: 5.0,
            },
            policy,
        }
    }

    fn labels(candidates: &[RawCandidate]) -> Vec<String> {
        candidates
            .iter()
            .filter_map(|candidate| candidate.action.as_str().map(str::to_string))
            .collect()
    }

    #[test]
    fn skips_high_impact_entries_without_emissions_goal() {
        let proposer = CatalogProposer::builtin();
        let proposed = proposer
            .propose(&household(Some(Policy::unconstrained())))
            .expect("catalog proposes");

        assert!(!labels(&proposed)
            .iter()
            .any(|label| label.contains("inverter")));
    }

    #[test]
    fn honours_disruption_ceiling_and_goal() {
        let proposer = CatalogProposer::builtin();
        let policy = Policy {
            emissions_goal_pct: Some(20.0),
            max_disruption: Some(Disruption::High),
            ..Policy::default()
        };
        let with_goal = proposer
            .propose(&household(Some(policy)))
            .expect("catalog proposes");
        assert!(labels(&with_goal).iter().any(|label| label.contains("inverter")));

        let low_only = Policy {
            max_disruption: Some(Disruption::Low),
            ..Policy::default()
        };
        let proposed = proposer
            .propose(&household(Some(low_only)))
            .expect("catalog proposes");
        assert!(!proposed.is_empty());
        assert!(proposed
            .iter()
            .all(|candidate| Disruption::parse_lenient(candidate.disruption.as_str().unwrap_or(""))
                <= Disruption::Low));
    }

    #[test]
    fn leaves_out_appliances_the_household_lacks() {
        let mut input = household(None);
        input.ac_units.clear();
        let proposed = CatalogProposer::builtin()
            .propose(&input)
            .expect("catalog proposes");

        assert!(!labels(&proposed).iter().any(|label| label.contains("AC")));
    }

    #[test]
    fn loads_entries_from_csv() {
        let csv = "action,steps,pct_min,pct_max,kwh_saved,cost,disruption,notes,area,high_impact\n\
Swap fridge door seals,Measure seals|Fit new gaskets,2,4,,1500,low,,other,false\n\
Solar water heater,,,,45,95000,HIGH,,other,true\n";

        let proposer = CatalogProposer::from_reader(csv.as_bytes()).expect("catalog loads");

        assert_eq!(proposer.entries().len(), 2);
        assert_eq!(proposer.entries()[0].steps.len(), 2);
        assert_eq!(proposer.entries()[1].kwh_saved, Some(45.0));
        assert_eq!(proposer.entries()[1].disruption, Disruption::High);
    }

    #[test]
    fn rejects_empty_catalog() {
        let csv = "action,steps,pct_min,pct_max,kwh_saved,cost,disruption,notes,area,high_impact\n";
        match CatalogProposer::from_reader(csv.as_bytes()) {
            Err(CatalogError::Empty) => {}
            other => panic!("expected empty catalog error, got {other:?}"),
        }
    }
}
