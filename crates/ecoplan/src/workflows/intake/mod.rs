//! Household intake: raw form/API payloads into canonical planner input.

mod guardrails;

pub use guardrails::{
    MAX_APPLIANCE_COUNT, MAX_APPLIANCE_WATTS, MAX_HOURS_PER_DAY, MAX_MONTHLY_KWH,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::workflows::planning::{Baseline, Policy};

/// Default wattage assumed for bulbs when none is given (incandescent/CFL mix).
pub const DEFAULT_BULB_WATTS: f64 = 40.0;
/// Default lighting use when hours are not given.
pub const DEFAULT_LIGHTING_HOURS: f64 = 4.0;
pub const DEFAULT_TARIFF: f64 = 62.0;

/// Air-conditioning unit as supplied by the household. Numbers may be strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAcUnit {
    #[serde(default)]
    pub watt: Value,
    #[serde(default)]
    pub hours_per_day: Value,
    #[serde(default)]
    pub star_rating: Value,
    #[serde(default)]
    pub count: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLighting {
    #[serde(default)]
    pub bulbs: Value,
    #[serde(default)]
    pub watt_per_bulb: Value,
    #[serde(default)]
    pub hours_per_day: Value,
}

/// Household profile as received from a form or API client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawHousehold {
    #[serde(default)]
    pub floor_area_m2: Value,
    #[serde(default)]
    pub ac_units: Vec<RawAcUnit>,
    #[serde(default)]
    pub lighting: Option<RawLighting>,
    #[serde(default)]
    pub tariff_per_kwh: Value,
    #[serde(default, alias = "monthly_kWh")]
    pub monthly_kwh: Value,
    #[serde(default)]
    pub policy: Option<Policy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcUnit {
    pub watt: f64,
    pub hours_per_day: f64,
    pub star_rating: u8,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lighting {
    pub bulbs: u32,
    pub watt_per_bulb: f64,
    pub hours_per_day: f64,
}

/// Canonical planner input. Every number is finite and inside its guardrail range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedInput {
    pub monthly_kwh: f64,
    pub tariff_per_kwh: f64,
    pub floor_area_m2: f64,
    pub ac_units: Vec<AcUnit>,
    pub lighting: Lighting,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
}

impl NormalizedInput {
    pub fn baseline(&self) -> Baseline {
        Baseline::new(self.monthly_kwh, self.tariff_per_kwh)
    }

    pub fn has_air_conditioning(&self) -> bool {
        self.ac_units.iter().any(|unit| unit.count > 0)
    }

    pub fn has_lighting(&self) -> bool {
        self.lighting.bulbs > 0
    }
}

/// Upstream cleaning step feeding the planning loop.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, raw: &RawHousehold) -> NormalizedInput;
}

/// Deterministic clamping normalizer.
#[derive(Debug, Clone)]
pub struct GuardrailNormalizer {
    default_tariff: f64,
}

impl Default for GuardrailNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TARIFF)
    }
}

impl GuardrailNormalizer {
    pub fn new(default_tariff: f64) -> Self {
        let default_tariff = if default_tariff.is_finite() {
            default_tariff.max(0.0)
        } else {
            DEFAULT_TARIFF
        };
        Self { default_tariff }
    }
}

impl Normalizer for GuardrailNormalizer {
    fn normalize(&self, raw: &RawHousehold) -> NormalizedInput {
        let ac_units = raw
            .ac_units
            .iter()
            .map(|unit| AcUnit {
                watt: guardrails::watts(&unit.watt),
                hours_per_day: guardrails::hours(&unit.hours_per_day),
                star_rating: guardrails::star_rating(&unit.star_rating),
                // a listed unit without a count is one unit
                count: match unit.count {
                    Value::Null => 1,
                    ref count => guardrails::count(count),
                },
            })
            .collect();

        let lighting = raw
            .lighting
            .as_ref()
            .map(|lighting| Lighting {
                bulbs: guardrails::count(&lighting.bulbs),
                watt_per_bulb: match lighting.watt_per_bulb {
                    Value::Null => DEFAULT_BULB_WATTS,
                    ref watts => guardrails::watts(watts),
                },
                hours_per_day: match lighting.hours_per_day {
                    Value::Null => DEFAULT_LIGHTING_HOURS,
                    ref hours => guardrails::hours(hours),
                },
            })
            .unwrap_or_default();

        let tariff_per_kwh = match guardrails::tariff(&raw.tariff_per_kwh) {
            Some(tariff) if tariff > 0.0 => tariff,
            _ => self.default_tariff,
        };

        let normalized = NormalizedInput {
            monthly_kwh: guardrails::monthly_kwh(&raw.monthly_kwh),
            tariff_per_kwh,
            floor_area_m2: guardrails::area(&raw.floor_area_m2),
            ac_units,
            lighting,
            policy: raw.policy.clone().map(Policy::sanitized),
        };

        debug!(
            monthly_kwh = normalized.monthly_kwh,
            tariff = normalized.tariff_per_kwh,
            ac_units = normalized.ac_units.len(),
            "household normalized"
        );

        normalized
    }
}
