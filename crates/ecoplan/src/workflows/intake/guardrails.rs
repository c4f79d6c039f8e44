use serde_json::Value;

use crate::workflows::numeric::{clamp, coerce_f64};

pub const MAX_HOURS_PER_DAY: f64 = 24.0;
pub const MAX_APPLIANCE_WATTS: f64 = 10_000.0;
pub const MAX_APPLIANCE_COUNT: f64 = 1_000.0;
pub const MAX_MONTHLY_KWH: f64 = 10_000_000.0;
const MAX_FLOOR_AREA_M2: f64 = 100_000.0;

pub(super) fn hours(value: &Value) -> f64 {
    clamp(value, 0.0, MAX_HOURS_PER_DAY)
}

pub(super) fn watts(value: &Value) -> f64 {
    clamp(value, 0.0, MAX_APPLIANCE_WATTS)
}

pub(super) fn count(value: &Value) -> u32 {
    clamp(value, 0.0, MAX_APPLIANCE_COUNT) as u32
}

pub(super) fn monthly_kwh(value: &Value) -> f64 {
    clamp(value, 0.0, MAX_MONTHLY_KWH)
}

pub(super) fn area(value: &Value) -> f64 {
    clamp(value, 0.0, MAX_FLOOR_AREA_M2)
}

pub(super) fn star_rating(value: &Value) -> u8 {
    coerce_f64(value)
        .map(|rating| rating.clamp(1.0, 5.0))
        .unwrap_or(3.0)
        .round() as u8
}

/// `None` when the value is missing or unreadable, so the caller can apply its default.
pub(super) fn tariff(value: &Value) -> Option<f64> {
    coerce_f64(value).map(|tariff| tariff.max(0.0))
}
