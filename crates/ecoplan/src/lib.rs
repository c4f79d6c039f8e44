//! Household energy-saving planner.
//!
//! Raw household profiles are normalized, handed to a candidate proposer, scored
//! deterministically, filtered against a spending/payback/disruption policy and
//! checked against acceptance criteria inside a small bounded retry loop.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
