//! Fan curve, aggregation, readiness gate and the control loop.

pub mod types;
pub mod aggregator;
pub mod curve;
pub mod readiness;
pub mod runner;
