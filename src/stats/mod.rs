//! Stats module - Aggregations for charts and maps

mod calculator;

pub use calculator::{HexBin, StatsCalculator, HEX_RADIUS_M, MINUTES_PER_HOUR};
