//! Engine configuration.
//!
//! Holds the heuristic thresholds used by validation, grouping and strategy
//! selection. Every field has a default so partial config files are accepted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fraction of the theoretical capacity assumed reachable in practice
    pub capacity_safety_factor: f64,
    /// Lower bound of the healthy estimated utilization band, in percent
    pub healthy_utilization_min: f64,
    /// Upper bound of the healthy estimated utilization band, in percent
    pub healthy_utilization_max: f64,
    pub max_room_width: f64,
    pub max_room_depth: f64,
    pub max_room_height: f64,
    /// Maximum number of expanded units in one request
    pub max_units: usize,
    /// Above this many units the hybrid strategy only runs its preferred branch
    pub max_units_for_alternatives: usize,
    /// Absolute tolerance when grouping products by dimensions
    pub dimension_tolerance: f64,
    /// Relative tolerance when grouping products by aspect ratio
    pub aspect_ratio_tolerance: f64,
}

impl EngineConfig {
    pub const DEFAULT_CAPACITY_SAFETY_FACTOR: f64 = 0.8;
    pub const DEFAULT_HEALTHY_UTILIZATION_MIN: f64 = 30.0;
    pub const DEFAULT_HEALTHY_UTILIZATION_MAX: f64 = 90.0;
    pub const DEFAULT_MAX_ROOM_WIDTH: f64 = 10_000.0;
    pub const DEFAULT_MAX_ROOM_DEPTH: f64 = 10_000.0;
    pub const DEFAULT_MAX_ROOM_HEIGHT: f64 = 1_000.0;
    pub const DEFAULT_MAX_UNITS: usize = 500;
    pub const DEFAULT_MAX_UNITS_FOR_ALTERNATIVES: usize = 500;
    pub const DEFAULT_DIMENSION_TOLERANCE: f64 = 5.0;
    pub const DEFAULT_ASPECT_RATIO_TOLERANCE: f64 = 0.2;
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity_safety_factor: Self::DEFAULT_CAPACITY_SAFETY_FACTOR,
            healthy_utilization_min: Self::DEFAULT_HEALTHY_UTILIZATION_MIN,
            healthy_utilization_max: Self::DEFAULT_HEALTHY_UTILIZATION_MAX,
            max_room_width: Self::DEFAULT_MAX_ROOM_WIDTH,
            max_room_depth: Self::DEFAULT_MAX_ROOM_DEPTH,
            max_room_height: Self::DEFAULT_MAX_ROOM_HEIGHT,
            max_units: Self::DEFAULT_MAX_UNITS,
            max_units_for_alternatives: Self::DEFAULT_MAX_UNITS_FOR_ALTERNATIVES,
            dimension_tolerance: Self::DEFAULT_DIMENSION_TOLERANCE,
            aspect_ratio_tolerance: Self::DEFAULT_ASPECT_RATIO_TOLERANCE,
        }
    }
}
