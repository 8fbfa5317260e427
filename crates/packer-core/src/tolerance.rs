//! Floating point tolerances shared by the geometry and collision code.

/// Two points closer than this on every axis are the same point.
pub const POINT_EPSILON: f64 = 0.01;

/// Placements whose Z is below this value stand on the floor.
pub const FLOOR_EPSILON: f64 = 0.1;

/// Leakage allowed when checking that a footprint stays inside a compartment cell.
pub const BOUNDARY_MARGIN: f64 = 0.1;

/// Relative tolerance for grid cells against the room extent (1%).
pub const GRID_TOLERANCE: f64 = 0.01;

/// Returns true when `a` and `b` differ by less than [`POINT_EPSILON`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < POINT_EPSILON
}

/// Returns true when a Z coordinate is considered floor level.
pub fn is_floor_level(z: f64) -> bool {
    z < FLOOR_EPSILON
}
