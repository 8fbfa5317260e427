//! Overlap and room-boundary tests.
//!
//! Two collision modes exist and must not be mixed up. The 3D test is a plain
//! AABB intersection. The 2D test ignores Z and only looks at floor-level
//! placements, which is what lets units share a footprint when stacked.

use crate::geometry::{Box3D, Rectangle};
use crate::tolerance::BOUNDARY_MARGIN;
use crate::types::{Placement, Room};

/// True when `candidate` intersects any of the `placed` boxes.
pub fn has_collision(candidate: &Box3D, placed: &[Box3D]) -> bool {
    placed.iter().any(|b| candidate.intersects(b))
}

/// Strict floor-plane overlap between two footprints.
pub fn rectangles_overlap_2d(a: &Rectangle, b: &Rectangle) -> bool {
    a.intersects(b)
}

/// True when `candidate` overlaps the footprint of a floor-level placement.
///
/// Placements above the floor are skipped, as are placements belonging to
/// `own_stack` so a unit can be stacked onto its own column.
pub fn has_collision_2d(
    candidate: &Rectangle,
    placements: &[Placement],
    own_stack: Option<&str>,
) -> bool {
    placements.iter().any(|p| {
        p.is_floor_level()
            && own_stack != Some(p.stack_id.as_str())
            && rectangles_overlap_2d(candidate, &p.footprint())
    })
}

/// Boundary check with no rounding tolerance.
pub fn fits_in_room(b: &Box3D, room: &Room) -> bool {
    b.x >= 0.0
        && b.y >= 0.0
        && b.z >= 0.0
        && b.right() <= room.width
        && b.top() <= room.depth
        && b.top_z() <= room.height
}

/// Floor-only boundary check with no rounding tolerance.
pub fn fits_in_room_2d(rect: &Rectangle, room: &Room) -> bool {
    rect.x >= 0.0 && rect.y >= 0.0 && rect.right() <= room.width && rect.top() <= room.depth
}

/// Cell containment allowing [`BOUNDARY_MARGIN`] of edge leakage.
pub fn fits_in_cell(rect: &Rectangle, cell: &Rectangle) -> bool {
    rect.x >= cell.x - BOUNDARY_MARGIN
        && rect.y >= cell.y - BOUNDARY_MARGIN
        && rect.right() <= cell.right() + BOUNDARY_MARGIN
        && rect.top() <= cell.top() + BOUNDARY_MARGIN
}
