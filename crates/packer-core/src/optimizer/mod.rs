use crate::collision::rectangles_overlap_2d;
use crate::geometry::Rectangle;
use crate::strategy::volume_utilization;
use crate::tolerance::approx_eq;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

mod compact;
mod gaps;
mod rearrange;

/// Toggles for the optimizer passes, which run in field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerOptions {
    #[serde(default = "enabled")]
    pub fill_gaps: bool,
    #[serde(default = "enabled")]
    pub rearrange: bool,
    #[serde(default = "enabled")]
    pub compact: bool,
}

fn enabled() -> bool {
    true
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            fill_gaps: true,
            rearrange: true,
            compact: true,
        }
    }
}

/// A floor column: every placement sharing one (x, y) base, moved as a unit.
///
/// Members are indices into the placement list being optimized.
#[derive(Debug, Clone)]
pub(super) struct Column {
    pub members: Vec<usize>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub depth: f64,
}

impl Column {
    pub fn footprint(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.width, self.depth, 0.0)
    }

    pub fn footprint_at(&self, x: f64, y: f64) -> Rectangle {
        Rectangle::new(x, y, self.width, self.depth, 0.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.depth
    }

    pub fn area(&self) -> f64 {
        self.width * self.depth
    }
}

/// Post-processing passes over an already packed layout.
///
/// Passes only move stacks on the floor plane. Heights, Z coordinates and
/// stack membership are left alone.
pub struct LayoutOptimizer {
    room: Room,
    options: OptimizerOptions,
}

impl LayoutOptimizer {
    pub fn new(room: Room) -> Self {
        Self::with_options(room, OptimizerOptions::default())
    }

    pub fn with_options(room: Room, options: OptimizerOptions) -> Self {
        Self { room, options }
    }

    /// Runs the enabled passes and returns the moved placements.
    pub fn optimize(&self, placements: &[Placement]) -> OptimizationReport {
        let utilization_before = volume_utilization(placements, &self.room);
        let mut columns = group_columns(placements);
        let mut improvements = Vec::new();

        if self.options.fill_gaps {
            let moved = self.fill_gaps(&mut columns);
            if moved > 0 {
                improvements.push(format!("Moved {} stacks into floor gaps", moved));
            }
        }

        if self.options.rearrange {
            match self.rearrange(&columns) {
                Some((rearranged, moved)) => {
                    columns = rearranged;
                    if moved > 0 {
                        improvements.push(format!(
                            "Rearranged {} stacks largest-first from the bottom-left corner",
                            moved
                        ));
                    }
                }
                None => debug!("Rearrange pass discarded: it would create overlaps"),
            }
        }

        if self.options.compact {
            let moved = self.compact(&mut columns);
            if moved > 0 {
                improvements.push(format!("Compacted {} stacks toward the origin", moved));
            }
        }

        let mut optimized = placements.to_vec();
        for column in &columns {
            for &idx in &column.members {
                let p = &mut optimized[idx];
                if !approx_eq(p.x, column.x) || !approx_eq(p.y, column.y) {
                    p.move_to(column.x, column.y);
                }
            }
        }

        let utilization_after = volume_utilization(&optimized, &self.room);
        debug!(
            "Optimizer applied {} improvements to {} placements",
            improvements.len(),
            optimized.len()
        );

        OptimizationReport {
            placements: optimized,
            improvements,
            utilization_before,
            utilization_after,
        }
    }

    /// True when a footprint stays inside the room floor.
    pub(super) fn fits_floor(&self, rect: &Rectangle) -> bool {
        rect.x >= 0.0
            && rect.y >= 0.0
            && rect.right() <= self.room.width
            && rect.top() <= self.room.depth
    }
}

/// Groups placements into columns by base position, in first-seen order.
pub(super) fn group_columns(placements: &[Placement]) -> Vec<Column> {
    let mut columns: Vec<Column> = Vec::new();
    for (idx, p) in placements.iter().enumerate() {
        match columns
            .iter_mut()
            .find(|c| approx_eq(c.x, p.x) && approx_eq(c.y, p.y))
        {
            Some(column) => {
                column.members.push(idx);
                column.width = column.width.max(p.width);
                column.depth = column.depth.max(p.depth);
            }
            None => columns.push(Column {
                members: vec![idx],
                x: p.x,
                y: p.y,
                width: p.width,
                depth: p.depth,
            }),
        }
    }
    columns
}

/// First column other than `skip` whose footprint overlaps `rect`.
pub(super) fn blocking<'a>(
    rect: &Rectangle,
    columns: &'a [Column],
    skip: Option<usize>,
) -> Option<&'a Column> {
    columns
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != skip)
        .map(|(_, c)| c)
        .find(|c| rectangles_overlap_2d(rect, &c.footprint()))
}

pub(super) fn has_overlaps(columns: &[Column]) -> bool {
    columns.iter().enumerate().any(|(i, a)| {
        columns[i + 1..]
            .iter()
            .any(|b| rectangles_overlap_2d(&a.footprint(), &b.footprint()))
    })
}

/// Bottom-left order: lower Y first, then lower X.
pub(super) fn bottom_left(a: (f64, f64), b: (f64, f64)) -> Ordering {
    a.1.partial_cmp(&b.1)
        .unwrap_or(Ordering::Equal)
        .then(a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal))
}
