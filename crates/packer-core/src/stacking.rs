//! Vertical stacking bookkeeping.
//!
//! A stack is the column of placements sharing a product and a floor
//! position. Stack ids are for grouping and display; collision logic never
//! compares them across products.

use crate::tolerance::approx_eq;
use crate::types::{Placement, Room};
use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Deterministic identifier for the stack of `product_id` based at `(x, y)`.
///
/// Coordinates are rounded to hundredths so ids survive serialization.
pub fn stack_id(product_id: &str, x: f64, y: f64) -> String {
    let x = (x * 100.0).round() as i64;
    let y = (y * 100.0).round() as i64;

    let mut hasher = FxHasher::default();
    product_id.hash(&mut hasher);
    x.hash(&mut hasher);
    y.hash(&mut hasher);
    format!("stk-{:016x}", hasher.finish())
}

/// State of one stack as seen by an ad-hoc query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackInfo {
    pub stack_id: String,
    pub product_id: String,
    pub x: f64,
    pub y: f64,
    pub items_in_stack: u32,
    pub current_height: f64,
    /// Z at which the next unit would sit
    pub next_z: f64,
    /// Whole units of the queried height that still fit under the ceiling
    pub remaining_capacity: u32,
    /// One-based position the next unit would take
    pub next_position: u32,
}

/// Summarizes the stack of `product_id` at `(x, y)` for a unit `item_height` tall.
pub fn stack_info(
    room: &Room,
    placements: &[Placement],
    product_id: &str,
    x: f64,
    y: f64,
    item_height: f64,
) -> StackInfo {
    let members = placements
        .iter()
        .filter(|p| p.product_id == product_id && approx_eq(p.x, x) && approx_eq(p.y, y));

    let (count, current_height) = members.fold((0u32, 0.0f64), |(count, height), p| {
        (count + 1, height + p.height)
    });

    StackInfo {
        stack_id: stack_id(product_id, x, y),
        product_id: product_id.to_string(),
        x,
        y,
        items_in_stack: count,
        current_height,
        next_z: current_height,
        remaining_capacity: remaining_units(room.height, current_height, item_height),
        next_position: count + 1,
    }
}

fn remaining_units(limit: f64, current_height: f64, item_height: f64) -> u32 {
    if item_height <= 0.0 || current_height >= limit {
        return 0;
    }
    ((limit - current_height) / item_height).floor() as u32
}

/// Suggested destination for more units of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSuggestion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub units: u32,
    pub stack_id: String,
}

/// Finds existing stacks of `product_id` that can absorb `count` more units.
///
/// Stacks with the most headroom are used first. The returned suggestions may
/// cover fewer than `count` units when the existing stacks are nearly full.
pub fn suggest_positions(
    room: &Room,
    placements: &[Placement],
    product_id: &str,
    item_height: f64,
    count: u32,
) -> Vec<StackSuggestion> {
    let mut bases: Vec<(f64, f64)> = Vec::new();
    for p in placements
        .iter()
        .filter(|p| p.product_id == product_id && p.is_floor_level())
    {
        if !bases
            .iter()
            .any(|(x, y)| approx_eq(*x, p.x) && approx_eq(*y, p.y))
        {
            bases.push((p.x, p.y));
        }
    }

    let mut stacks: Vec<StackInfo> = bases
        .into_iter()
        .map(|(x, y)| stack_info(room, placements, product_id, x, y, item_height))
        .filter(|info| info.remaining_capacity > 0)
        .collect();
    stacks.sort_by(|a, b| b.remaining_capacity.cmp(&a.remaining_capacity));

    let mut suggestions = Vec::new();
    let mut left = count;
    for info in stacks {
        if left == 0 {
            break;
        }
        let units = info.remaining_capacity.min(left);
        left -= units;
        suggestions.push(StackSuggestion {
            x: info.x,
            y: info.y,
            z: info.next_z,
            units,
            stack_id: info.stack_id,
        });
    }

    suggestions
}

#[derive(Debug, Clone, Copy, Default)]
struct StackState {
    height: f64,
    count: u32,
}

/// Running stack heights keyed by stack id, updated as units are committed.
#[derive(Debug, Clone, Default)]
pub struct StackTracker {
    stacks: FxHashMap<String, StackState>,
}

impl StackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn height(&self, id: &str) -> f64 {
        self.stacks.get(id).map_or(0.0, |s| s.height)
    }

    pub fn count(&self, id: &str) -> u32 {
        self.stacks.get(id).map_or(0, |s| s.count)
    }

    /// Whether a unit `item_height` tall still fits under `limit`.
    pub fn can_stack(&self, id: &str, item_height: f64, limit: f64) -> bool {
        self.height(id) + item_height <= limit
    }

    /// Records a new top unit and returns `(z, items_below)` for it.
    pub fn push(&mut self, id: &str, item_height: f64) -> (f64, u32) {
        let state = self.stacks.entry(id.to_string()).or_default();
        let slot = (state.height, state.count);
        state.height += item_height;
        state.count += 1;
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::Rotation;
    use approx::assert_relative_eq;

    fn column(product: &str, x: f64, y: f64, heights: &[f64]) -> Vec<Placement> {
        let mut z = 0.0;
        heights
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let p =
                    Placement::stacked(product, x, y, z, 20.0, 20.0, *h, Rotation::Deg0, i as u32);
                z += h;
                p
            })
            .collect()
    }

    #[test]
    fn test_stack_id_is_deterministic() {
        assert_eq!(stack_id("A", 10.0, 20.0), stack_id("A", 10.0, 20.0));
        assert_eq!(stack_id("A", 10.0, 20.0), stack_id("A", 10.001, 20.0));
        assert_ne!(stack_id("A", 10.0, 20.0), stack_id("B", 10.0, 20.0));
        assert_ne!(stack_id("A", 10.0, 20.0), stack_id("A", 20.0, 10.0));
    }

    #[test]
    fn test_stack_id_format() {
        let id = stack_id("crate", 12.5, 0.0);
        assert_eq!(id.len(), 4 + 16);
        assert!(id.starts_with("stk-"));
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tracker_keeps_stacks_apart() {
        let mut tracker = StackTracker::new();
        let a = stack_id("A", 0.0, 0.0);
        let b = stack_id("A", 50.0, 0.0);

        assert_eq!(tracker.push(&a, 30.0), (0.0, 0));
        assert_eq!(tracker.push(&a, 20.0), (30.0, 1));
        assert_eq!(tracker.push(&b, 10.0), (0.0, 0));
        assert_eq!(tracker.count(&a), 2);
        assert!(!tracker.can_stack(&a, 60.0, 100.0));
        assert!(tracker.can_stack(&b, 90.0, 100.0));
    }

    #[test]
    fn test_stack_info_sums_heights() {
        let room = Room::new(100.0, 100.0, 100.0);
        let mut placements = column("A", 0.0, 0.0, &[30.0, 25.0]);
        placements.extend(column("B", 0.0, 0.0, &[40.0]));

        let info = stack_info(&room, &placements, "A", 0.0, 0.0, 20.0);
        assert_eq!(info.items_in_stack, 2);
        assert_relative_eq!(info.current_height, 55.0);
        assert_relative_eq!(info.next_z, 55.0);
        assert_eq!(info.remaining_capacity, 2);
        assert_eq!(info.next_position, 3);
    }

    #[test]
    fn test_empty_stack_info() {
        let room = Room::new(100.0, 100.0, 90.0);
        let info = stack_info(&room, &[], "A", 5.0, 5.0, 30.0);
        assert_eq!(info.items_in_stack, 0);
        assert_eq!(info.next_position, 1);
        assert_eq!(info.remaining_capacity, 3);
    }

    #[test]
    fn test_suggestions_prefer_headroom() {
        let room = Room::new(100.0, 100.0, 100.0);
        let mut placements = column("A", 0.0, 0.0, &[20.0, 20.0, 20.0]);
        placements.extend(column("A", 50.0, 0.0, &[20.0]));

        let suggestions = suggest_positions(&room, &placements, "A", 20.0, 5);
        assert_eq!(suggestions.len(), 2);
        assert_relative_eq!(suggestions[0].x, 50.0);
        assert_eq!(suggestions[0].units, 4);
        assert_relative_eq!(suggestions[0].z, 20.0);
        assert_eq!(suggestions[1].units, 1);
    }

    #[test]
    fn test_tracker_push_returns_slot() {
        let mut tracker = StackTracker::new();
        assert!(tracker.can_stack("s", 30.0, 50.0));
        assert_eq!(tracker.push("s", 30.0), (0.0, 0));
        assert!(!tracker.can_stack("s", 30.0, 50.0));
        assert_eq!(tracker.push("s", 20.0), (30.0, 1));
        assert_eq!(tracker.count("s"), 2);
        assert_relative_eq!(tracker.height("s"), 50.0);
    }
}
