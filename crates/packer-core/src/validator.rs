//! Layout validation and pre-generation feasibility checks.
//!
//! Validation re-checks a finished placement list without knowing how it was
//! produced. Feasibility runs before packing and only ever warns about
//! quantities; hard errors are limited to unusable rooms and items.

use crate::collision::rectangles_overlap_2d;
use crate::config::EngineConfig;
use crate::rotation::all_rotations;
use crate::strategy::volume_utilization;
use crate::tolerance::approx_eq;
use crate::types::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutValidator {
    config: EngineConfig,
}

impl LayoutValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Checks bounds, floor overlaps and stack consistency of a layout.
    pub fn validate_layout(&self, placements: &[Placement], room: &Room) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for (i, p) in placements.iter().enumerate() {
            errors.extend(bounds_errors(i, p, room));
        }

        let floor: Vec<(usize, &Placement)> = placements
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_floor_level())
            .collect();

        for (a, (i, p)) in floor.iter().enumerate() {
            for (j, q) in &floor[a + 1..] {
                if rectangles_overlap_2d(&p.footprint(), &q.footprint()) {
                    errors.push(format!(
                        "Placements {} ({}) and {} ({}) overlap on the floor",
                        i, p.product_id, j, q.product_id
                    ));
                }
            }
        }

        for (i, p) in placements.iter().enumerate() {
            if p.is_floor_level() {
                continue;
            }
            let has_base = floor
                .iter()
                .any(|(_, base)| approx_eq(base.x, p.x) && approx_eq(base.y, p.y));
            if !has_base {
                errors.push(format!(
                    "Placement {} ({}) at ({}, {}, {}) is stacked with no base",
                    i, p.product_id, p.x, p.y, p.z
                ));
            }
        }

        for (i, p) in placements.iter().enumerate() {
            for (offset, q) in placements[i + 1..].iter().enumerate() {
                let j = i + 1 + offset;
                let same_column = approx_eq(p.x, q.x) && approx_eq(p.y, q.y);
                if same_column && p.z < q.top_z() && q.z < p.top_z() {
                    errors.push(format!(
                        "Placements {} ({}) and {} ({}) overlap vertically",
                        i, p.product_id, j, q.product_id
                    ));
                }
            }
        }

        let volume_utilization = volume_utilization(placements, room);
        let floor_utilization = floor_utilization(placements, room);

        if placements.is_empty() {
            warnings.push("Layout contains no placements".to_string());
        } else if volume_utilization < self.config.healthy_utilization_min {
            warnings.push(format!(
                "Low volume utilization: {:.1}%",
                volume_utilization
            ));
        }

        ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
            volume_utilization,
            floor_utilization,
        }
    }

    /// Room dimension sanity errors; empty when the room is usable.
    pub fn validate_room(&self, room: &Room) -> Vec<String> {
        let mut errors = Vec::new();
        if room.width <= 0.0 || room.depth <= 0.0 || room.height <= 0.0 {
            errors.push(format!(
                "Room dimensions must be positive, got {}x{}x{}",
                room.width, room.depth, room.height
            ));
        }
        if room.width > self.config.max_room_width {
            errors.push(format!(
                "Room width {} exceeds the limit of {}",
                room.width, self.config.max_room_width
            ));
        }
        if room.depth > self.config.max_room_depth {
            errors.push(format!(
                "Room depth {} exceeds the limit of {}",
                room.depth, self.config.max_room_depth
            ));
        }
        if room.height > self.config.max_room_height {
            errors.push(format!(
                "Room height {} exceeds the limit of {}",
                room.height, self.config.max_room_height
            ));
        }
        errors
    }

    /// Estimated capacity of the room for one item, after the safety factor.
    pub fn max_quantity(&self, item: &Item, room: &Room) -> u32 {
        all_rotations(item.width, item.depth, item.height, item.rotatable)
            .iter()
            .map(|o| {
                let raw = (room.width / o.width).floor()
                    * (room.depth / o.depth).floor()
                    * (room.height / o.height).floor();
                (raw * self.config.capacity_safety_factor).floor() as u32
            })
            .max()
            .unwrap_or(0)
    }

    /// Pre-generation check of a room and its requested items.
    pub fn check_feasibility(&self, room: &Room, items: &[Item]) -> FeasibilityReport {
        let mut errors = self.validate_room(room);
        let mut warnings = Vec::new();
        let mut report_items = Vec::new();

        if !errors.is_empty() {
            return FeasibilityReport {
                valid: false,
                errors,
                ..FeasibilityReport::default()
            };
        }

        let mut estimated_volume = 0.0;
        for item in items {
            if item.width <= 0.0 || item.depth <= 0.0 || item.height <= 0.0 {
                errors.push(format!(
                    "Product '{}' has non-positive dimensions",
                    item.product_id
                ));
                continue;
            }

            let max_quantity = self.max_quantity(item, room);
            let fits = all_rotations(item.width, item.depth, item.height, item.rotatable)
                .iter()
                .any(|o| o.width <= room.width && o.depth <= room.depth && o.height <= room.height);

            if !fits {
                warnings.push(format!(
                    "Product '{}' ({}x{}x{}) does not fit in the room in any orientation",
                    item.product_id, item.width, item.depth, item.height
                ));
            } else if item.quantity > max_quantity {
                warnings.push(format!(
                    "Product '{}': requested {} units but the room holds about {}",
                    item.product_id, item.quantity, max_quantity
                ));
            }

            estimated_volume += item.quantity.min(max_quantity) as f64 * item.unit_volume();
            report_items.push(ItemFeasibility {
                product_id: item.product_id.clone(),
                fits,
                requested: item.quantity,
                max_quantity,
            });
        }

        let estimated_utilization = estimated_volume / room.volume() * 100.0;
        if !report_items.is_empty() {
            if estimated_utilization < self.config.healthy_utilization_min {
                warnings.push(format!(
                    "Estimated utilization {:.1}% is below {:.0}%",
                    estimated_utilization, self.config.healthy_utilization_min
                ));
            } else if estimated_utilization > self.config.healthy_utilization_max {
                warnings.push(format!(
                    "Estimated utilization {:.1}% is above {:.0}%",
                    estimated_utilization, self.config.healthy_utilization_max
                ));
            }
        }

        FeasibilityReport {
            valid: errors.is_empty(),
            errors,
            warnings,
            items: report_items,
            estimated_utilization,
        }
    }

    /// Warnings for items requesting more units than the warehouse holds.
    pub fn check_stock(&self, items: &[Item], stock: &HashMap<String, u32>) -> Vec<String> {
        let mut requested: Vec<(&str, u32)> = Vec::new();
        for item in items {
            match requested.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, qty)) => *qty = qty.saturating_add(item.quantity),
                None => requested.push((&item.product_id, item.quantity)),
            }
        }

        requested
            .into_iter()
            .filter_map(|(id, qty)| {
                let available = stock.get(id).copied().unwrap_or(0);
                (qty > available).then(|| {
                    format!(
                        "Product '{}': requested {} units but only {} in stock",
                        id, qty, available
                    )
                })
            })
            .collect()
    }
}

fn bounds_errors(index: usize, p: &Placement, room: &Room) -> Vec<String> {
    let mut errors = Vec::new();
    if p.x < 0.0 || p.y < 0.0 || p.z < 0.0 {
        errors.push(format!(
            "Placement {} ({}) has negative coordinates",
            index, p.product_id
        ));
    }
    if p.right() > room.width {
        errors.push(format!(
            "Placement {} ({}) exceeds room width",
            index, p.product_id
        ));
    }
    if p.top() > room.depth {
        errors.push(format!(
            "Placement {} ({}) exceeds room depth",
            index, p.product_id
        ));
    }
    if p.top_z() > room.height {
        errors.push(format!(
            "Placement {} ({}) exceeds room height",
            index, p.product_id
        ));
    }
    errors
}

/// Floor area covered by distinct footprints, as a percentage of the floor.
pub fn floor_utilization(placements: &[Placement], room: &Room) -> f64 {
    let floor_area = room.floor_area();
    if floor_area <= 0.0 {
        return 0.0;
    }

    let mut seen: Vec<(f64, f64)> = Vec::new();
    let mut covered = 0.0;
    for p in placements {
        if seen
            .iter()
            .any(|(x, y)| approx_eq(*x, p.x) && approx_eq(*y, p.y))
        {
            continue;
        }
        seen.push((p.x, p.y));
        covered += p.base_area();
    }
    covered / floor_area * 100.0
}
