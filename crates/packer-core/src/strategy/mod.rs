//! Packing strategies.
//!
//! Every strategy takes the same request shape and returns a [`PackResult`].
//! Infeasible units end up in `unplaced_items`; `Err` is reserved for a
//! strategy that could not run at all, which callers answer with a fallback.

use crate::types::*;
use std::cmp::Ordering;

mod compartment;
mod grid;
mod hybrid;
mod laff;

pub use compartment::CompartmentStrategy;
pub use grid::{SizeClass, SizeProfile, SmartGridCalculator};
pub use hybrid::HybridStrategy;
pub use laff::LaffStrategy;

/// Common contract for packing algorithms.
pub trait PackingStrategy {
    fn kind(&self) -> StrategyKind;

    fn pack(&self, items: &[Item], room: &Room, options: &PackOptions) -> Result<PackResult>;
}

/// One unit of an [`Item`] after quantity expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedItem {
    pub product_id: String,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub rotatable: bool,
    /// Zero-based ordinal among the units of the source item
    pub instance: u32,
}

impl ExpandedItem {
    pub fn base_area(&self) -> f64 {
        self.width * self.depth
    }

    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    pub fn unplaced(&self, reason: impl Into<String>) -> UnplacedItem {
        UnplacedItem {
            product_id: self.product_id.clone(),
            width: self.width,
            depth: self.depth,
            height: self.height,
            reason: reason.into(),
        }
    }
}

/// Duplicates items according to their requested quantity, keeping input order.
pub fn expand_items(items: &[Item]) -> Vec<ExpandedItem> {
    let mut expanded = Vec::new();
    for item in items {
        for instance in 0..item.quantity {
            expanded.push(ExpandedItem {
                product_id: item.product_id.clone(),
                width: item.width,
                depth: item.depth,
                height: item.height,
                rotatable: item.rotatable,
                instance,
            });
        }
    }
    expanded
}

/// Total units a request expands into.
pub fn unit_count(items: &[Item]) -> usize {
    items.iter().map(|i| i.quantity as usize).sum()
}

/// Placed volume as a percentage of the room volume.
pub fn volume_utilization(placements: &[Placement], room: &Room) -> f64 {
    let room_volume = room.volume();
    if room_volume <= 0.0 {
        return 0.0;
    }
    let used: f64 = placements.iter().map(Placement::volume).sum();
    used / room_volume * 100.0
}

/// Per-product totals used by the grid and grouping heuristics.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub product_id: String,
    /// Largest extents over every entry of the product
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub quantity: u32,
}

impl ProductSummary {
    pub fn base_area(&self) -> f64 {
        self.width * self.depth
    }

    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    /// Long side over short side of the footprint, always >= 1.
    pub fn aspect_ratio(&self) -> f64 {
        let long = self.width.max(self.depth);
        let short = self.width.min(self.depth);
        if short <= 0.0 {
            1.0
        } else {
            long / short
        }
    }
}

/// Collapses items into distinct products in first-appearance order.
pub fn summarize_products(items: &[Item]) -> Vec<ProductSummary> {
    let mut products: Vec<ProductSummary> = Vec::new();
    for item in items {
        match products
            .iter_mut()
            .find(|p| p.product_id == item.product_id)
        {
            Some(existing) => {
                existing.width = existing.width.max(item.width);
                existing.depth = existing.depth.max(item.depth);
                existing.height = existing.height.max(item.height);
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => products.push(ProductSummary {
                product_id: item.product_id.clone(),
                width: item.width,
                depth: item.depth,
                height: item.height,
                quantity: item.quantity,
            }),
        }
    }
    products
}

/// Orders units largest footprint first, taller first on ties.
pub(crate) fn sort_by_area_desc(units: &mut [ExpandedItem]) {
    units.sort_by(|a, b| {
        b.base_area()
            .partial_cmp(&a.base_area())
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.height.partial_cmp(&a.height).unwrap_or(Ordering::Equal))
    });
}
