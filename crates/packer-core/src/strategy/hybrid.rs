use super::grid::SmartGridCalculator;
use super::{
    expand_items, sort_by_area_desc, summarize_products, unit_count, volume_utilization,
    CompartmentStrategy, LaffStrategy, PackingStrategy,
};
use crate::config::EngineConfig;
use crate::grouping::ProductGrouper;
use crate::strategy::ProductSummary;
use crate::types::*;
use tracing::{debug, info, warn};

/// Product count above which a low-quantity mix prefers compartments.
const MANY_PRODUCTS: usize = 10;
/// Average units per product below which a many-product mix prefers compartments.
const LOW_AVERAGE_QUANTITY: f64 = 5.0;
/// Product count at or below which a high-quantity mix prefers plain LAFF.
const FEW_PRODUCTS: usize = 3;
/// Average units per product above which a few-product mix prefers plain LAFF.
const HIGH_AVERAGE_QUANTITY: f64 = 10.0;

/// Scores closer than this are treated as a tie.
const SCORE_EPSILON: f64 = 1e-9;

/// Meta-strategy choosing between LAFF, compartments and grouped grids.
///
/// The product mix decides which branch is preferred. The other branches
/// still run when the request is small enough, and the best scoring result
/// (`utilization + 0.1 * placed`) wins, with the preferred branch winning ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridStrategy {
    laff: LaffStrategy,
    compartment: CompartmentStrategy,
    config: EngineConfig,
}

impl HybridStrategy {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            laff: LaffStrategy::new(),
            compartment: CompartmentStrategy::new(),
            config,
        }
    }

    /// Branch suggested by the product mix alone.
    pub fn preferred_strategy(&self, items: &[Item]) -> StrategyKind {
        let products = summarize_products(items);
        if products.is_empty() {
            return StrategyKind::Laff;
        }
        let average = unit_count(items) as f64 / products.len() as f64;

        if products.len() > MANY_PRODUCTS && average < LOW_AVERAGE_QUANTITY {
            StrategyKind::Compartment
        } else if products.len() <= FEW_PRODUCTS && average > HIGH_AVERAGE_QUANTITY {
            StrategyKind::Laff
        } else {
            StrategyKind::Hybrid
        }
    }

    fn run(
        &self,
        kind: StrategyKind,
        items: &[Item],
        room: &Room,
        options: &PackOptions,
    ) -> Result<PackResult> {
        match kind {
            StrategyKind::Laff => self.laff.pack(items, room, options),
            StrategyKind::Compartment => self.compartment.pack(items, room, options),
            StrategyKind::Hybrid => self.pack_grouped(items, room, options),
        }
    }

    /// One grid cell per product group, LAFF inside each cell.
    pub fn pack_grouped(
        &self,
        items: &[Item],
        room: &Room,
        options: &PackOptions,
    ) -> Result<PackResult> {
        let products = summarize_products(items);
        let grouping = ProductGrouper::from_config(&self.config).group_for_optimal_fit(&products);
        if grouping.groups.is_empty() {
            return Err(PackerError::StrategyFailed(
                "Product grouping produced no groups".to_string(),
            ));
        }
        debug!(
            "Grouped {} products into {} groups by {:?}",
            products.len(),
            grouping.groups.len(),
            grouping.method
        );

        let group_summaries: Vec<ProductSummary> =
            grouping.groups.iter().map(|g| g.summary()).collect();
        let calculator = SmartGridCalculator::new(&group_summaries, room);
        let grid = match options.grid {
            Some(grid) => calculator.with_override(grid)?,
            None => calculator.calculate(),
        };

        let limit = options.column_height_limit(room);
        let all_units = expand_items(items);
        let mut placements = Vec::new();
        let mut unplaced_items = Vec::new();

        for (idx, group) in grouping.groups.iter().enumerate() {
            let mut units: Vec<_> = all_units
                .iter()
                .filter(|u| group.contains(&u.product_id))
                .cloned()
                .collect();
            sort_by_area_desc(&mut units);

            match grid.cell(idx as u32, limit) {
                Some(cell) => {
                    let (placed, unplaced) = self.laff.pack_region(
                        &units,
                        cell,
                        room,
                        options.allow_rotation,
                        options.prefer_bottom,
                    );
                    placements.extend(placed);
                    unplaced_items.extend(unplaced);
                }
                None => unplaced_items.extend(
                    units
                        .iter()
                        .map(|u| u.unplaced("No compartment available for product group")),
                ),
            }
        }

        let utilization = volume_utilization(&placements, room);
        Ok(PackResult {
            placements,
            unplaced_items,
            utilization,
            strategy_used: Some(StrategyKind::Hybrid),
            grid: Some(grid),
        })
    }
}

impl PackingStrategy for HybridStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Hybrid
    }

    fn pack(&self, items: &[Item], room: &Room, options: &PackOptions) -> Result<PackResult> {
        let preferred = self.preferred_strategy(items);
        info!("Product mix prefers {} strategy", preferred);

        let mut order = vec![preferred];
        if unit_count(items) <= self.config.max_units_for_alternatives {
            order.extend(
                [
                    StrategyKind::Laff,
                    StrategyKind::Compartment,
                    StrategyKind::Hybrid,
                ]
                .into_iter()
                .filter(|k| *k != preferred),
            );
        }

        let mut best: Option<PackResult> = None;
        for kind in order {
            match self.run(kind, items, room, options) {
                Ok(result) => {
                    debug!(
                        "{} strategy scored {:.3} ({} placed)",
                        kind,
                        result.score(),
                        result.placements.len()
                    );
                    let better = best
                        .as_ref()
                        .map_or(true, |b| result.score() > b.score() + SCORE_EPSILON);
                    if better {
                        best = Some(result);
                    }
                }
                Err(err) => warn!("{} strategy failed: {}", kind, err),
            }
        }

        Ok(best.unwrap_or_else(|| {
            warn!("Every strategy failed, falling back to compartment packing");
            self.compartment.pack_fallback(items, room, options)
        }))
    }
}
