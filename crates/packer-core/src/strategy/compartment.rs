use super::grid::SmartGridCalculator;
use super::{expand_items, summarize_products, volume_utilization, ExpandedItem, PackingStrategy};
use crate::collision::{fits_in_cell, fits_in_room_2d, has_collision_2d};
use crate::geometry::Rectangle;
use crate::rotation::Rotation;
use crate::stacking::{stack_id, StackTracker};
use crate::tolerance::BOUNDARY_MARGIN;
use crate::types::*;
use tracing::debug;

/// Sub-cells are never narrower than this share of their compartment.
const MIN_SUBCELL_FRACTION: f64 = 0.1;

/// Grid packing with one compartment per product.
///
/// Inside a compartment units sit on a sub-grid sized to the product's
/// footprint. Each sub-cell is filled upwards until the column height limit
/// before the next sub-cell is used. Units are never rotated.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompartmentStrategy;

/// Mutable state shared by every compartment of one packing run.
struct FillState {
    placements: Vec<Placement>,
    unplaced: Vec<UnplacedItem>,
    stacks: StackTracker,
}

impl CompartmentStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Packs with a given grid. Products beyond the grid's cell count are unplaced.
    pub fn pack_with_grid(
        &self,
        items: &[Item],
        room: &Room,
        options: &PackOptions,
        grid: GridLayout,
    ) -> PackResult {
        let products = summarize_products(items);
        let units = expand_items(items);
        let limit = options.column_height_limit(room);

        let mut state = FillState {
            placements: Vec::new(),
            unplaced: Vec::new(),
            stacks: StackTracker::new(),
        };

        for (idx, product) in products.iter().enumerate() {
            let product_units: Vec<&ExpandedItem> = units
                .iter()
                .filter(|u| u.product_id == product.product_id)
                .collect();

            match grid.cell(idx as u32, limit) {
                Some(cell) => self.fill_compartment(&product_units, cell, room, limit, &mut state),
                None => state.unplaced.extend(
                    product_units
                        .iter()
                        .map(|u| u.unplaced("No compartment available for product")),
                ),
            }
        }

        let utilization = volume_utilization(&state.placements, room);
        debug!(
            "Compartment {}x{} placed {} of {} units ({:.2}% utilization)",
            grid.columns,
            grid.rows,
            state.placements.len(),
            units.len(),
            utilization
        );

        PackResult {
            placements: state.placements,
            unplaced_items: state.unplaced,
            utilization,
            strategy_used: Some(StrategyKind::Compartment),
            grid: Some(grid),
        }
    }

    /// Packs over the simple square-ish grid. Never fails.
    pub fn pack_fallback(&self, items: &[Item], room: &Room, options: &PackOptions) -> PackResult {
        let products = summarize_products(items);
        let grid = SmartGridCalculator::new(&products, room).simple_grid();
        self.pack_with_grid(items, room, options, grid)
    }

    fn fill_compartment(
        &self,
        units: &[&ExpandedItem],
        cell: Rectangle,
        room: &Room,
        limit: f64,
        state: &mut FillState,
    ) {
        let footprint_width = units.iter().map(|u| u.width).fold(0.0, f64::max);
        let footprint_depth = units.iter().map(|u| u.depth).fold(0.0, f64::max);
        if footprint_width <= 0.0 || footprint_depth <= 0.0 {
            return;
        }

        let sub_width = footprint_width.max(cell.width * MIN_SUBCELL_FRACTION);
        let sub_depth = footprint_depth.max(cell.depth * MIN_SUBCELL_FRACTION);
        let sub_columns = (((cell.width + BOUNDARY_MARGIN) / sub_width).floor() as u32).max(1);
        let sub_rows = (((cell.depth + BOUNDARY_MARGIN) / sub_depth).floor() as u32).max(1);

        for unit in units {
            if unit.width > cell.width + BOUNDARY_MARGIN || unit.depth > cell.depth + BOUNDARY_MARGIN
            {
                state.unplaced.push(unit.unplaced(format!(
                    "Item footprint {}x{} exceeds compartment {:.1}x{:.1}",
                    unit.width, unit.depth, cell.width, cell.depth
                )));
                continue;
            }
            if unit.height > limit {
                state.unplaced.push(unit.unplaced(format!(
                    "Item height {} exceeds maximum column height {}",
                    unit.height, limit
                )));
                continue;
            }

            let slot = (0..sub_rows)
                .flat_map(|row| (0..sub_columns).map(move |column| (column, row)))
                .find_map(|(column, row)| {
                    let x = (cell.x + column as f64 * sub_width).min(room.width - unit.width);
                    let y = (cell.y + row as f64 * sub_depth).min(room.depth - unit.depth);
                    let rect = Rectangle::new(x, y, unit.width, unit.depth, unit.height);
                    if !fits_in_cell(&rect, &cell) || !fits_in_room_2d(&rect, room) {
                        return None;
                    }

                    let id = stack_id(&unit.product_id, x, y);
                    if has_collision_2d(&rect, &state.placements, Some(&id))
                        || !state.stacks.can_stack(&id, unit.height, limit)
                    {
                        return None;
                    }
                    Some((x, y, id))
                });

            match slot {
                Some((x, y, id)) => {
                    let (z, below) = state.stacks.push(&id, unit.height);
                    state.placements.push(Placement::stacked(
                        unit.product_id.clone(),
                        x,
                        y,
                        z,
                        unit.width,
                        unit.depth,
                        unit.height,
                        Rotation::Deg0,
                        below,
                    ));
                }
                None => state
                    .unplaced
                    .push(unit.unplaced("No space left in compartment")),
            }
        }
    }
}

impl PackingStrategy for CompartmentStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Compartment
    }

    fn pack(&self, items: &[Item], room: &Room, options: &PackOptions) -> Result<PackResult> {
        let products = summarize_products(items);
        if products.is_empty() {
            return Ok(PackResult {
                strategy_used: Some(StrategyKind::Compartment),
                ..PackResult::default()
            });
        }

        let calculator = SmartGridCalculator::new(&products, room);
        let grid = match options.grid {
            Some(grid) => calculator.with_override(grid)?,
            None => calculator.calculate(),
        };

        Ok(self.pack_with_grid(items, room, options, grid))
    }
}
