//! Compartment grid sizing.
//!
//! Three competing heuristics propose a grid for the product mix; each
//! proposal is scored by fit rate, waste and cell utilization, and the best
//! one is kept. When every heuristic fails a plain square-ish grid is used.

use super::ProductSummary;
use crate::tolerance::{BOUNDARY_MARGIN, GRID_TOLERANCE};
use crate::types::*;
use std::cmp::Ordering;
use tracing::debug;

/// Upper bound on columns and rows tried by the density search.
const DENSITY_SEARCH_LIMIT: u32 = 20;

/// Cells must exceed the largest footprint by this fraction.
const CELL_MARGIN: f64 = 0.05;

const FIT_RATE_WEIGHT: f64 = 0.5;
const CELL_UTILIZATION_WEIGHT: f64 = 0.3;
const WASTE_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

/// Products split into volume tertiles (base area breaks ties).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeProfile {
    pub small: Vec<usize>,
    pub medium: Vec<usize>,
    pub large: Vec<usize>,
}

impl SizeProfile {
    pub fn classify(products: &[ProductSummary]) -> Self {
        let mut order: Vec<usize> = (0..products.len()).collect();
        order.sort_by(|&a, &b| {
            let (pa, pb) = (&products[a], &products[b]);
            pa.volume()
                .partial_cmp(&pb.volume())
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    pa.base_area()
                        .partial_cmp(&pb.base_area())
                        .unwrap_or(Ordering::Equal)
                })
        });

        let n = order.len();
        let mut profile = SizeProfile::default();
        for (rank, idx) in order.into_iter().enumerate() {
            // Rank n-1 always lands in the large tertile.
            match ((rank + 1) * 3).div_ceil(n.max(1)) {
                0 | 1 => profile.small.push(idx),
                2 => profile.medium.push(idx),
                _ => profile.large.push(idx),
            }
        }
        profile
    }

    pub fn class_of(&self, idx: usize) -> Option<SizeClass> {
        if self.small.contains(&idx) {
            Some(SizeClass::Small)
        } else if self.medium.contains(&idx) {
            Some(SizeClass::Medium)
        } else if self.large.contains(&idx) {
            Some(SizeClass::Large)
        } else {
            None
        }
    }
}

/// Breakdown of how well a grid suits a product mix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridScore {
    /// Share of products that get a cell their footprint fits in
    pub fit_rate: f64,
    /// Share of cells left without a product
    pub waste: f64,
    /// How closely cell area matches the floor area each product needs
    pub cell_utilization: f64,
    pub total: f64,
}

pub struct SmartGridCalculator<'a> {
    products: &'a [ProductSummary],
    room: &'a Room,
}

impl<'a> SmartGridCalculator<'a> {
    pub fn new(products: &'a [ProductSummary], room: &'a Room) -> Self {
        Self { products, room }
    }

    fn cells_needed(&self) -> u32 {
        self.products.len().max(1) as u32
    }

    /// Honors an explicit grid, deriving a missing side from the product count.
    pub fn with_override(&self, grid: GridOverride) -> Result<GridLayout> {
        let n = self.cells_needed();
        let (columns, rows) = match (grid.columns, grid.rows) {
            (Some(c), Some(r)) => (c, r),
            (Some(c), None) if c > 0 => (c, n.div_ceil(c)),
            (None, Some(r)) if r > 0 => (n.div_ceil(r), r),
            (None, None) => return Ok(self.calculate()),
            _ => (0, 0),
        };

        if columns == 0 || rows == 0 {
            return Err(PackerError::StrategyFailed(
                "Grid override needs at least one column and one row".to_string(),
            ));
        }

        let grid = GridLayout::for_room(columns, rows, self.room);
        let any_fits = self.products.iter().any(|p| {
            p.width <= grid.cell_width + BOUNDARY_MARGIN
                && p.depth <= grid.cell_depth + BOUNDARY_MARGIN
        });
        if !self.products.is_empty() && !any_fits {
            return Err(PackerError::StrategyFailed(format!(
                "Grid override {}x{} leaves {:.2}x{:.2} cells, too small for every product",
                columns, rows, grid.cell_width, grid.cell_depth
            )));
        }

        Ok(grid)
    }

    /// Best scoring grid among the heuristics, size-validated.
    pub fn calculate(&self) -> GridLayout {
        let proposals = [
            ("size_based", self.size_based()),
            ("aspect_ratio", self.aspect_ratio_matched()),
            ("density", self.density_optimized()),
        ];

        let mut best: Option<(GridLayout, GridScore)> = None;
        for (name, proposal) in proposals {
            match proposal {
                Ok(grid) => {
                    let score = self.score(&grid);
                    debug!(
                        "Grid heuristic {} proposed {}x{} (score {:.3})",
                        name, grid.columns, grid.rows, score.total
                    );
                    if score.fit_rate <= 0.0 {
                        continue;
                    }
                    if best.as_ref().map_or(true, |(_, s)| score.total > s.total) {
                        best = Some((grid, score));
                    }
                }
                Err(err) => debug!("Grid heuristic {} failed: {}", name, err),
            }
        }

        let grid = match best {
            Some((grid, _)) => grid,
            None => {
                debug!("No grid heuristic produced a usable grid, using simple grid");
                self.simple_grid()
            }
        };

        self.validate_cell_size(grid)
    }

    /// `ceil(sqrt(n * aspect))` columns, rows to cover the remainder.
    pub fn simple_grid(&self) -> GridLayout {
        let n = self.cells_needed();
        let aspect = self.room.width / self.room.depth;
        let columns = ((n as f64 * aspect).sqrt().ceil() as u32).clamp(1, n);
        let rows = n.div_ceil(columns);
        GridLayout::for_room(columns, rows, self.room)
    }

    /// Grid shaped like the room, with cells large enough for the largest items.
    pub fn size_based(&self) -> Result<GridLayout> {
        if self.products.is_empty() {
            return Err(PackerError::StrategyFailed("No products to grid".to_string()));
        }

        let profile = SizeProfile::classify(self.products);
        let reference: Vec<&ProductSummary> = if profile.large.is_empty() {
            self.products.iter().collect()
        } else {
            profile.large.iter().map(|&i| &self.products[i]).collect()
        };
        let max_width = reference.iter().map(|p| p.width).fold(0.0, f64::max);
        let max_depth = reference.iter().map(|p| p.depth).fold(0.0, f64::max);

        let max_columns = (self.room.width / max_width).floor() as u32;
        if max_columns == 0 {
            return Err(PackerError::StrategyFailed(
                "Largest item is wider than the room".to_string(),
            ));
        }

        let n = self.cells_needed();
        let aspect = self.room.width / self.room.depth;
        let columns = ((n as f64 * aspect).sqrt().ceil() as u32)
            .clamp(1, n)
            .min(max_columns);
        let rows = n.div_ceil(columns);

        if rows as f64 * max_depth > self.room.depth * (1.0 + GRID_TOLERANCE) {
            return Err(PackerError::StrategyFailed(format!(
                "{} rows of depth {} exceed the room depth",
                rows, max_depth
            )));
        }

        Ok(GridLayout::for_room(columns, rows, self.room))
    }

    /// Grid whose cell aspect ratio is closest to the average item aspect ratio.
    pub fn aspect_ratio_matched(&self) -> Result<GridLayout> {
        if self.products.is_empty() {
            return Err(PackerError::StrategyFailed("No products to grid".to_string()));
        }

        let target = self
            .products
            .iter()
            .map(|p| p.width / p.depth)
            .sum::<f64>()
            / self.products.len() as f64;

        let n = self.cells_needed();
        (1..=n)
            .map(|columns| GridLayout::for_room(columns, n.div_ceil(columns), self.room))
            .min_by(|a, b| {
                let da = (a.cell_width / a.cell_depth).ln() - target.ln();
                let db = (b.cell_width / b.cell_depth).ln() - target.ln();
                da.abs().partial_cmp(&db.abs()).unwrap_or(Ordering::Equal)
            })
            .ok_or_else(|| PackerError::StrategyFailed("No aspect candidates".to_string()))
    }

    /// Brute-force search over grids up to 20x20 maximizing item/cell density.
    pub fn density_optimized(&self) -> Result<GridLayout> {
        let n = self.cells_needed();
        if self.products.is_empty() || n > DENSITY_SEARCH_LIMIT * DENSITY_SEARCH_LIMIT {
            return Err(PackerError::StrategyFailed(
                "Product count outside the density search range".to_string(),
            ));
        }

        let mut best: Option<(GridLayout, f64)> = None;
        for columns in 1..=DENSITY_SEARCH_LIMIT {
            for rows in 1..=DENSITY_SEARCH_LIMIT {
                if columns * rows < n {
                    continue;
                }
                let grid = GridLayout::for_room(columns, rows, self.room);
                let (fit_rate, density) = self.fit_and_density(&grid);
                let score = fit_rate * density;
                if score > 0.0 && best.as_ref().map_or(true, |(_, s)| score > *s) {
                    best = Some((grid, score));
                }
            }
        }

        best.map(|(grid, _)| grid).ok_or_else(|| {
            PackerError::StrategyFailed("No grid up to 20x20 fits any product".to_string())
        })
    }

    /// Scores a grid for the current product mix.
    pub fn score(&self, grid: &GridLayout) -> GridScore {
        let cells = grid.cell_count().max(1) as f64;
        let n = self.cells_needed() as f64;

        let (fit_rate, cell_utilization) = self.fit_and_density(grid);
        let waste = ((cells - n) / cells).max(0.0);
        let total = FIT_RATE_WEIGHT * fit_rate
            + CELL_UTILIZATION_WEIGHT * cell_utilization
            + WASTE_WEIGHT * (1.0 - waste);

        GridScore {
            fit_rate,
            waste,
            cell_utilization,
            total,
        }
    }

    /// Fit rate over all products and mean density over the fitting ones.
    fn fit_and_density(&self, grid: &GridLayout) -> (f64, f64) {
        if self.products.is_empty() {
            return (0.0, 0.0);
        }

        let cell_area = grid.cell_width * grid.cell_depth;
        let assigned = self.products.iter().take(grid.cell_count() as usize);

        let mut fitting = 0usize;
        let mut density_sum = 0.0;
        for product in assigned {
            if product.width > grid.cell_width + BOUNDARY_MARGIN
                || product.depth > grid.cell_depth + BOUNDARY_MARGIN
            {
                continue;
            }
            fitting += 1;

            let per_column = (self.room.height / product.height).floor().max(1.0);
            let columns_needed = (product.quantity as f64 / per_column).ceil().max(1.0);
            let needed = product.base_area() * columns_needed;
            density_sum += needed.min(cell_area) / needed.max(cell_area);
        }

        let fit_rate = fitting as f64 / self.products.len() as f64;
        let density = if fitting == 0 {
            0.0
        } else {
            density_sum / fitting as f64
        };
        (fit_rate, density)
    }

    /// Re-derives the grid when its cells are smaller than the largest item
    /// plus margin, as long as every product still gets a cell.
    fn validate_cell_size(&self, grid: GridLayout) -> GridLayout {
        let n = self.cells_needed();
        let max_width = self.products.iter().map(|p| p.width).fold(0.0, f64::max);
        let max_depth = self.products.iter().map(|p| p.depth).fold(0.0, f64::max);
        let required_width = max_width * (1.0 + CELL_MARGIN);
        let required_depth = max_depth * (1.0 + CELL_MARGIN);

        if grid.cell_width >= required_width && grid.cell_depth >= required_depth {
            return grid;
        }

        let columns = if grid.cell_width < required_width {
            ((self.room.width / required_width).floor() as u32).max(1)
        } else {
            grid.columns
        };
        let rows = if grid.cell_depth < required_depth {
            ((self.room.depth / required_depth).floor() as u32).max(1)
        } else {
            grid.rows
        };

        if u64::from(columns) * u64::from(rows) >= u64::from(n) {
            debug!(
                "Resized grid {}x{} -> {}x{} to fit the largest item",
                grid.columns, grid.rows, columns, rows
            );
            return GridLayout::for_room(columns, rows, self.room);
        }

        // Not enough room for margins everywhere: keep enough cells, and
        // accept cells that only fit the largest item without margin.
        let rows = n.div_ceil(columns);
        let candidate = GridLayout::for_room(columns, rows, self.room);
        if candidate.cell_depth + BOUNDARY_MARGIN >= max_depth {
            return candidate;
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, w: f64, d: f64, h: f64, qty: u32) -> ProductSummary {
        ProductSummary {
            product_id: id.to_string(),
            width: w,
            depth: d,
            height: h,
            quantity: qty,
        }
    }

    fn assert_grid_within_room(grid: &GridLayout, room: &Room) {
        assert!(grid.columns as f64 * grid.cell_width <= room.width * (1.0 + GRID_TOLERANCE));
        assert!(grid.rows as f64 * grid.cell_depth <= room.depth * (1.0 + GRID_TOLERANCE));
    }

    #[test]
    fn test_size_profile_tertiles() {
        let products = vec![
            product("a", 10.0, 10.0, 10.0, 1),
            product("b", 50.0, 50.0, 50.0, 1),
            product("c", 20.0, 20.0, 20.0, 1),
            product("d", 30.0, 30.0, 30.0, 1),
            product("e", 40.0, 40.0, 40.0, 1),
            product("f", 5.0, 5.0, 5.0, 1),
        ];
        let profile = SizeProfile::classify(&products);
        assert_eq!(profile.small.len(), 2);
        assert_eq!(profile.medium.len(), 2);
        assert_eq!(profile.large.len(), 2);
        assert_eq!(profile.class_of(1), Some(SizeClass::Large));
        assert_eq!(profile.class_of(5), Some(SizeClass::Small));
    }

    #[test]
    fn test_single_product_is_large() {
        let products = vec![product("a", 10.0, 10.0, 10.0, 1)];
        let profile = SizeProfile::classify(&products);
        assert_eq!(profile.large, vec![0]);
    }

    #[test]
    fn test_grid_has_a_cell_per_product() {
        let room = Room::new(1000.0, 600.0, 250.0);
        let products: Vec<ProductSummary> = (0..12)
            .map(|i| product(&format!("P{}", i), 50.0, 40.0, 30.0, 2))
            .collect();

        let grid = SmartGridCalculator::new(&products, &room).calculate();
        assert!(grid.cell_count() >= 12);
        assert!(grid.cell_width >= 50.0);
        assert!(grid.cell_depth >= 40.0);
        assert_grid_within_room(&grid, &room);
    }

    #[test]
    fn test_size_based_follows_room_aspect() {
        let room = Room::new(2000.0, 500.0, 100.0);
        let products: Vec<ProductSummary> = (0..4)
            .map(|i| product(&format!("P{}", i), 100.0, 100.0, 50.0, 1))
            .collect();

        let grid = SmartGridCalculator::new(&products, &room)
            .size_based()
            .unwrap();
        assert_eq!((grid.columns, grid.rows), (4, 1));
    }

    #[test]
    fn test_size_based_fails_for_oversized_item() {
        let room = Room::new(100.0, 100.0, 100.0);
        let products = vec![product("wide", 150.0, 10.0, 10.0, 1)];
        assert!(SmartGridCalculator::new(&products, &room)
            .size_based()
            .is_err());
    }

    #[test]
    fn test_falls_back_to_simple_grid_when_nothing_fits() {
        let room = Room::new(100.0, 100.0, 100.0);
        let products = vec![
            product("huge", 500.0, 500.0, 10.0, 1),
            product("huge2", 400.0, 400.0, 10.0, 1),
        ];

        let calc = SmartGridCalculator::new(&products, &room);
        let grid = calc.calculate();
        assert!(grid.cell_count() >= 2);
        assert_grid_within_room(&grid, &room);
    }

    #[test]
    fn test_aspect_ratio_matches_item_shape() {
        let room = Room::new(1000.0, 1000.0, 100.0);
        let products: Vec<ProductSummary> = (0..4)
            .map(|i| product(&format!("P{}", i), 100.0, 25.0, 10.0, 1))
            .collect();

        let grid = SmartGridCalculator::new(&products, &room)
            .aspect_ratio_matched()
            .unwrap();
        // Wide items prefer wide cells: one column of four rows.
        assert_eq!((grid.columns, grid.rows), (1, 4));
    }

    #[test]
    fn test_override_derives_missing_side() {
        let room = Room::new(1000.0, 600.0, 250.0);
        let products: Vec<ProductSummary> = (0..10)
            .map(|i| product(&format!("P{}", i), 50.0, 40.0, 30.0, 1))
            .collect();
        let calc = SmartGridCalculator::new(&products, &room);

        let grid = calc
            .with_override(GridOverride {
                columns: Some(4),
                rows: None,
            })
            .unwrap();
        assert_eq!((grid.columns, grid.rows), (4, 3));

        assert!(calc
            .with_override(GridOverride {
                columns: Some(0),
                rows: Some(2),
            })
            .is_err());
    }

    #[test]
    fn test_override_rejects_cells_smaller_than_every_product() {
        let room = Room::new(1000.0, 1000.0, 100.0);
        let products = vec![product("A", 10.0, 10.0, 10.0, 2)];
        let calc = SmartGridCalculator::new(&products, &room);

        let result = calc.with_override(GridOverride {
            columns: Some(100_000),
            rows: Some(100_000),
        });
        assert!(matches!(result, Err(PackerError::StrategyFailed(_))));

        let grid = calc
            .with_override(GridOverride {
                columns: Some(100),
                rows: Some(100),
            })
            .unwrap();
        assert_eq!(grid.cell_count(), 10_000);
    }

    #[test]
    fn test_undersized_cells_are_resized_with_margin() {
        let room = Room::new(1000.0, 600.0, 100.0);
        let products = vec![product("A", 100.0, 100.0, 50.0, 1)];
        let calc = SmartGridCalculator::new(&products, &room);

        // 20x20 leaves 50x30 cells; each side needs 105.
        let grid = calc.validate_cell_size(GridLayout::for_room(20, 20, &room));
        assert_eq!((grid.columns, grid.rows), (9, 5));
        assert!(grid.cell_width >= 105.0);
        assert!(grid.cell_depth >= 105.0);

        let roomy = GridLayout::for_room(2, 2, &room);
        assert_eq!(calc.validate_cell_size(roomy), roomy);
    }

    #[test]
    fn test_score_penalizes_missing_fit() {
        let room = Room::new(400.0, 400.0, 100.0);
        let products = vec![
            product("a", 150.0, 150.0, 50.0, 1),
            product("b", 150.0, 150.0, 50.0, 1),
        ];
        let calc = SmartGridCalculator::new(&products, &room);

        let roomy = calc.score(&GridLayout::for_room(2, 1, &room));
        let cramped = calc.score(&GridLayout::for_room(4, 4, &room));
        assert_eq!(roomy.fit_rate, 1.0);
        assert_eq!(cramped.fit_rate, 0.0);
        assert!(roomy.total > cramped.total);
    }
}
