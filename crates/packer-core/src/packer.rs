//! Engine entry points.
//!
//! [`Packer`] validates a request up front, runs the selected strategy with a
//! compartment fallback, optionally optimizes, and re-validates the result.

use crate::config::EngineConfig;
use crate::optimizer::LayoutOptimizer;
use crate::strategy::{
    unit_count, CompartmentStrategy, HybridStrategy, LaffStrategy, PackingStrategy,
};
use crate::types::*;
use crate::validator::LayoutValidator;
use tracing::{debug, info, warn};

/// Packs one validated request.
pub struct Packer {
    request: PackRequest,
    config: EngineConfig,
}

impl Packer {
    /// Validates the request with the default engine configuration.
    pub fn new(request: PackRequest) -> Result<Self> {
        Self::with_config(request, EngineConfig::default())
    }

    pub fn with_config(request: PackRequest, config: EngineConfig) -> Result<Self> {
        let room = &request.room;
        let dims = [room.width, room.depth, room.height];
        if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(PackerError::InvalidDimensions(format!(
                "Room dimensions must be positive, got {}x{}x{}",
                room.width, room.depth, room.height
            )));
        }

        let room_errors = LayoutValidator::with_config(config).validate_room(room);
        if !room_errors.is_empty() {
            return Err(PackerError::InvalidDimensions(room_errors.join("; ")));
        }

        if request.items.is_empty() {
            return Err(PackerError::InvalidInput(
                "At least one item must be provided".to_string(),
            ));
        }

        for item in &request.items {
            if item.product_id.trim().is_empty() {
                return Err(PackerError::InvalidInput(
                    "Every item needs a product id".to_string(),
                ));
            }

            let dims = [item.width, item.depth, item.height];
            if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
                return Err(PackerError::InvalidDimensions(format!(
                    "Product '{}' has non-positive dimensions {}x{}x{}",
                    item.product_id, item.width, item.depth, item.height
                )));
            }

            if item.quantity == 0 {
                return Err(PackerError::InvalidInput(format!(
                    "Product '{}' has zero quantity",
                    item.product_id
                )));
            }
        }

        let count = unit_count(&request.items);
        if count > config.max_units {
            return Err(PackerError::TooManyItems {
                count,
                limit: config.max_units,
            });
        }

        Ok(Self { request, config })
    }

    pub fn request(&self) -> &PackRequest {
        &self.request
    }

    /// Pre-generation capacity and utilization estimate for the request.
    pub fn check_feasibility(&self) -> FeasibilityReport {
        LayoutValidator::with_config(self.config)
            .check_feasibility(&self.request.room, &self.request.items)
    }

    /// Runs the full flow: strategy, fallback, optional optimizer, validation.
    pub fn pack(&self) -> PackResult {
        let PackRequest {
            room,
            items,
            options,
        } = &self.request;

        let mut result = match self.run_strategy() {
            Ok(result) => result,
            Err(err) => {
                warn!("{}, falling back to compartment packing", err);
                CompartmentStrategy::new().pack_fallback(items, room, options)
            }
        };

        let validator = LayoutValidator::with_config(self.config);
        if options.optimize {
            let report = LayoutOptimizer::new(*room).optimize(&result.placements);
            let check = validator.validate_layout(&report.placements, room);
            if check.valid {
                for note in &report.improvements {
                    debug!("Optimizer: {}", note);
                }
                result.placements = report.placements;
                result.utilization = report.utilization_after;
            } else {
                warn!(
                    "Discarding optimized layout with {} validation errors",
                    check.errors.len()
                );
            }
        }

        let report = validator.validate_layout(&result.placements, room);
        for error in &report.errors {
            warn!("Packed layout failed validation: {}", error);
        }

        info!(
            "Placed {} of {} units with {} strategy ({:.2}% utilization)",
            result.placements.len(),
            unit_count(items),
            result
                .strategy_used
                .map_or_else(|| "unknown".to_string(), |k| k.to_string()),
            result.utilization
        );
        result
    }

    fn run_strategy(&self) -> Result<PackResult> {
        let PackRequest {
            room,
            items,
            options,
        } = &self.request;

        match options.algorithm.unwrap_or_default() {
            Algorithm::Laff | Algorithm::Maxrects | Algorithm::Skyline => {
                LaffStrategy::new().pack(items, room, options)
            }
            Algorithm::Compartment | Algorithm::CompartmentGrid => {
                CompartmentStrategy::new().pack(items, room, options)
            }
            Algorithm::Hybrid => HybridStrategy::new(self.config).pack(items, room, options),
        }
    }
}

/// Validates the inputs and packs them with the default configuration.
pub fn pack(items: &[Item], room: &Room, options: &PackOptions) -> Result<PackResult> {
    let request = PackRequest {
        room: *room,
        items: items.to_vec(),
        options: options.clone(),
    };
    Ok(Packer::new(request)?.pack())
}

/// Re-checks a stored layout against its room.
pub fn validate_layout(placements: &[Placement], room: &Room) -> ValidationReport {
    LayoutValidator::new().validate_layout(placements, room)
}

/// Runs every optimizer pass over a stored layout.
pub fn optimize_layout(placements: &[Placement], room: &Room) -> OptimizationReport {
    LayoutOptimizer::new(*room).optimize(placements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(items: Vec<Item>, options: PackOptions) -> PackRequest {
        PackRequest {
            room: Room::new(400.0, 300.0, 100.0),
            items,
            options,
        }
    }

    fn with_algorithm(algorithm: Algorithm) -> PackOptions {
        PackOptions {
            algorithm: Some(algorithm),
            ..PackOptions::default()
        }
    }

    #[test]
    fn test_rejects_bad_room() {
        let mut req = request(vec![Item::new("A", 10.0, 10.0, 10.0)], PackOptions::default());
        req.room.height = 0.0;
        assert!(matches!(
            Packer::new(req),
            Err(PackerError::InvalidDimensions(_))
        ));

        let mut req = request(vec![Item::new("A", 10.0, 10.0, 10.0)], PackOptions::default());
        req.room.width = 20_000.0;
        assert!(matches!(
            Packer::new(req),
            Err(PackerError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_rejects_bad_items() {
        let req = request(vec![], PackOptions::default());
        assert!(matches!(Packer::new(req), Err(PackerError::InvalidInput(_))));

        let req = request(vec![Item::new("A", -1.0, 10.0, 10.0)], PackOptions::default());
        assert!(matches!(
            Packer::new(req),
            Err(PackerError::InvalidDimensions(_))
        ));

        let req = request(
            vec![Item::new("A", 10.0, 10.0, 10.0).with_quantity(0)],
            PackOptions::default(),
        );
        assert!(matches!(Packer::new(req), Err(PackerError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_too_many_units() {
        let req = request(
            vec![
                Item::new("A", 1.0, 1.0, 1.0).with_quantity(300),
                Item::new("B", 1.0, 1.0, 1.0).with_quantity(201),
            ],
            PackOptions::default(),
        );
        match Packer::new(req) {
            Err(PackerError::TooManyItems { count, limit }) => {
                assert_eq!(count, 501);
                assert_eq!(limit, 500);
            }
            other => panic!("expected TooManyItems, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_algorithm_dispatch() {
        let items = vec![Item::new("A", 50.0, 50.0, 20.0).with_quantity(3)];
        let cases = [
            (Algorithm::Laff, StrategyKind::Laff),
            (Algorithm::Maxrects, StrategyKind::Laff),
            (Algorithm::Skyline, StrategyKind::Laff),
            (Algorithm::Compartment, StrategyKind::Compartment),
            (Algorithm::CompartmentGrid, StrategyKind::Compartment),
        ];

        for (algorithm, expected) in cases {
            let result = Packer::new(request(items.clone(), with_algorithm(algorithm)))
                .unwrap()
                .pack();
            assert_eq!(result.strategy_used, Some(expected), "{:?}", algorithm);
            assert_eq!(result.placements.len(), 3);
        }
    }

    #[test]
    fn test_strategy_error_falls_back_to_compartments() {
        let options = PackOptions {
            algorithm: Some(Algorithm::Compartment),
            grid: Some(GridOverride {
                columns: Some(0),
                rows: Some(0),
            }),
            ..PackOptions::default()
        };
        let items = vec![Item::new("A", 50.0, 50.0, 20.0).with_quantity(2)];

        let result = Packer::new(request(items, options)).unwrap().pack();
        assert_eq!(result.strategy_used, Some(StrategyKind::Compartment));
        assert_eq!(result.placements.len(), 2);
        assert_eq!(result.grid.map(|g| g.cell_count()), Some(1));
    }

    #[test]
    fn test_huge_grid_override_falls_back() {
        let options = PackOptions {
            algorithm: Some(Algorithm::Compartment),
            grid: Some(GridOverride {
                columns: Some(100_000),
                rows: Some(100_000),
            }),
            ..PackOptions::default()
        };
        let req = PackRequest {
            room: Room::new(1000.0, 1000.0, 100.0),
            items: vec![Item::new("A", 10.0, 10.0, 10.0).with_quantity(2)],
            options,
        };

        let result = Packer::new(req).unwrap().pack();
        assert_eq!(result.strategy_used, Some(StrategyKind::Compartment));
        assert_eq!(result.placements.len(), 2);
        assert_eq!(result.grid.map(|g| g.cell_count()), Some(1));
    }

    #[test]
    fn test_optimize_flag_keeps_layout_valid() {
        let items = vec![
            Item::new("A", 120.0, 80.0, 50.0).with_quantity(2),
            Item::new("B", 60.0, 40.0, 30.0).with_quantity(4),
        ];
        let options = PackOptions {
            optimize: true,
            ..PackOptions::default()
        };

        let req = request(items, options);
        let room = req.room;
        let result = Packer::new(req).unwrap().pack();

        assert_eq!(result.placements.len(), 6);
        assert!(validate_layout(&result.placements, &room).valid);
    }

    #[test]
    fn test_free_function_pack() {
        let room = Room::new(100.0, 100.0, 100.0);
        let result = pack(
            &[Item::new("A", 150.0, 50.0, 50.0)],
            &room,
            &with_algorithm(Algorithm::Laff),
        )
        .unwrap();
        assert!(result.placements.is_empty());
        assert_eq!(result.unplaced_items.len(), 1);
    }

    #[test]
    fn test_feasibility_from_packer() {
        let req = request(
            vec![Item::new("A", 100.0, 100.0, 50.0).with_quantity(30)],
            PackOptions::default(),
        );
        let report = Packer::new(req).unwrap().check_feasibility();
        // 4 * 3 * 2 = 24, * 0.8 = 19
        assert_eq!(report.items[0].max_quantity, 19);
        assert!(report.warnings.iter().any(|w| w.contains("requested 30")));
    }
}
