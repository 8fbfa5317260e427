use super::{expand_items, sort_by_area_desc, volume_utilization, ExpandedItem, PackingStrategy};
use crate::collision::{fits_in_room, has_collision};
use crate::free_space::FreeSpaceManager;
use crate::geometry::{Box3D, Rectangle};
use crate::rotation::{all_rotations, best_rotation, Orientation};
use crate::types::*;
use std::cmp::Ordering;
use tracing::debug;

/// Largest-Area-Fit-First packing over a maximal free-rectangle pool.
///
/// Units are placed on the floor only (Z = 0); nothing is stacked.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaffStrategy;

struct Candidate {
    orientation: Orientation,
    x: f64,
    y: f64,
    leftover: f64,
}

impl LaffStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Packs `units` inside `region`, in the order given.
    ///
    /// The region's height is the tallest unit it accepts. Placements are
    /// expressed in room coordinates.
    pub fn pack_region(
        &self,
        units: &[ExpandedItem],
        region: Rectangle,
        room: &Room,
        allow_rotation: bool,
        prefer_bottom: bool,
    ) -> (Vec<Placement>, Vec<UnplacedItem>) {
        let mut free_space = FreeSpaceManager::new(region);
        let mut placed_boxes: Vec<Box3D> = Vec::new();
        let mut placements = Vec::new();
        let mut unplaced = Vec::new();

        for unit in units {
            let rotatable = unit.rotatable && allow_rotation;
            let mut best: Option<Candidate> = None;

            for orientation in all_rotations(unit.width, unit.depth, unit.height, rotatable) {
                for area in
                    free_space.candidates(orientation.width, orientation.depth, orientation.height)
                {
                    let candidate_box = Box3D::new(
                        area.x,
                        area.y,
                        0.0,
                        orientation.width,
                        orientation.depth,
                        orientation.height,
                    );
                    if !fits_in_room(&candidate_box, room)
                        || has_collision(&candidate_box, &placed_boxes)
                    {
                        continue;
                    }

                    let candidate = Candidate {
                        orientation,
                        x: area.x,
                        y: area.y,
                        leftover: area.area() - orientation.base_area(),
                    };
                    let better = match &best {
                        None => true,
                        Some(current) => {
                            compare_candidates(&candidate, current, prefer_bottom)
                                == Ordering::Less
                        }
                    };
                    if better {
                        best = Some(candidate);
                    }
                }
            }

            match best {
                Some(candidate) => {
                    let o = candidate.orientation;
                    let placement = Placement::on_floor(
                        unit.product_id.clone(),
                        candidate.x,
                        candidate.y,
                        o.width,
                        o.depth,
                        o.height,
                        o.rotation,
                    );
                    free_space.split_free_space(&placement.footprint());
                    placed_boxes.push(placement.to_box());
                    placements.push(placement);
                }
                None => unplaced.push(unit.unplaced(unplaced_reason(unit, &region, rotatable))),
            }
        }

        (placements, unplaced)
    }
}

fn compare_candidates(a: &Candidate, b: &Candidate, prefer_bottom: bool) -> Ordering {
    let by_leftover = a.leftover.partial_cmp(&b.leftover).unwrap_or(Ordering::Equal);
    let by_position = a
        .y
        .partial_cmp(&b.y)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

    if prefer_bottom {
        by_position.then(by_leftover)
    } else {
        by_leftover.then(by_position)
    }
}

fn unplaced_reason(unit: &ExpandedItem, region: &Rectangle, rotatable: bool) -> String {
    let fits_somewhere = best_rotation(
        unit.width,
        unit.depth,
        unit.height,
        rotatable,
        region.width,
        region.depth,
        region.height,
    )
    .is_some();

    if fits_somewhere {
        "No free space left for item".to_string()
    } else {
        format!(
            "Item {}x{}x{} does not fit in {}x{}x{} in any allowed orientation",
            unit.width, unit.depth, unit.height, region.width, region.depth, region.height
        )
    }
}

impl PackingStrategy for LaffStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Laff
    }

    fn pack(&self, items: &[Item], room: &Room, options: &PackOptions) -> Result<PackResult> {
        let mut units = expand_items(items);
        sort_by_area_desc(&mut units);

        let mut region = room.floor();
        region.height = options.column_height_limit(room);

        let (placements, unplaced_items) = self.pack_region(
            &units,
            region,
            room,
            options.allow_rotation,
            options.prefer_bottom,
        );
        let utilization = volume_utilization(&placements, room);

        debug!(
            "LAFF placed {} of {} units ({:.2}% utilization)",
            placements.len(),
            units.len(),
            utilization
        );

        Ok(PackResult {
            placements,
            unplaced_items,
            utilization,
            strategy_used: Some(StrategyKind::Laff),
            grid: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::Rotation;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn no_rotation() -> PackOptions {
        PackOptions {
            allow_rotation: false,
            ..PackOptions::default()
        }
    }

    #[test]
    fn test_places_identical_items_on_floor() {
        let room = Room::new(1000.0, 800.0, 300.0);
        let items = vec![Item::new("P1", 200.0, 150.0, 100.0).with_quantity(4)];

        let result = LaffStrategy::new()
            .pack(&items, &room, &no_rotation())
            .unwrap();

        assert_eq!(result.placements.len(), 4);
        assert!(result.unplaced_items.is_empty());
        assert!(result.placements.iter().all(|p| p.z == 0.0));
        assert_relative_eq!(result.utilization, 5.0, epsilon = 1e-9);

        for (i, a) in result.placements.iter().enumerate() {
            for b in &result.placements[i + 1..] {
                assert!(!a.to_box().intersects(&b.to_box()));
            }
        }
    }

    #[test]
    fn test_largest_item_goes_first_at_origin() {
        let room = Room::new(100.0, 100.0, 50.0);
        let items = vec![
            Item::new("small", 10.0, 10.0, 10.0),
            Item::new("large", 60.0, 60.0, 10.0),
        ];

        let result = LaffStrategy::new()
            .pack(&items, &room, &PackOptions::default())
            .unwrap();

        assert_eq!(result.placements[0].product_id, "large");
        assert_relative_eq!(result.placements[0].x, 0.0);
        assert_relative_eq!(result.placements[0].y, 0.0);
    }

    #[test]
    fn test_rotation_used_when_needed() {
        let room = Room::new(50.0, 100.0, 50.0);
        let items = vec![Item::new("long", 80.0, 40.0, 10.0)];

        let result = LaffStrategy::new()
            .pack(&items, &room, &PackOptions::default())
            .unwrap();
        assert_eq!(result.placements.len(), 1);
        assert_eq!(result.placements[0].rotation, Rotation::Deg90);
        assert_relative_eq!(result.placements[0].width, 40.0);

        let result = LaffStrategy::new()
            .pack(&items, &room, &no_rotation())
            .unwrap();
        assert!(result.placements.is_empty());
        assert_eq!(result.unplaced_items.len(), 1);
    }

    #[test]
    fn test_oversized_item_reports_reason() {
        let room = Room::new(100.0, 100.0, 100.0);
        let items = vec![Item::new("big", 150.0, 50.0, 50.0)];

        let result = LaffStrategy::new()
            .pack(&items, &room, &PackOptions::default())
            .unwrap();

        assert!(result.placements.is_empty());
        assert!(result.unplaced_items[0].reason.contains("does not fit"));
    }

    #[test]
    fn test_full_room_reports_no_space() {
        let room = Room::new(100.0, 100.0, 100.0);
        let items = vec![Item::new("block", 100.0, 100.0, 10.0).with_quantity(2)];

        let result = LaffStrategy::new()
            .pack(&items, &room, &PackOptions::default())
            .unwrap();

        assert_eq!(result.placements.len(), 1);
        assert_eq!(result.unplaced_items[0].reason, "No free space left for item");
    }

    #[test]
    fn test_column_limit_rejects_tall_items() {
        let room = Room::new(100.0, 100.0, 100.0);
        let items = vec![Item::new("tall", 10.0, 10.0, 60.0)];
        let options = PackOptions {
            column_max_height: Some(50.0),
            ..PackOptions::default()
        };

        let result = LaffStrategy::new().pack(&items, &room, &options).unwrap();
        assert!(result.placements.is_empty());
    }

    #[test]
    fn test_pack_region_offsets_placements() {
        let room = Room::new(200.0, 200.0, 50.0);
        let units = expand_items(&[Item::new("A", 40.0, 40.0, 10.0).with_quantity(2)]);
        let region = Rectangle::new(100.0, 100.0, 100.0, 100.0, 50.0);

        let (placements, unplaced) =
            LaffStrategy::new().pack_region(&units, region, &room, true, false);

        assert!(unplaced.is_empty());
        for p in &placements {
            assert!(region.contains(&p.footprint()));
        }
    }

    #[test]
    fn test_prefer_bottom_beats_tighter_fit() {
        // After the 30x60 unit the pool holds a loose strip at y = 0 (70x100)
        // and a tighter one at y = 60 (100x40).
        let room = Room::new(100.0, 100.0, 50.0);
        let units = expand_items(&[
            Item::new("base", 30.0, 60.0, 10.0),
            Item::new("cube", 30.0, 30.0, 10.0),
        ]);
        let region = room.floor();
        let laff = LaffStrategy::new();

        let (tight, _) = laff.pack_region(&units, region, &room, false, false);
        assert_relative_eq!(tight[1].x, 0.0);
        assert_relative_eq!(tight[1].y, 60.0);

        let (bottom, _) = laff.pack_region(&units, region, &room, false, true);
        assert_relative_eq!(bottom[1].x, 30.0);
        assert_relative_eq!(bottom[1].y, 0.0);
    }

    proptest! {
        #[test]
        fn prop_larger_room_never_places_fewer(
            w in 5u32..60,
            d in 5u32..60,
            qty in 1u32..40,
            room_w in 60u32..300,
            room_d in 60u32..300,
            grow_w in 0u32..100,
            grow_d in 0u32..100,
        ) {
            let items = vec![
                Item::new("A", w as f64, d as f64, 10.0)
                    .with_quantity(qty)
                    .with_rotatable(false),
            ];
            let small = Room::new(room_w as f64, room_d as f64, 50.0);
            let large = Room::new((room_w + grow_w) as f64, (room_d + grow_d) as f64, 50.0);

            let laff = LaffStrategy::new();
            let in_small = laff.pack(&items, &small, &PackOptions::default()).unwrap();
            let in_large = laff.pack(&items, &large, &PackOptions::default()).unwrap();

            prop_assert!(in_large.placements.len() >= in_small.placements.len());
        }

        #[test]
        fn prop_placements_stay_in_bounds(
            dims in prop::collection::vec((5u32..80, 5u32..80, 5u32..60, 1u32..6), 1..5),
        ) {
            let room = Room::new(200.0, 150.0, 60.0);
            let items: Vec<Item> = dims
                .iter()
                .enumerate()
                .map(|(i, (w, d, h, q))| {
                    Item::new(format!("P{}", i), *w as f64, *d as f64, *h as f64).with_quantity(*q)
                })
                .collect();

            let result = LaffStrategy::new().pack(&items, &room, &PackOptions::default()).unwrap();
            for p in &result.placements {
                prop_assert!(fits_in_room(&p.to_box(), &room));
            }
            prop_assert!(result.utilization >= 0.0 && result.utilization <= 100.0);
        }
    }
}
