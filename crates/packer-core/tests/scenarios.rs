use approx::assert_relative_eq;
use packer_core::rotation::best_rotation;
use packer_core::*;
use proptest::prelude::*;

fn options(algorithm: Algorithm) -> PackOptions {
    PackOptions {
        algorithm: Some(algorithm),
        ..PackOptions::default()
    }
}

#[test]
fn test_laff_places_identical_items_on_floor() {
    let room = Room::new(1000.0, 800.0, 300.0);
    let items = vec![Item::new("box", 200.0, 150.0, 100.0).with_quantity(4)];
    let opts = PackOptions {
        allow_rotation: false,
        ..options(Algorithm::Laff)
    };

    let result = pack(&items, &room, &opts).unwrap();

    assert_eq!(result.placements.len(), 4);
    assert!(result.unplaced_items.is_empty());
    assert!(result.placements.iter().all(|p| p.z == 0.0));
    assert!(validate_layout(&result.placements, &room).errors.is_empty());
    assert_relative_eq!(result.utilization, 5.0, epsilon = 1e-9);
}

#[test]
fn test_oversized_item_is_reported_unplaced() {
    let room = Room::new(100.0, 100.0, 100.0);
    assert!(best_rotation(150.0, 50.0, 50.0, true, 100.0, 100.0, 100.0).is_none());

    let result = pack(
        &[Item::new("plank", 150.0, 50.0, 50.0)],
        &room,
        &options(Algorithm::Laff),
    )
    .unwrap();

    assert!(result.placements.is_empty());
    assert_eq!(result.unplaced_items.len(), 1);
    assert_eq!(result.unplaced_items[0].product_id, "plank");
    assert!(result.unplaced_items[0].reason.contains("does not fit"));
}

#[test]
fn test_compartment_stacks_same_footprint() {
    let room = Room::new(200.0, 200.0, 100.0);
    let items = vec![
        Item::new("crate", 50.0, 50.0, 30.0),
        Item::new("crate", 50.0, 50.0, 40.0),
    ];

    let result = pack(&items, &room, &options(Algorithm::Compartment)).unwrap();

    assert_eq!(result.placements.len(), 2);
    let top = result
        .placements
        .iter()
        .find(|p| !p.is_floor_level())
        .unwrap();
    assert_relative_eq!(top.z, 30.0);
    assert_eq!(top.stack_position, 2);

    let report = validate_layout(&result.placements, &room);
    assert!(report.valid, "{:?}", report.errors);
    assert_relative_eq!(report.floor_utilization, 50.0 * 50.0 / 40_000.0 * 100.0);
}

#[test]
fn test_hybrid_selects_compartments_for_many_small_products() {
    let room = Room::new(1000.0, 600.0, 250.0);
    let items: Vec<Item> = (0..12)
        .map(|i| Item::new(format!("sku-{}", i), 50.0, 40.0, 30.0).with_quantity(2))
        .collect();

    let packer = Packer::new(PackRequest {
        room,
        items,
        options: PackOptions::default(),
    })
    .unwrap();
    let result = packer.pack();

    assert_eq!(result.strategy_used, Some(StrategyKind::Compartment));
    let grid = result.grid.unwrap();
    assert!(grid.cell_count() >= 12);
    assert!(validate_layout(&result.placements, &room).valid);
}

#[test]
fn test_optimizer_fills_gap_at_origin() {
    let room = Room::new(1000.0, 1000.0, 300.0);
    let placements = vec![Placement::on_floor(
        "stray",
        500.0,
        500.0,
        100.0,
        100.0,
        50.0,
        Rotation::Deg0,
    )];

    let report = optimize_layout(&placements, &room);

    assert_eq!(report.placements[0].x, 0.0);
    assert_eq!(report.placements[0].y, 0.0);
    assert!(!report.improvements.is_empty());
    assert_relative_eq!(report.utilization_before, report.utilization_after);
}

#[test]
fn test_request_round_trips_through_json() {
    let json = r#"{
        "room": {"width": 400, "depth": 300, "height": 100},
        "items": [{"product_id": "A", "width": 50, "depth": 50, "height": 20, "quantity": 3}],
        "options": {"algorithm": "compartment_grid", "column_max_height": 60}
    }"#;
    let request: PackRequest = serde_json::from_str(json).unwrap();
    assert!(request.items[0].rotatable);
    assert_eq!(request.options.algorithm, Some(Algorithm::CompartmentGrid));

    let result = Packer::new(request).unwrap().pack();
    assert_eq!(result.placements.len(), 3);
    assert!(result.placements.iter().all(|p| p.top_z() <= 60.0));

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["strategy_used"], "compartment");
    assert_eq!(value["placements"][0]["rotation"], 0);
}

fn item_strategy() -> impl Strategy<Value = Vec<(u32, u32, u32, u32)>> {
    prop::collection::vec((10u32..150, 10u32..150, 10u32..80, 1u32..5), 1..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_packed_layouts_are_valid(specs in item_strategy(), optimize in any::<bool>()) {
        let room = Room::new(500.0, 400.0, 200.0);
        let items: Vec<Item> = specs
            .iter()
            .enumerate()
            .map(|(i, &(w, d, h, q))| {
                Item::new(format!("P{}", i), w as f64, d as f64, h as f64).with_quantity(q)
            })
            .collect();
        let opts = PackOptions { optimize, ..PackOptions::default() };

        let result = pack(&items, &room, &opts).unwrap();

        let requested: u32 = specs.iter().map(|s| s.3).sum();
        prop_assert_eq!(
            result.placements.len() + result.unplaced_items.len(),
            requested as usize
        );
        for p in &result.placements {
            prop_assert!(p.x >= 0.0 && p.y >= 0.0 && p.z >= 0.0);
            prop_assert!(p.right() <= room.width);
            prop_assert!(p.top() <= room.depth);
            prop_assert!(p.top_z() <= room.height);
        }
        let report = validate_layout(&result.placements, &room);
        prop_assert!(report.valid, "{:?}", report.errors);
        prop_assert!((0.0..=100.0).contains(&result.utilization));
    }
}
