use crate::geometry::{Box3D, Rectangle};
use crate::rotation::Rotation;
use crate::stacking::stack_id;
use crate::tolerance::is_floor_level;
use serde::{Deserialize, Serialize};

/// Room interior - floor width/depth and ceiling height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Room {
    pub fn new(width: f64, depth: f64, height: f64) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    pub fn floor_area(&self) -> f64 {
        self.width * self.depth
    }

    /// The whole floor as a free rectangle carrying the room height.
    pub fn floor(&self) -> Rectangle {
        Rectangle::new(0.0, 0.0, self.width, self.depth, self.height)
    }
}

fn default_true() -> bool {
    true
}

fn default_quantity() -> u32 {
    1
}

/// Request to place `quantity` identical units of a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub product_id: String,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Whether the item may be turned 90° on the floor plane
    #[serde(default = "default_true")]
    pub rotatable: bool,
}

impl Item {
    pub fn new(product_id: impl Into<String>, width: f64, depth: f64, height: f64) -> Self {
        Self {
            product_id: product_id.into(),
            width,
            depth,
            height,
            quantity: 1,
            rotatable: true,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_rotatable(mut self, rotatable: bool) -> Self {
        self.rotatable = rotatable;
        self
    }

    pub fn unit_volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    pub fn base_area(&self) -> f64 {
        self.width * self.depth
    }
}

/// A placed unit inside the room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub product_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: Rotation,
    /// Zero-based level inside the unit's stack
    #[serde(default)]
    pub layer_index: u32,
    #[serde(default)]
    pub stack_id: String,
    /// One-based position inside the unit's stack
    #[serde(default = "default_quantity")]
    pub stack_position: u32,
    #[serde(default)]
    pub stack_base_x: f64,
    #[serde(default)]
    pub stack_base_y: f64,
    #[serde(default)]
    pub items_below_count: u32,
}

impl Placement {
    /// Creates a floor-level placement that starts its own stack.
    pub fn on_floor(
        product_id: impl Into<String>,
        x: f64,
        y: f64,
        width: f64,
        depth: f64,
        height: f64,
        rotation: Rotation,
    ) -> Self {
        Self::stacked(product_id, x, y, 0.0, width, depth, height, rotation, 0)
    }

    /// Creates a placement sitting on top of `items_below` units of the same stack.
    #[allow(clippy::too_many_arguments)]
    pub fn stacked(
        product_id: impl Into<String>,
        x: f64,
        y: f64,
        z: f64,
        width: f64,
        depth: f64,
        height: f64,
        rotation: Rotation,
        items_below: u32,
    ) -> Self {
        let product_id = product_id.into();
        Self {
            stack_id: stack_id(&product_id, x, y),
            product_id,
            x,
            y,
            z,
            width,
            depth,
            height,
            rotation,
            layer_index: items_below,
            stack_position: items_below + 1,
            stack_base_x: x,
            stack_base_y: y,
            items_below_count: items_below,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.depth
    }

    pub fn top_z(&self) -> f64 {
        self.z + self.height
    }

    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    pub fn base_area(&self) -> f64 {
        self.width * self.depth
    }

    pub fn is_floor_level(&self) -> bool {
        is_floor_level(self.z)
    }

    pub fn footprint(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.width, self.depth, self.height)
    }

    pub fn to_box(&self) -> Box3D {
        Box3D::new(self.x, self.y, self.z, self.width, self.depth, self.height)
    }

    /// Moves the placement on the floor plane, keeping Z and re-keying its stack.
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        self.stack_base_x = x;
        self.stack_base_y = y;
        self.stack_id = stack_id(&self.product_id, x, y);
    }
}

/// A unit that could not be placed, with the reason why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnplacedItem {
    pub product_id: String,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub reason: String,
}

/// Strategy selection requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Laff,
    Maxrects,
    Skyline,
    Compartment,
    CompartmentGrid,
    #[default]
    Hybrid,
}

/// Packing strategy that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Laff,
    Compartment,
    Hybrid,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StrategyKind::Laff => "laff",
            StrategyKind::Compartment => "compartment",
            StrategyKind::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

/// Explicit grid requested by the caller; a missing side is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridOverride {
    #[serde(default)]
    pub columns: Option<u32>,
    #[serde(default)]
    pub rows: Option<u32>,
}

/// Packing options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackOptions {
    /// Ignored by the compartment strategy, which always packs unrotated
    #[serde(default = "default_true")]
    pub allow_rotation: bool,
    /// Prefer bottom-left positions over tighter free-space fits
    #[serde(default)]
    pub prefer_bottom: bool,
    /// Cap on per-stack height; the room height when absent
    #[serde(default)]
    pub column_max_height: Option<f64>,
    #[serde(default)]
    pub grid: Option<GridOverride>,
    #[serde(default)]
    pub algorithm: Option<Algorithm>,
    /// Run the layout optimizer over the packed result
    #[serde(default)]
    pub optimize: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            allow_rotation: true,
            prefer_bottom: false,
            column_max_height: None,
            grid: None,
            algorithm: None,
            optimize: false,
        }
    }
}

impl PackOptions {
    /// Effective stack height cap for a room.
    pub fn column_height_limit(&self, room: &Room) -> f64 {
        self.column_max_height
            .filter(|h| *h > 0.0)
            .map_or(room.height, |h| h.min(room.height))
    }
}

/// Input: what the caller provides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackRequest {
    pub room: Room,
    pub items: Vec<Item>,
    #[serde(default)]
    pub options: PackOptions,
}

/// Compartment grid over the room floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: f64,
    pub cell_depth: f64,
}

impl GridLayout {
    /// Evenly divides the room floor into `columns` x `rows` cells.
    pub fn for_room(columns: u32, rows: u32, room: &Room) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);
        Self {
            columns,
            rows,
            cell_width: room.width / columns as f64,
            cell_depth: room.depth / rows as f64,
        }
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.columns) * u64::from(self.rows)
    }

    /// Boundary of the `index`-th cell in row-major order.
    pub fn cell(&self, index: u32, height: f64) -> Option<Rectangle> {
        if u64::from(index) >= self.cell_count() {
            return None;
        }
        let column = index % self.columns;
        let row = index / self.columns;
        Some(Rectangle::new(
            column as f64 * self.cell_width,
            row as f64 * self.cell_depth,
            self.cell_width,
            self.cell_depth,
            height,
        ))
    }
}

/// Output: what a packing run returns
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackResult {
    pub placements: Vec<Placement>,
    pub unplaced_items: Vec<UnplacedItem>,
    /// Placed volume as a percentage of room volume
    pub utilization: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub strategy_used: Option<StrategyKind>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub grid: Option<GridLayout>,
}

impl PackResult {
    /// Score used to compare competing strategies.
    pub fn score(&self) -> f64 {
        self.utilization + 0.1 * self.placements.len() as f64
    }
}

/// Stored layout handed to validation and optimization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutFile {
    pub room: Room,
    pub placements: Vec<Placement>,
}

/// Result of re-checking a finished layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub volume_utilization: f64,
    /// Each distinct footprint counted once regardless of stack height
    pub floor_utilization: f64,
}

/// Per-item outcome of the pre-generation check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFeasibility {
    pub product_id: String,
    pub fits: bool,
    pub requested: u32,
    /// Estimated capacity after the safety factor
    pub max_quantity: u32,
}

/// Result of the pre-generation check
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub items: Vec<ItemFeasibility>,
    pub estimated_utilization: f64,
}

/// Result of the post-processing optimizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub placements: Vec<Placement>,
    pub improvements: Vec<String>,
    pub utilization_before: f64,
    pub utilization_after: f64,
}

/// Error type for the packing engine
#[derive(Debug, thiserror::Error)]
pub enum PackerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Too many items: {count} units requested, limit is {limit}")]
    TooManyItems { count: usize, limit: usize },

    #[error("Strategy failed: {0}")]
    StrategyFailed(String),
}

pub type Result<T> = std::result::Result<T, PackerError>;
