//! Floor-plane orientations.
//!
//! Items only turn about the vertical axis: 90° and 270° swap width and
//! depth, 0° and 180° leave them alone, and height never changes.

use serde::{Deserialize, Serialize};

/// One of the four floor-plane orientations, serialized as degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Enumeration order used when searching for an orientation.
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// Whether this orientation swaps width and depth.
    pub fn swaps_footprint(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        Rotation::from_degrees(degrees)
            .ok_or_else(|| format!("Unsupported rotation: {} degrees", degrees))
    }
}

/// Item extents in a specific orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub rotation: Rotation,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Orientation {
    pub fn base_area(&self) -> f64 {
        self.width * self.depth
    }
}

/// Returns `(width, depth, height)` after applying `rotation`.
pub fn rotated_dimensions(
    width: f64,
    depth: f64,
    height: f64,
    rotation: Rotation,
) -> (f64, f64, f64) {
    if rotation.swaps_footprint() {
        (depth, width, height)
    } else {
        (width, depth, height)
    }
}

/// Every orientation an item may take.
///
/// Non-rotatable items only get 0°. Rotatable items get all four codes even
/// though 90°/270° (and 0°/180°) produce the same extents.
pub fn all_rotations(width: f64, depth: f64, height: f64, rotatable: bool) -> Vec<Orientation> {
    let rotations: &[Rotation] = if rotatable {
        &Rotation::ALL
    } else {
        &Rotation::ALL[..1]
    };

    rotations
        .iter()
        .map(|&rotation| {
            let (w, d, h) = rotated_dimensions(width, depth, height, rotation);
            Orientation {
                rotation,
                width: w,
                depth: d,
                height: h,
            }
        })
        .collect()
}

/// First orientation (0, 90, 180, 270) whose extents fit the target space.
pub fn best_rotation(
    width: f64,
    depth: f64,
    height: f64,
    rotatable: bool,
    space_width: f64,
    space_depth: f64,
    space_height: f64,
) -> Option<Orientation> {
    all_rotations(width, depth, height, rotatable)
        .into_iter()
        .find(|o| o.width <= space_width && o.depth <= space_depth && o.height <= space_height)
}
