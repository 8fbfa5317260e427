//! Point, rectangle and box value types.

use crate::tolerance::approx_eq;
use serde::{Deserialize, Serialize};

/// A floor/height coordinate. Equality is tolerance based.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        approx_eq(self.x, other.x) && approx_eq(self.y, other.y) && approx_eq(self.z, other.z)
    }
}

/// A 2D footprint on the floor.
///
/// `height` only takes part in fit and volume math. Overlap tests between
/// rectangles ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(x: f64, y: f64, width: f64, depth: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            depth,
            height,
        }
    }

    /// X coordinate of the right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Y coordinate of the far (top) edge.
    pub fn top(&self) -> f64 {
        self.y + self.depth
    }

    pub fn area(&self) -> f64 {
        self.width * self.depth
    }

    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    /// Returns true when an item of the given extents fits inside this rectangle.
    pub fn can_fit(&self, width: f64, depth: f64, height: f64) -> bool {
        width <= self.width && depth <= self.depth && height <= self.height
    }

    /// Returns true when `other` lies entirely within this rectangle's footprint.
    pub fn contains(&self, other: &Rectangle) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.top() <= self.top()
    }

    /// Strict floor-plane overlap. Rectangles sharing an edge do not intersect.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.top() <= other.y
            || other.top() <= self.y)
    }

    /// Area of the zone shared with `other`, zero when disjoint.
    pub fn overlap_area(&self, other: &Rectangle) -> f64 {
        let overlap_w = self.right().min(other.right()) - self.x.max(other.x);
        let overlap_d = self.top().min(other.top()) - self.y.max(other.y);
        if overlap_w > 0.0 && overlap_d > 0.0 {
            overlap_w * overlap_d
        } else {
            0.0
        }
    }
}

/// A 3D placement volume.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Box3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Box3D {
    pub fn new(x: f64, y: f64, z: f64, width: f64, depth: f64, height: f64) -> Self {
        Self {
            x,
            y,
            z,
            width,
            depth,
            height,
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

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y, self.z)
    }

    /// Floor projection of this box, keeping its height for fit math.
    pub fn footprint(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.width, self.depth, self.height)
    }

    /// Separating-axis test. Boxes touching on a face do not intersect.
    pub fn intersects(&self, other: &Box3D) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.top() <= other.y
            || other.top() <= self.y
            || self.top_z() <= other.z
            || other.top_z() <= self.z)
    }
}
