//! Maximal free-rectangle pool.
//!
//! Tracks the still-empty floor as a set of possibly overlapping maximal
//! rectangles. Every placement splits the rectangles it touches into up to
//! four residuals, and residuals contained in another rectangle are pruned.

use crate::geometry::Rectangle;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct FreeSpaceManager {
    free: Vec<Rectangle>,
}

impl FreeSpaceManager {
    /// Starts with a single free rectangle covering `bounds`.
    pub fn new(bounds: Rectangle) -> Self {
        let free = if bounds.width > 0.0 && bounds.depth > 0.0 {
            vec![bounds]
        } else {
            Vec::new()
        };
        Self { free }
    }

    pub fn free_rectangles(&self) -> &[Rectangle] {
        &self.free
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Every free rectangle able to hold an item of the given extents.
    pub fn candidates(&self, width: f64, depth: f64, height: f64) -> impl Iterator<Item = &Rectangle> {
        self.free
            .iter()
            .filter(move |r| r.can_fit(width, depth, height))
    }

    /// Free rectangle with the least leftover area, ties going bottom-left.
    pub fn find_best_fit(&self, width: f64, depth: f64, height: f64) -> Option<Rectangle> {
        self.candidates(width, depth, height)
            .min_by(|a, b| {
                let leftover_a = a.area() - width * depth;
                let leftover_b = b.area() - width * depth;
                leftover_a
                    .partial_cmp(&leftover_b)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
                    .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
            })
            .copied()
    }

    /// Removes `used` from the pool.
    pub fn split_free_space(&mut self, used: &Rectangle) {
        let mut next = Vec::with_capacity(self.free.len() + 4);

        for area in self.free.drain(..) {
            if !area.intersects(used) {
                next.push(area);
                continue;
            }

            // Right of the used area
            if used.right() < area.right() {
                next.push(Rectangle::new(
                    used.right(),
                    area.y,
                    area.right() - used.right(),
                    area.depth,
                    area.height,
                ));
            }

            // Above (far side in Y)
            if used.top() < area.top() {
                next.push(Rectangle::new(
                    area.x,
                    used.top(),
                    area.width,
                    area.top() - used.top(),
                    area.height,
                ));
            }

            // Left of the used area
            if used.x > area.x {
                next.push(Rectangle::new(
                    area.x,
                    area.y,
                    used.x - area.x,
                    area.depth,
                    area.height,
                ));
            }

            // Below (near side in Y)
            if used.y > area.y {
                next.push(Rectangle::new(
                    area.x,
                    area.y,
                    area.width,
                    used.y - area.y,
                    area.height,
                ));
            }
        }

        next.retain(|r| r.width > 0.0 && r.depth > 0.0);
        self.free = next;
        self.prune();
    }

    /// Drops rectangles fully contained in another one.
    fn prune(&mut self) {
        let mut keep = vec![true; self.free.len()];

        for i in 0..self.free.len() {
            if !keep[i] {
                continue;
            }
            for j in 0..self.free.len() {
                if i == j || !keep[j] {
                    continue;
                }
                if self.free[j].contains(&self.free[i]) {
                    // Identical rectangles: keep the first occurrence only.
                    if self.free[i].contains(&self.free[j]) && i < j {
                        continue;
                    }
                    keep[i] = false;
                    break;
                }
            }
        }

        let mut idx = 0;
        self.free.retain(|_| {
            let kept = keep[idx];
            idx += 1;
            kept
        });
    }
}
