use super::*;
use crate::tolerance::POINT_EPSILON;

impl LayoutOptimizer {
    /// Slides each stack left, then down, in Y-then-X order.
    pub(super) fn compact(&self, columns: &mut [Column]) -> usize {
        let mut order: Vec<usize> = (0..columns.len()).collect();
        order.sort_by(|&a, &b| {
            bottom_left((columns[a].x, columns[a].y), (columns[b].x, columns[b].y))
        });

        let mut moved = 0;
        for idx in order {
            let (x0, y0) = (columns[idx].x, columns[idx].y);
            columns[idx].x = slide_left(columns, idx);
            columns[idx].y = slide_down(columns, idx);
            if !approx_eq(columns[idx].x, x0) || !approx_eq(columns[idx].y, y0) {
                moved += 1;
            }
        }
        moved
    }
}

/// Furthest-left X reachable without crossing a stack sharing the Y range.
fn slide_left(columns: &[Column], idx: usize) -> f64 {
    let c = &columns[idx];
    columns
        .iter()
        .enumerate()
        .filter(|(i, o)| {
            *i != idx && o.y < c.top() && c.y < o.top() && o.right() <= c.x + POINT_EPSILON
        })
        .map(|(_, o)| o.right())
        .fold(0.0, f64::max)
}

/// Lowest Y reachable without crossing a stack sharing the X range.
fn slide_down(columns: &[Column], idx: usize) -> f64 {
    let c = &columns[idx];
    columns
        .iter()
        .enumerate()
        .filter(|(i, o)| {
            *i != idx && o.x < c.right() && c.x < o.right() && o.top() <= c.y + POINT_EPSILON
        })
        .map(|(_, o)| o.top())
        .fold(0.0, f64::max)
}
