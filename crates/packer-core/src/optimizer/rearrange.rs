use super::*;

const SCAN_STEP: f64 = 1.0;

impl LayoutOptimizer {
    /// Re-seats every stack largest-first at its bottom-left-most position.
    ///
    /// Stacks that fit nowhere keep their place. Returns `None` when the
    /// result would contain overlapping stacks, otherwise the new columns and
    /// how many of them moved.
    pub(super) fn rearrange(&self, columns: &[Column]) -> Option<(Vec<Column>, usize)> {
        let mut order: Vec<usize> = (0..columns.len()).collect();
        order.sort_by(|&a, &b| {
            columns[b]
                .area()
                .partial_cmp(&columns[a].area())
                .unwrap_or(Ordering::Equal)
        });

        let mut result = columns.to_vec();
        let mut seated: Vec<Column> = Vec::with_capacity(columns.len());
        let mut moved = 0;

        for idx in order {
            if let Some((x, y)) = self.bottom_left_position(&columns[idx], &seated) {
                if !approx_eq(x, columns[idx].x) || !approx_eq(y, columns[idx].y) {
                    moved += 1;
                }
                result[idx].x = x;
                result[idx].y = y;
            }
            seated.push(result[idx].clone());
        }

        if has_overlaps(&result) {
            return None;
        }
        Some((result, moved))
    }

    /// Scans rows upwards one unit at a time, jumping past blocking stacks.
    fn bottom_left_position(&self, column: &Column, seated: &[Column]) -> Option<(f64, f64)> {
        let mut y = 0.0;
        while y + column.depth <= self.room.depth {
            let mut x = 0.0;
            while x + column.width <= self.room.width {
                match blocking(&column.footprint_at(x, y), seated, None) {
                    Some(obstacle) => x = obstacle.right(),
                    None => return Some((x, y)),
                }
            }
            y += SCAN_STEP;
        }
        None
    }
}
