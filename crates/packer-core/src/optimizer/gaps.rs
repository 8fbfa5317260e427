use super::*;

/// Side of the square cells the floor is scanned with.
const GAP_GRID_STEP: f64 = 10.0;
/// Gaps narrower than this on either side are ignored.
const MIN_GAP_SIZE: f64 = 5.0;

impl LayoutOptimizer {
    /// Empty floor rectangles, built by merging free grid cells row by row.
    pub(super) fn find_gaps(&self, columns: &[Column]) -> Vec<Rectangle> {
        let nx = (self.room.width / GAP_GRID_STEP).ceil() as usize;
        let ny = (self.room.depth / GAP_GRID_STEP).ceil() as usize;
        if nx == 0 || ny == 0 {
            return Vec::new();
        }

        let cell = |i: usize, j: usize| {
            let x = i as f64 * GAP_GRID_STEP;
            let y = j as f64 * GAP_GRID_STEP;
            Rectangle::new(
                x,
                y,
                GAP_GRID_STEP.min(self.room.width - x),
                GAP_GRID_STEP.min(self.room.depth - y),
                0.0,
            )
        };

        let mut empty = vec![vec![false; nx]; ny];
        for (j, row) in empty.iter_mut().enumerate() {
            for (i, slot) in row.iter_mut().enumerate() {
                *slot = blocking(&cell(i, j), columns, None).is_none();
            }
        }

        let mut visited = vec![vec![false; nx]; ny];
        let mut gaps = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                if !empty[j][i] || visited[j][i] {
                    continue;
                }

                let mut i_end = i;
                while i_end < nx && empty[j][i_end] && !visited[j][i_end] {
                    i_end += 1;
                }
                let mut j_end = j + 1;
                while j_end < ny && (i..i_end).all(|k| empty[j_end][k] && !visited[j_end][k]) {
                    j_end += 1;
                }
                for row in &mut visited[j..j_end] {
                    for slot in &mut row[i..i_end] {
                        *slot = true;
                    }
                }

                let x = i as f64 * GAP_GRID_STEP;
                let y = j as f64 * GAP_GRID_STEP;
                let right = (i_end as f64 * GAP_GRID_STEP).min(self.room.width);
                let top = (j_end as f64 * GAP_GRID_STEP).min(self.room.depth);
                if right - x >= MIN_GAP_SIZE && top - y >= MIN_GAP_SIZE {
                    gaps.push(Rectangle::new(x, y, right - x, top - y, 0.0));
                }
            }
        }
        gaps
    }

    /// Moves the smallest stacks into the bottom-left-most gap they fit.
    ///
    /// A stack only moves when the gap lies before its current position in
    /// bottom-left order. Returns the number of stacks moved.
    pub(super) fn fill_gaps(&self, columns: &mut [Column]) -> usize {
        let mut order: Vec<usize> = (0..columns.len()).collect();
        order.sort_by(|&a, &b| {
            columns[a]
                .area()
                .partial_cmp(&columns[b].area())
                .unwrap_or(Ordering::Equal)
        });

        let mut gaps = self.find_gaps(columns);
        let mut moved = 0;
        for idx in order {
            let column = &columns[idx];
            let target = gaps
                .iter()
                .filter(|g| column.width <= g.width && column.depth <= g.depth)
                .min_by(|a, b| bottom_left((a.x, a.y), (b.x, b.y)));

            let Some(gap) = target else { continue };
            if bottom_left((gap.x, gap.y), (column.x, column.y)) != Ordering::Less {
                continue;
            }

            let rect = column.footprint_at(gap.x, gap.y);
            if !self.fits_floor(&rect) || blocking(&rect, columns, Some(idx)).is_some() {
                continue;
            }

            debug!(
                "Gap fill moved stack from ({}, {}) to ({}, {})",
                column.x, column.y, gap.x, gap.y
            );
            columns[idx].x = gap.x;
            columns[idx].y = gap.y;
            moved += 1;
            gaps = self.find_gaps(columns);
        }
        moved
    }
}
