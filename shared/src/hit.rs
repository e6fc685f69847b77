use crate::geometry::Point;
use crate::region::{Region, VIRTUAL_HEIGHT, VIRTUAL_WIDTH};

const GRID_COLS: usize = 20;
const GRID_ROWS: usize = 24;
const CELL_W: f64 = VIRTUAL_WIDTH / GRID_COLS as f64;
const CELL_H: f64 = VIRTUAL_HEIGHT / GRID_ROWS as f64;

/// A flat grid over the virtual canvas for region hit-testing.
/// Each cell lists the regions whose bounding box overlaps it, in registry order.
pub struct HitIndex<'r> {
    regions: &'r [Region],
    cells: Vec<Vec<usize>>,
}

impl<'r> HitIndex<'r> {
    pub fn build(regions: &'r [Region]) -> Self {
        let mut cells = vec![Vec::new(); GRID_COLS * GRID_ROWS];

        for (idx, region) in regions.iter().enumerate() {
            let b = &region.bounds;
            if b.x1 < 0.0 || b.y1 < 0.0 || b.x0 > VIRTUAL_WIDTH || b.y0 > VIRTUAL_HEIGHT {
                continue;
            }

            let col_start = (b.x0 / CELL_W).floor().max(0.0) as usize;
            let col_end = ((b.x1 / CELL_W).floor() as usize + 1).min(GRID_COLS);
            let row_start = (b.y0 / CELL_H).floor().max(0.0) as usize;
            let row_end = ((b.y1 / CELL_H).floor() as usize + 1).min(GRID_ROWS);

            for row in row_start..row_end {
                for col in col_start..col_end {
                    cells[row * GRID_COLS + col].push(idx);
                }
            }
        }

        Self { regions, cells }
    }

    /// Region under a virtual-canvas point. `None` off-canvas or over bare map.
    pub fn find_at(&self, p: Point) -> Option<&'r Region> {
        if !(0.0..VIRTUAL_WIDTH).contains(&p.x) || !(0.0..VIRTUAL_HEIGHT).contains(&p.y) {
            return None;
        }
        let col = (p.x / CELL_W) as usize;
        let row = (p.y / CELL_H) as usize;
        let regions = self.regions;

        self.cells
            .get(row * GRID_COLS + col)?
            .iter()
            .map(|&idx| &regions[idx])
            .find(|region| region.contains(p))
    }
}
