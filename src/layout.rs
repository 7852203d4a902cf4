//! Column count from viewport width, and where the grid sits on screen.

use crate::grid::CellPos;

/// Viewport widths below this get the narrow grid.
pub const BREAKPOINT: u32 = 640;
pub const NARROW_COLUMNS: usize = 8;
pub const WIDE_COLUMNS: usize = 16;
/// Assumed pixel width of one terminal column.
pub const CELL_PX: u32 = 8;

pub fn columns_for_width(viewport_width: u32, breakpoint: u32) -> usize {
    if viewport_width < breakpoint {
        NARROW_COLUMNS
    } else {
        WIDE_COLUMNS
    }
}

/// Tracks the derived column count across resizes.
#[derive(Debug, Clone)]
pub struct LayoutAdapter {
    breakpoint: u32,
    cell_px: u32,
    columns: usize,
}

impl LayoutAdapter {
    pub fn new(breakpoint: u32, cell_px: u32, term_cols: u16) -> Self {
        let mut adapter = Self {
            breakpoint,
            cell_px,
            columns: 0,
        };
        adapter.columns = adapter.derive(term_cols);
        adapter
    }

    fn derive(&self, term_cols: u16) -> usize {
        columns_for_width(u32::from(term_cols) * self.cell_px, self.breakpoint)
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// New terminal width. `Some(columns)` only when the column count changed.
    pub fn observe(&mut self, term_cols: u16) -> Option<usize> {
        let columns = self.derive(term_cols);
        if columns == self.columns {
            return None;
        }
        self.columns = columns;
        Some(columns)
    }
}

/// Placement of the rendered grid in terminal coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridGeometry {
    pub x: u16,
    pub y: u16,
    pub cell_w: u16,
    pub cell_h: u16,
    pub gap_x: u16,
    pub gap_y: u16,
    pub columns: u16,
    pub rows: u16,
    /// Exclusive right and bottom edges of the rect the grid was fitted into.
    pub right: u16,
    pub bottom: u16,
}

impl GridGeometry {
    /// Largest cells that fit in the rect, grid centred. One-column gaps between cells,
    /// one-row gaps when the height allows two lines per row. A rect too small for the
    /// grid clips it; clipped cells are not hit.
    pub fn fit(x: u16, y: u16, width: u16, height: u16, columns: usize, rows: usize) -> Self {
        let (columns, rows) = (columns as u16, rows as u16);
        if columns == 0 || rows == 0 {
            return Self::default();
        }
        let gap_x = 1;
        let gap_y = u16::from(height >= rows * 2);
        let cell_w = (width.saturating_add(gap_x) / columns).saturating_sub(gap_x).max(1);
        let cell_h = (height.saturating_add(gap_y) / rows).saturating_sub(gap_y).max(1);
        let used_w = columns * cell_w + (columns - 1) * gap_x;
        let used_h = rows * cell_h + (rows - 1) * gap_y;
        Self {
            x: x + width.saturating_sub(used_w) / 2,
            y: y + height.saturating_sub(used_h) / 2,
            cell_w,
            cell_h,
            gap_x,
            gap_y,
            columns,
            rows,
            right: x.saturating_add(width),
            bottom: y.saturating_add(height),
        }
    }

    /// Top-left corner of a cell.
    pub fn cell_origin(&self, pos: CellPos) -> (u16, u16) {
        (
            self.x + pos.col as u16 * (self.cell_w + self.gap_x),
            self.y + pos.row as u16 * (self.cell_h + self.gap_y),
        )
    }

    /// Cell under a terminal position; `None` outside the grid or on a gap.
    pub fn cell_at(&self, px: u16, py: u16) -> Option<CellPos> {
        if px >= self.right || py >= self.bottom {
            return None;
        }
        let col = axis_hit(px, self.x, self.cell_w, self.gap_x, self.columns)?;
        let row = axis_hit(py, self.y, self.cell_h, self.gap_y, self.rows)?;
        Some(CellPos { row, col })
    }
}

fn axis_hit(p: u16, origin: u16, size: u16, gap: u16, count: u16) -> Option<usize> {
    let offset = p.checked_sub(origin)?;
    let pitch = size + gap;
    if pitch == 0 {
        return None;
    }
    let i = offset / pitch;
    (i < count && offset % pitch < size).then_some(i as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_breakpoint() {
        assert_eq!(columns_for_width(639, BREAKPOINT), 8);
        assert_eq!(columns_for_width(640, BREAKPOINT), 16);
        assert_eq!(columns_for_width(0, BREAKPOINT), 8);
    }

    #[test]
    fn test_terminal_width_maps_through_cell_px() {
        // 80 columns * 8 px = 640.
        assert_eq!(LayoutAdapter::new(BREAKPOINT, CELL_PX, 80).columns(), 16);
        assert_eq!(LayoutAdapter::new(BREAKPOINT, CELL_PX, 79).columns(), 8);
    }

    #[test]
    fn test_observe_reports_only_changes() {
        let mut a = LayoutAdapter::new(BREAKPOINT, CELL_PX, 120);
        assert_eq!(a.observe(100), None);
        assert_eq!(a.observe(60), Some(8));
        assert_eq!(a.observe(50), None);
        assert_eq!(a.observe(80), Some(16));
    }

    #[test]
    fn test_fit_wide() {
        // 16 cols in 64 wide: pitch 4, cell 3. 10 rows in 20 high: pitch 2, cell 1.
        let g = GridGeometry::fit(2, 5, 64, 20, 16, 10);
        assert_eq!((g.cell_w, g.gap_x, g.cell_h, g.gap_y), (3, 1, 1, 1));
        assert_eq!((g.x, g.y), (2, 5));
    }

    #[test]
    fn test_fit_short_area_drops_row_gap() {
        let g = GridGeometry::fit(0, 0, 40, 12, 8, 10);
        assert_eq!(g.gap_y, 0);
        assert_eq!(g.cell_h, 1);
        assert_eq!(g.y, 1);
    }

    #[test]
    fn test_hit_cells_and_gaps() {
        let g = GridGeometry::fit(0, 0, 63, 20, 16, 10);
        assert_eq!(g.cell_at(0, 0), Some(CellPos { row: 0, col: 0 }));
        assert_eq!(g.cell_at(2, 0), Some(CellPos { row: 0, col: 0 }));
        // Column gap.
        assert_eq!(g.cell_at(3, 0), None);
        assert_eq!(g.cell_at(4, 0), Some(CellPos { row: 0, col: 1 }));
        // Row gap.
        assert_eq!(g.cell_at(0, 1), None);
        assert_eq!(g.cell_at(0, 2), Some(CellPos { row: 1, col: 0 }));
        assert_eq!(g.cell_at(62, 18), Some(CellPos { row: 9, col: 15 }));
        assert_eq!(g.cell_at(63, 18), None);
        // Below the last row.
        assert_eq!(g.cell_at(0, 19), None);
    }

    #[test]
    fn test_hit_before_origin() {
        let g = GridGeometry::fit(10, 10, 63, 20, 16, 10);
        assert_eq!(g.cell_at(9, 10), None);
        assert_eq!(g.cell_at(10, 9), None);
        assert_eq!(g.cell_at(10, 10), Some(CellPos { row: 0, col: 0 }));
    }

    #[test]
    fn test_clipped_rows_are_not_hit() {
        // Three lines for ten rows: rows 3.. fall past the rect bottom (y = 8).
        let g = GridGeometry::fit(1, 5, 28, 3, 8, 10);
        assert_eq!(g.cell_at(g.x, 5), Some(CellPos { row: 0, col: 0 }));
        assert_eq!(g.cell_at(g.x, 7), Some(CellPos { row: 2, col: 0 }));
        assert_eq!(g.cell_at(g.x, 8), None);
        assert_eq!(g.cell_at(g.x, 9), None);
    }

    #[test]
    fn test_clipped_columns_are_not_hit() {
        // 16 one-wide cells need 31 columns; only 20 are available.
        let g = GridGeometry::fit(0, 0, 20, 20, 16, 10);
        assert_eq!(g.cell_at(18, 0), Some(CellPos { row: 0, col: 9 }));
        assert_eq!(g.cell_at(20, 0), None);
        assert_eq!(g.cell_at(30, 0), None);
    }

    #[test]
    fn test_default_geometry_hits_nothing() {
        assert_eq!(GridGeometry::default().cell_at(0, 0), None);
    }

    proptest! {
        #[test]
        fn every_cell_origin_hits_its_cell(
            // Narrowest width that holds 16 one-wide cells and their gaps.
            w in 31u16..200,
            h in 10u16..60,
            wide in any::<bool>(),
        ) {
            let columns = if wide { WIDE_COLUMNS } else { NARROW_COLUMNS };
            let g = GridGeometry::fit(3, 1, w, h, columns, 10);
            for row in 0..10 {
                for col in 0..columns {
                    let pos = CellPos { row, col };
                    let (x, y) = g.cell_origin(pos);
                    prop_assert_eq!(g.cell_at(x, y), Some(pos));
                    prop_assert_eq!(g.cell_at(x + g.cell_w - 1, y + g.cell_h - 1), Some(pos));
                }
            }
        }
    }
}
