//! Grid model: activation flags for every cell, column consumption.

/// Rows are fixed regardless of layout.
pub const ROWS: usize = 10;

/// A cell address produced by hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

/// Result of sweeping one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnConsumption {
    /// Active cells found (and cleared) in the column.
    pub hits: usize,
    /// Every row of the column was active before the sweep.
    pub full: bool,
}

/// Row-major activation flags: index = row * columns + col.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    columns: usize,
    rows: usize,
    cells: Vec<bool>,
}

impl Grid {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![false; columns * rows],
        }
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flattened index for (row, col); `None` outside the grid.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.columns).then(|| row * self.columns + col)
    }

    /// False for positions outside the grid.
    #[inline]
    pub fn is_active(&self, row: usize, col: usize) -> bool {
        self.index(row, col).is_some_and(|i| self.cells[i])
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Mark a cell active. Panics on an out-of-range index.
    #[inline]
    pub fn activate(&mut self, index: usize) {
        self.cells[index] = true;
    }

    /// Returns false, touching nothing, when `pos` is outside the grid.
    pub fn activate_at(&mut self, pos: CellPos) -> bool {
        let Some(i) = self.index(pos.row, pos.col) else {
            return false;
        };
        self.activate(i);
        true
    }

    /// Clear every active cell in `col`, counting them.
    pub fn consume_column(&mut self, col: usize) -> ColumnConsumption {
        let mut hits = 0;
        for row in 0..self.rows {
            let Some(i) = self.index(row, col) else {
                break;
            };
            if std::mem::replace(&mut self.cells[i], false) {
                hits += 1;
            }
        }
        ColumnConsumption {
            hits,
            full: hits == self.rows,
        }
    }

    /// Empty grid with new dimensions.
    pub fn reset(&mut self, columns: usize, rows: usize) {
        self.columns = columns;
        self.rows = rows;
        self.cells.clear();
        self.cells.resize(columns * rows, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_index_is_row_major() {
        let g = Grid::new(16, ROWS);
        assert_eq!(g.index(0, 0), Some(0));
        assert_eq!(g.index(0, 15), Some(15));
        assert_eq!(g.index(1, 0), Some(16));
        assert_eq!(g.index(9, 15), Some(159));
    }

    #[test]
    fn test_out_of_range_never_aliases() {
        let mut g = Grid::new(8, ROWS);
        // (0, 9) would flatten onto (1, 1) without the bounds check.
        assert_eq!(g.index(0, 9), None);
        assert_eq!(g.index(ROWS, 0), None);
        assert!(!g.activate_at(CellPos { row: 0, col: 9 }));
        assert!(!g.activate_at(CellPos { row: ROWS, col: 0 }));
        assert_eq!(g.active_count(), 0);
        assert!(!g.is_active(1, 1));
        assert!(!g.is_active(0, 9));
        assert_eq!(g.consume_column(8), ColumnConsumption::default());
    }

    #[test]
    fn test_activate_is_idempotent() {
        let mut g = Grid::new(8, ROWS);
        g.activate(12);
        g.activate(12);
        assert_eq!(g.active_count(), 1);
        assert!(g.is_active(1, 4));
    }

    #[test]
    fn test_full_column() {
        let mut g = Grid::new(16, ROWS);
        for row in 0..ROWS {
            assert!(g.activate_at(CellPos { row, col: 3 }));
        }
        assert!(g.activate_at(CellPos { row: 0, col: 4 }));
        let c = g.consume_column(3);
        assert_eq!(c, ColumnConsumption { hits: 10, full: true });
        assert_eq!(g.active_count(), 1);
    }

    #[test]
    fn test_empty_column_is_not_full() {
        let mut g = Grid::new(8, ROWS);
        assert_eq!(g.consume_column(0), ColumnConsumption { hits: 0, full: false });
    }

    #[test]
    fn test_reset_changes_geometry() {
        let mut g = Grid::new(16, ROWS);
        g.activate(100);
        g.reset(8, ROWS);
        assert_eq!(g.columns(), 8);
        assert_eq!(g.active_count(), 0);
        // Former index 100 no longer exists.
        assert!(std::panic::catch_unwind(move || {
            let mut g = g;
            g.activate(100);
        })
        .is_err());
    }

    fn grid_strategy() -> impl Strategy<Value = (Grid, usize)> {
        prop::sample::select(vec![8usize, 16]).prop_flat_map(|cols| {
            (
                prop::collection::vec(any::<bool>(), cols * ROWS),
                0..cols,
            )
                .prop_map(move |(cells, col)| {
                    let mut g = Grid::new(cols, ROWS);
                    for (i, on) in cells.into_iter().enumerate() {
                        if on {
                            g.activate(i);
                        }
                    }
                    (g, col)
                })
        })
    }

    proptest! {
        #[test]
        fn consume_counts_and_clears_column((grid, col) in grid_strategy()) {
            let mut g = grid.clone();
            let before: usize = (0..ROWS).filter(|&r| grid.is_active(r, col)).count();
            let c = g.consume_column(col);
            prop_assert_eq!(c.hits, before);
            prop_assert_eq!(c.full, c.hits == ROWS);
            for r in 0..ROWS {
                prop_assert!(!g.is_active(r, col));
            }
            // Other columns untouched.
            for r in 0..ROWS {
                for k in (0..g.columns()).filter(|&k| k != col) {
                    prop_assert_eq!(g.is_active(r, k), grid.is_active(r, k));
                }
            }
        }
    }
}
