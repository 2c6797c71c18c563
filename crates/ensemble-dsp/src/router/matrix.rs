//! Boolean source × destination patch grid.

use serde::{Deserialize, Serialize};

/// Which sources feed which destinations. Rows are sources, columns are
/// destinations. Out-of-range queries read as unpatched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatrixState {
    rows: usize,
    columns: usize,
    cells: Vec<bool>,
}

impl MatrixState {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![false; rows * columns],
        }
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.columns
    }

    #[inline]
    fn offset(&self, row: usize, column: usize) -> Option<usize> {
        (row < self.rows && column < self.columns).then_some(row * self.columns + column)
    }

    pub fn is_connected(&self, row: usize, column: usize) -> bool {
        self.offset(row, column).is_some_and(|i| self.cells[i])
    }

    /// Returns false when out of range.
    pub fn set(&mut self, row: usize, column: usize, connected: bool) -> bool {
        match self.offset(row, column) {
            Some(i) => {
                self.cells[i] = connected;
                true
            }
            None => false,
        }
    }

    pub fn connect(&mut self, row: usize, column: usize) -> bool {
        self.set(row, column, true)
    }

    pub fn disconnect(&mut self, row: usize, column: usize) -> bool {
        self.set(row, column, false)
    }

    pub fn toggle(&mut self, row: usize, column: usize) -> bool {
        let connected = !self.is_connected(row, column);
        self.set(row, column, connected)
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    pub fn num_connections(&self) -> usize {
        self.cells.iter().filter(|cell| **cell).count()
    }

    /// Change dimensions, keeping the overlapping region.
    pub fn resize(&mut self, rows: usize, columns: usize) {
        if rows == self.rows && columns == self.columns {
            return;
        }
        let mut resized = Self::new(rows, columns);
        resized.copy_overlapping(self);
        *self = resized;
    }

    /// Copy `other` into this matrix without changing dimensions. Cells
    /// outside `other` are cleared. Does not allocate.
    pub fn copy_overlapping(&mut self, other: &MatrixState) {
        for row in 0..self.rows {
            for column in 0..self.columns {
                let i = row * self.columns + column;
                self.cells[i] = other.is_connected(row, column);
            }
        }
    }

    /// Every connected `(row, column)` pair in row-major order.
    pub fn connections(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let columns = self.columns.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell)
            .map(move |(i, _)| (i / columns, i % columns))
    }
}
