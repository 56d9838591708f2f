//! Owned storage for the global grid and the per-worker row blocks.
//!
//! Both stores hold one contiguous row-major `f32` buffer and expose
//! bounds-checked cell access; all multi-row traffic in and out happens
//! through flattened row segments, which is exactly the shape the exchange
//! layer puts on the wire.

use ndarray::{s, Array2, ArrayView1, ArrayView2};
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("failed to allocate {elements} grid elements")]
    Allocation { elements: usize },

    #[error("{values} values do not fill a {rows}x{cols} block")]
    ShapeMismatch {
        values: usize,
        rows: usize,
        cols: usize,
    },
}

fn zeroed_buffer(elements: usize) -> Result<Vec<f32>, FieldError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(elements)
        .map_err(|_| FieldError::Allocation { elements })?;
    buffer.resize(elements, 0.0);
    Ok(buffer)
}

fn matrix_from(values: Vec<f32>, rows: usize, cols: usize) -> Result<Array2<f32>, FieldError> {
    let len = values.len();
    Array2::from_shape_vec((rows, cols), values).map_err(|_| FieldError::ShapeMismatch {
        values: len,
        rows,
        cols,
    })
}

/// The coordinator's full n x n grid. Exists whole only outside the
/// relaxation phase; during it, every row lives in exactly one worker's
/// [`LocalBlock`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    cells: Array2<f32>,
}

impl Field {
    pub fn zeroed(n: usize) -> Result<Self, FieldError> {
        let cells = matrix_from(zeroed_buffer(n * n)?, n, n)?;
        Ok(Self { cells })
    }

    /// Fill every cell independently and uniformly in `[0, max_value)`.
    /// A non-positive bound leaves the grid at zero.
    pub fn random(n: usize, max_value: f32, rng: &mut impl Rng) -> Result<Self, FieldError> {
        let mut field = Self::zeroed(n)?;
        if max_value > 0.0 {
            for cell in field.cells.iter_mut() {
                *cell = rng.gen_range(0.0..max_value);
            }
        }
        Ok(field)
    }

    /// Build a grid from a cell-wise function; used for deterministic
    /// initial data in tests.
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> f32) -> Result<Self, FieldError> {
        let mut field = Self::zeroed(n)?;
        for ((row, col), cell) in field.cells.indexed_iter_mut() {
            *cell = f(row, col);
        }
        Ok(field)
    }

    /// Grid dimension n.
    pub fn size(&self) -> usize {
        self.cells.nrows()
    }

    /// Value at (row, col). Panics if either index is out of range.
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.cells[[row, col]]
    }

    /// Overwrite the cell at (row, col). Panics if either index is out of
    /// range.
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.cells[[row, col]] = value;
    }

    /// Rows `lower..=upper` flattened row-major, as sent to a worker.
    pub fn segment(&self, lower: usize, upper: usize) -> Vec<f32> {
        self.cells.slice(s![lower..=upper, ..]).iter().copied().collect()
    }

    /// Overwrite whole rows starting at `first_row` with row-major values.
    /// Panics if the rows fall outside the grid.
    pub fn write_rows(&mut self, first_row: usize, values: &[f32]) -> Result<(), FieldError> {
        let cols = self.cells.ncols();
        if values.len() % cols != 0 {
            return Err(FieldError::ShapeMismatch {
                values: values.len(),
                rows: values.len() / cols,
                cols,
            });
        }
        let rows = values.len() / cols;
        if rows == 0 {
            return Ok(());
        }
        let incoming =
            ArrayView2::from_shape((rows, cols), values).map_err(|_| FieldError::ShapeMismatch {
                values: values.len(),
                rows,
                cols,
            })?;
        self.cells
            .slice_mut(s![first_row..first_row + rows, ..])
            .assign(&incoming);
        Ok(())
    }

    pub fn cells(&self) -> ArrayView2<'_, f32> {
        self.cells.view()
    }
}

/// One worker's contiguous row block, halo rows included. The first and
/// last row of a non-edge worker's block are read-only mirrors of the
/// neighbouring partitions' boundary interior rows.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalBlock {
    cells: Array2<f32>,
}

impl LocalBlock {
    pub fn zeroed(rows: usize, cols: usize) -> Result<Self, FieldError> {
        let cells = matrix_from(zeroed_buffer(rows * cols)?, rows, cols)?;
        Ok(Self { cells })
    }

    /// Adopt a received row segment as this worker's block.
    pub fn from_rows(values: Vec<f32>, rows: usize, cols: usize) -> Result<Self, FieldError> {
        Ok(Self {
            cells: matrix_from(values, rows, cols)?,
        })
    }

    pub fn rows(&self) -> usize {
        self.cells.nrows()
    }

    pub fn cols(&self) -> usize {
        self.cells.ncols()
    }

    /// Value at (row, col). Panics if either index is out of range.
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.cells[[row, col]]
    }

    /// Overwrite the cell at (row, col). Panics if either index is out of
    /// range.
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.cells[[row, col]] = value;
    }

    /// A whole row as an owned vector, in wire shape.
    pub fn row_values(&self, row: usize) -> Vec<f32> {
        self.cells.row(row).to_vec()
    }

    /// Overwrite a whole row; this is how refreshed halo rows land.
    pub fn write_row(&mut self, row: usize, values: &[f32]) -> Result<(), FieldError> {
        if values.len() != self.cols() {
            return Err(FieldError::ShapeMismatch {
                values: values.len(),
                rows: 1,
                cols: self.cols(),
            });
        }
        self.cells.row_mut(row).assign(&ArrayView1::from(values));
        Ok(())
    }

    /// The block without its first and last row, flattened row-major: the
    /// rows a worker hands back to the coordinator.
    pub fn interior_values(&self) -> Vec<f32> {
        if self.rows() < 3 {
            return Vec::new();
        }
        self.cells
            .slice(s![1..self.rows() - 1, ..])
            .iter()
            .copied()
            .collect()
    }

    /// Overwrite this block's cells with another block's.
    pub fn copy_from(&mut self, other: &LocalBlock) {
        self.cells.assign(&other.cells);
    }

    /// Swap the storage of two equally-shaped blocks.
    pub fn swap_cells(&mut self, other: &mut LocalBlock) {
        std::mem::swap(&mut self.cells, &mut other.cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ramp(rows: usize, cols: usize) -> Vec<f32> {
        (0..rows * cols).map(|i| i as f32).collect()
    }

    #[test]
    fn test_zeroed_field_dimensions() {
        let field = Field::zeroed(5).expect("allocation");
        assert_eq!(field.size(), 5);
        assert_eq!(field.at(4, 4), 0.0);
    }

    #[test]
    fn test_random_values_stay_within_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let field = Field::random(8, 100.0, &mut rng).expect("allocation");
        assert!(field.cells().iter().all(|&v| (0.0..100.0).contains(&v)));
    }

    #[test]
    fn test_random_is_deterministic_under_a_seed() {
        let mut first = StdRng::seed_from_u64(42);
        let mut second = StdRng::seed_from_u64(42);
        let a = Field::random(6, 50.0, &mut first).expect("allocation");
        let b = Field::random(6, 50.0, &mut second).expect("allocation");
        assert_eq!(a, b);
    }

    #[test]
    fn test_segment_round_trips_through_write_rows() {
        let source = Field::from_fn(6, |row, col| (row * 6 + col) as f32).expect("allocation");
        let segment = source.segment(2, 4);
        assert_eq!(segment.len(), 3 * 6);

        let mut target = Field::zeroed(6).expect("allocation");
        target.write_rows(2, &segment).expect("segment fits");
        for row in 2..=4 {
            for col in 0..6 {
                assert_eq!(target.at(row, col), source.at(row, col));
            }
        }
    }

    #[test]
    fn test_write_rows_rejects_ragged_segments() {
        let mut field = Field::zeroed(4).expect("allocation");
        let err = field.write_rows(0, &[1.0; 6]).unwrap_err();
        assert!(matches!(err, FieldError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_from_rows_rejects_wrong_element_count() {
        let err = LocalBlock::from_rows(vec![0.0; 5], 2, 3).unwrap_err();
        assert_eq!(
            err,
            FieldError::ShapeMismatch {
                values: 5,
                rows: 2,
                cols: 3
            }
        );
    }

    #[test]
    fn test_interior_values_strip_edge_rows() {
        let block = LocalBlock::from_rows(ramp(4, 3), 4, 3).expect("shape");
        assert_eq!(block.interior_values(), ramp(4, 3)[3..9].to_vec());
    }

    #[test]
    fn test_write_row_replaces_a_halo_row() {
        let mut block = LocalBlock::zeroed(3, 3).expect("allocation");
        block.write_row(0, &[1.0, 2.0, 3.0]).expect("row fits");
        assert_eq!(block.row_values(0), vec![1.0, 2.0, 3.0]);
        assert!(block.write_row(0, &[1.0]).is_err());
    }
}
