//! Dense row-major integer matrices.

use std::fmt;
use std::ops::Range;

use rand::Rng;

use crate::{ConfigError, Error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<i64>,
}

impl Matrix {
    /// A `rows x cols` matrix of zeros.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> i64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    pub fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self, ConfigError> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return Err(ConfigError::RaggedRows);
        }
        let height = rows.len();
        let data = rows.into_iter().flatten().collect();
        Ok(Self {
            rows: height,
            cols,
            data,
        })
    }

    /// Wraps flat row-major data, `None` if the length does not fit.
    pub(crate) fn from_parts(rows: usize, cols: usize, data: Vec<i64>) -> Option<Self> {
        (data.len() == rows * cols).then_some(Self { rows, cols, data })
    }

    /// The reference operands: `m[i][j] = i + j`.
    pub fn index_sum(rows: usize, cols: usize) -> Self {
        Self::from_fn(rows, cols, |i, j| (i + j) as i64)
    }

    /// Small random entries in `-9..=9`.
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Self {
        Self::from_fn(rows, cols, |_, _| rng.gen_range(-9..=9))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, i: usize, j: usize) -> i64 {
        self.data[i * self.cols + j]
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.data
    }

    /// The flat data of rows `range`.
    pub fn row_block(&self, range: Range<usize>) -> &[i64] {
        &self.data[range.start * self.cols..range.end * self.cols]
    }

    pub fn row_block_mut(&mut self, range: Range<usize>) -> &mut [i64] {
        &mut self.data[range.start * self.cols..range.end * self.cols]
    }

    /// Single-process product, the model every distributed run must match.
    ///
    /// Fails with [`Error::Overflow`] on the first cell that leaves `i64`.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix, Error> {
        if self.cols != other.rows {
            return Err(ConfigError::DimensionMismatch(
                self.rows, self.cols, other.rows, other.cols,
            )
            .into());
        }

        let mut product = Matrix::new(self.rows, other.cols);
        for i in 0..self.rows {
            let row = self.row_block(i..i + 1);
            for j in 0..other.cols {
                product.data[i * other.cols + j] =
                    other.dot_column(row, j).ok_or(Error::Overflow { row: i, col: j })?;
            }
        }
        Ok(product)
    }

    /// `row . self[.., j]`, or `None` if any step overflows.
    pub(crate) fn dot_column(&self, row: &[i64], j: usize) -> Option<i64> {
        row.iter()
            .enumerate()
            .try_fold(0i64, |acc, (k, a)| a.checked_mul(self.get(k, j))?.checked_add(acc))
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "{:4}", self.get(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
