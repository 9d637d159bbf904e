//! Message tags and shared shape of one multiplication round.

use mesh::{Payload, Rank, Tag};

use crate::{ConfigError, Error, Matrix};

/// Rank of the coordinator; every other rank is a worker.
pub const COORDINATOR: Rank = 0;

pub const WORK_LOWER: Tag = Tag::new(1);
pub const WORK_UPPER: Tag = Tag::new(2);
pub const WORK_DATA: Tag = Tag::new(3);
pub const RESULT_LOWER: Tag = Tag::new(4);
pub const RESULT_UPPER: Tag = Tag::new(5);
pub const RESULT_DATA: Tag = Tag::new(6);

/// Operand dimensions every participant agrees on before the run:
/// A is `a_rows x a_cols`, B is `a_cols x b_cols`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub a_rows: usize,
    pub a_cols: usize,
    pub b_cols: usize,
}

impl Shape {
    pub fn new(a_rows: usize, a_cols: usize, b_cols: usize) -> Self {
        Self {
            a_rows,
            a_cols,
            b_cols,
        }
    }

    pub fn of(a: &Matrix, b: &Matrix) -> Result<Self, ConfigError> {
        if a.cols() != b.rows() {
            return Err(ConfigError::DimensionMismatch(
                a.rows(),
                a.cols(),
                b.rows(),
                b.cols(),
            ));
        }
        Ok(Self::new(a.rows(), a.cols(), b.cols()))
    }

    /// Element count of operand B.
    pub fn b_len(&self) -> usize {
        self.a_cols * self.b_cols
    }
}

/// Decodes a row bound sent as a one-element payload.
pub(crate) fn bound(payload: Payload, from: Rank, what: &str) -> Result<usize, Error> {
    match payload.as_slice() {
        [value] => usize::try_from(*value)
            .map_err(|_| Error::violation(from, format!("{} is negative: {}", what, value))),
        other => Err(Error::violation(
            from,
            format!("{} carried {} values, expected 1", what, other.len()),
        )),
    }
}

pub(crate) fn expect_len(
    payload: &Payload,
    expected: usize,
    from: Rank,
    what: &str,
) -> Result<(), Error> {
    if payload.len() != expected {
        return Err(Error::violation(
            from,
            format!("{} carried {} values, expected {}", what, payload.len(), expected),
        ));
    }
    Ok(())
}
