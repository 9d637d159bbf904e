//! Row-space partitioning across workers.

use std::ops::Range;

use crate::ConfigError;

/// Half-open row range `[lower, upper)` owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub lower: usize,
    pub upper: usize,
}

impl Partition {
    pub fn new(lower: usize, upper: usize) -> Self {
        Self { lower, upper }
    }

    pub fn len(&self) -> usize {
        self.upper - self.lower
    }

    pub fn is_empty(&self) -> bool {
        self.upper <= self.lower
    }

    pub fn range(&self) -> Range<usize> {
        self.lower..self.upper
    }
}

/// Splits `rows` into one contiguous range per worker, in worker order.
///
/// Every worker gets `rows / workers` rows; when that does not divide evenly
/// the last worker takes the whole remainder on top of its share.
///
/// ```
/// use matrix_mul::{Partition, partition};
///
/// let parts = partition(5, 4).unwrap();
/// assert_eq!(parts[3], Partition::new(3, 5));
/// ```
pub fn partition(rows: usize, workers: usize) -> Result<Vec<Partition>, ConfigError> {
    if workers == 0 {
        return Err(ConfigError::NoWorkers);
    }
    if rows < workers {
        return Err(ConfigError::MoreWorkersThanRows { rows, workers });
    }

    let portion = rows / workers;
    let parts = (1..=workers)
        .map(|worker| {
            let lower = (worker - 1) * portion;
            let upper = if worker == workers && rows % workers != 0 {
                rows
            } else {
                lower + portion
            };
            Partition { lower, upper }
        })
        .collect();
    Ok(parts)
}
