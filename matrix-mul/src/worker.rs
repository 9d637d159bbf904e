//! A computing participant, any rank but 0.

use mesh::Transport;
use tracing::{debug, info, warn};

use crate::partition::Partition;
use crate::protocol::{
    COORDINATOR, RESULT_DATA, RESULT_LOWER, RESULT_UPPER, Shape, WORK_DATA, WORK_LOWER,
    WORK_UPPER, bound, expect_len,
};
use crate::{ConfigError, Error, Matrix};

/// Computes the product rows of one partition for the coordinator.
pub struct Worker<T> {
    transport: T,
    shape: Shape,
}

impl<T: Transport> Worker<T> {
    pub fn new(transport: T, shape: Shape) -> Self {
        Self { transport, shape }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Serves one unit of work and returns the partition it covered.
    ///
    /// Returns only after the result has reached the coordinator's mailbox.
    pub async fn serve(&self) -> Result<Partition, Error> {
        if self.transport.rank() == COORDINATOR {
            return Err(ConfigError::NotWorker.into());
        }

        let served = self.work().await;
        if let Err(e) = &served {
            if !e.is_abort() {
                warn!(rank = self.transport.rank(), error = %e, "worker failed, aborting");
                self.transport.abort().await;
            }
        }
        served
    }

    async fn work(&self) -> Result<Partition, Error> {
        let rank = self.transport.rank();
        let shape = self.shape;

        let lower = self.transport.recv(COORDINATOR, WORK_LOWER).await?;
        let lower = bound(lower, COORDINATOR, "work lower bound")?;
        let upper = self.transport.recv(COORDINATOR, WORK_UPPER).await?;
        let upper = bound(upper, COORDINATOR, "work upper bound")?;
        if lower >= upper || upper > shape.a_rows {
            return Err(Error::violation(
                COORDINATOR,
                format!("assigned rows [{}, {}) outside {} rows", lower, upper, shape.a_rows),
            ));
        }
        let part = Partition::new(lower, upper);

        let block = self.transport.recv(COORDINATOR, WORK_DATA).await?;
        expect_len(&block, part.len() * shape.a_cols, COORDINATOR, "work rows")?;
        debug!(rank, lower, upper, "work received");

        let b = self.transport.broadcast(COORDINATOR, Vec::new()).await?;
        expect_len(&b, shape.b_len(), COORDINATOR, "operand B")?;
        let b = Matrix::from_parts(shape.a_cols, shape.b_cols, b)
            .ok_or_else(|| Error::violation(COORDINATOR, "operand B does not fit its shape"))?;

        let rows = multiply_block(&block, &part, shape.a_cols, &b)?;

        let pending = [
            self.transport.send(COORDINATOR, RESULT_LOWER, vec![lower as i64]),
            self.transport.send(COORDINATOR, RESULT_UPPER, vec![upper as i64]),
            self.transport.send(COORDINATOR, RESULT_DATA, rows),
        ];
        mesh::wait_all(pending).await?;

        info!(rank, lower, upper, "partial result delivered");
        Ok(part)
    }
}

/// Multiplies the flat rows of `part` (each `cols` wide) by `b`, returning
/// flat product rows.
///
/// Output and accumulators start at zero on every call. An overflowing cell
/// is reported by its row in the full product.
pub(crate) fn multiply_block(
    block: &[i64],
    part: &Partition,
    cols: usize,
    b: &Matrix,
) -> Result<Vec<i64>, Error> {
    let width = b.cols();
    let mut out = vec![0; part.len() * width];
    for (i, row) in part.range().enumerate() {
        let a_row = &block[i * cols..(i + 1) * cols];
        for j in 0..width {
            out[i * width + j] = b
                .dot_column(a_row, j)
                .ok_or(Error::Overflow { row, col: j })?;
        }
    }
    Ok(out)
}
