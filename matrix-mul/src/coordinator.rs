//! The coordinating participant, rank 0.

use std::time::{Duration, Instant};

use mesh::Transport;
use tracing::{debug, info, warn};

use crate::partition::{Partition, partition};
use crate::protocol::{
    COORDINATOR, RESULT_DATA, RESULT_LOWER, RESULT_UPPER, Shape, WORK_DATA, WORK_LOWER,
    WORK_UPPER, bound, expect_len,
};
use crate::{ConfigError, Error, Matrix};

/// The assembled product and how long the distributed part took.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub result: Matrix,
    /// From the first dispatch to the last partial result received.
    pub elapsed: Duration,
}

/// Owns the operands and the result; drives one multiplication round.
///
/// The round is strictly linear: validate, scatter row slices of A, join
/// the broadcast of B, then gather partial results in worker rank order.
pub struct Coordinator<T> {
    transport: T,
}

impl<T: Transport> Coordinator<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Computes `a x b` with every other rank of the mesh as a worker.
    ///
    /// Configuration errors are reported before anything is dispatched.
    /// On any failure the workers are told to abort so none of them is left
    /// waiting for work or for the broadcast. Running on the wrong rank is
    /// refused without touching the mesh.
    pub async fn run(&self, a: &Matrix, b: &Matrix) -> Result<Outcome, Error> {
        let rank = self.transport.rank();
        if rank != COORDINATOR {
            return Err(ConfigError::NotCoordinator(rank).into());
        }

        let outcome = self.drive(a, b).await;
        if let Err(e) = &outcome {
            warn!(error = %e, "round failed, aborting workers");
            self.transport.abort().await;
        }
        outcome
    }

    async fn drive(&self, a: &Matrix, b: &Matrix) -> Result<Outcome, Error> {
        let participants = self.transport.size();
        if participants < 2 {
            return Err(ConfigError::TooFewParticipants(participants).into());
        }
        let shape = Shape::of(a, b)?;
        let partitions = partition(shape.a_rows, participants - 1)?;

        let started = Instant::now();
        info!(workers = partitions.len(), ?shape, "dispatching row slices");
        let mut pending = Vec::with_capacity(partitions.len() * 3);
        for (worker, part) in (1..).zip(&partitions) {
            debug!(worker, lower = part.lower, upper = part.upper, "dispatch");
            pending.push(self.transport.send(worker, WORK_LOWER, vec![part.lower as i64]));
            pending.push(self.transport.send(worker, WORK_UPPER, vec![part.upper as i64]));
            let rows = a.row_block(part.range()).to_vec();
            pending.push(self.transport.send(worker, WORK_DATA, rows));
        }

        info!(len = shape.b_len(), "broadcasting operand B");
        self.transport
            .broadcast(COORDINATOR, b.as_slice().to_vec())
            .await?;
        mesh::wait_all(pending).await?;

        let mut result = Matrix::new(shape.a_rows, shape.b_cols);
        for (worker, part) in (1..).zip(&partitions) {
            let rows = self.gather(worker, part, &shape).await?;
            result.row_block_mut(part.range()).copy_from_slice(&rows);
            debug!(worker, lower = part.lower, upper = part.upper, "gathered");
        }
        let elapsed = started.elapsed();

        info!(?elapsed, "all partial results gathered");
        Ok(Outcome { result, elapsed })
    }

    /// Receives one worker's bounds and rows, checking them against what
    /// was dispatched to it.
    async fn gather(
        &self,
        worker: usize,
        part: &Partition,
        shape: &Shape,
    ) -> Result<Vec<i64>, Error> {
        let lower = self.transport.recv(worker, RESULT_LOWER).await?;
        let lower = bound(lower, worker, "result lower bound")?;
        let upper = self.transport.recv(worker, RESULT_UPPER).await?;
        let upper = bound(upper, worker, "result upper bound")?;
        if (lower, upper) != (part.lower, part.upper) {
            return Err(Error::violation(
                worker,
                format!(
                    "returned rows [{}, {}) but was assigned [{}, {})",
                    lower, upper, part.lower, part.upper
                ),
            ));
        }

        let rows = self.transport.recv(worker, RESULT_DATA).await?;
        expect_len(&rows, part.len() * shape.b_cols, worker, "result rows")?;
        Ok(rows)
    }
}
