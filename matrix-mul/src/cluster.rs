//! Runs a whole round inside one process over an in-process mesh.

use mesh::LocalTransport;

use crate::coordinator::{Coordinator, Outcome};
use crate::partition::Partition;
use crate::protocol::Shape;
use crate::worker::Worker;
use crate::{ConfigError, Error, Matrix};

/// What every participant of a local round ended with.
#[derive(Debug)]
pub struct LocalRun {
    pub outcome: Result<Outcome, Error>,
    /// One entry per worker, in rank order starting at rank 1.
    pub workers: Vec<Result<Partition, Error>>,
}

/// Multiplies `a x b` with `participants` ranks, each its own tokio task.
///
/// Workers learn the operand shape from `a` and `b` up front, the way
/// separately launched processes would from their configuration.
pub async fn run_local(a: &Matrix, b: &Matrix, participants: usize) -> LocalRun {
    let shape = Shape::new(a.rows(), a.cols(), b.cols());
    let mut endpoints = LocalTransport::mesh(participants).into_iter();
    let Some(root) = endpoints.next() else {
        return LocalRun {
            outcome: Err(ConfigError::TooFewParticipants(participants).into()),
            workers: Vec::new(),
        };
    };

    let tasks: Vec<_> = endpoints
        .map(|endpoint| {
            tokio::spawn(async move { Worker::new(endpoint, shape).serve().await })
        })
        .collect();

    let coordinator = Coordinator::new(root);
    let outcome = coordinator.run(a, b).await;
    let mut workers = Vec::with_capacity(tasks.len());
    for task in tasks {
        workers.push(task.await.map_err(Error::from).and_then(|served| served));
    }

    LocalRun { outcome, workers }
}
