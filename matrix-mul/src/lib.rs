//! Distributed matrix multiplication over a coordinator/worker mesh.
//!
//! `matrix-mul` computes `C = A x B` across a fixed set of participants.
//! Rank 0 is the [`Coordinator`]: it splits the rows of A with [`partition`],
//! sends each [`Worker`] its row slice, broadcasts B to everybody and then
//! gathers the partial products into C. Participants share no memory; all
//! coordination goes through a [`mesh::Transport`].
//!
//! # Message flow
//!
//! - coordinator to worker `i`: `WORK_LOWER`, `WORK_UPPER`, `WORK_DATA`
//! - everybody: one broadcast of B rooted at rank 0
//! - worker `i` to coordinator: `RESULT_LOWER`, `RESULT_UPPER`, `RESULT_DATA`
//!
//! # Example
//!
//! ```
//! use matrix_mul::{Matrix, run_local};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), matrix_mul::Error> {
//!     let a = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]])?;
//!     let b = Matrix::from_rows(vec![vec![5, 6], vec![7, 8]])?;
//!
//!     let run = run_local(&a, &b, 3).await;
//!     let outcome = run.outcome?;
//!
//!     assert_eq!(outcome.result, Matrix::from_rows(vec![vec![19, 22], vec![43, 50]])?);
//!     Ok(())
//! }
//! ```

mod cluster;
mod config;
mod coordinator;
mod error;
mod matrix;
mod partition;
mod protocol;
mod worker;

pub use cluster::{LocalRun, run_local};
pub use config::{Config, Mode, USAGE};
pub use coordinator::{Coordinator, Outcome};
pub use error::{ConfigError, Error};
pub use matrix::Matrix;
pub use partition::{Partition, partition};
pub use protocol::{
    COORDINATOR, RESULT_DATA, RESULT_LOWER, RESULT_UPPER, Shape, WORK_DATA, WORK_LOWER,
    WORK_UPPER,
};
pub use worker::Worker;
