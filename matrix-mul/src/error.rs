//! Error types for matrix-mul operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] mesh::Error),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("protocol violation by rank {rank}: {detail}")]
    ProtocolViolation { rank: usize, detail: String },

    #[error("product cell ({row}, {col}) overflows i64")]
    Overflow { row: usize, col: usize },

    #[error("participant task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Problems detected before any work is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("need at least 2 participants (1 coordinator + 1 worker), got {0}")]
    TooFewParticipants(usize),

    #[error("cannot partition rows across zero workers")]
    NoWorkers,

    #[error("cannot split {rows} rows across {workers} workers")]
    MoreWorkersThanRows { rows: usize, workers: usize },

    #[error("matrix dimension mismatch: A is {0}x{1}, B is {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),

    #[error("matrix rows have unequal lengths")]
    RaggedRows,

    #[error("rank {0} cannot coordinate, the coordinator is rank 0")]
    NotCoordinator(usize),

    #[error("rank 0 is the coordinator and cannot serve as a worker")]
    NotWorker,

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid value {value:?} for {name}")]
    InvalidArgument { name: &'static str, value: String },

    #[error("unknown mode: {0}")]
    UnknownMode(String),
}

impl Error {
    pub(crate) fn violation(rank: usize, detail: impl Into<String>) -> Self {
        Error::ProtocolViolation {
            rank,
            detail: detail.into(),
        }
    }

    /// True when this participant failed because a peer aborted.
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Transport(mesh::Error::Aborted { .. }))
    }
}
