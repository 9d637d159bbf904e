//! Error types for mesh operations.

use thiserror::Error;

use crate::Tag;

#[derive(Debug, Error)]
pub enum Error {
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("gRPC status error: {0}")]
    Status(#[from] tonic::Status),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rank {rank} disconnected while a receive on {tag} was pending")]
    Disconnected { rank: usize, tag: Tag },

    #[error("rank {rank} aborted the computation")]
    Aborted { rank: usize },

    #[error("rank {rank} is outside a mesh of {size} participants")]
    UnknownRank { rank: usize, size: usize },

    #[error("{0} is reserved for collectives")]
    ReservedTag(Tag),

    #[error("connection closed")]
    ConnectionClosed,
}
