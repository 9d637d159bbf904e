//! Message passing between a fixed set of cooperating ranks.
//!
//! `mesh` gives every participant a [`Transport`]: non-blocking sends that
//! hand back a [`SendHandle`], blocking receives matched by source rank and
//! [`Tag`], and a synchronous [`broadcast`](Transport::broadcast) that doubles
//! as the barrier of the computation.
//!
//! # Backends
//!
//! - [`LocalTransport`]: every rank is a tokio task in one process, links are
//!   channels.
//! - [`GrpcTransport`]: one rank per OS process, each hosting a tonic
//!   `Mailbox` service.
//!
//! # Example
//!
//! ```
//! use mesh::{LocalTransport, Tag, Transport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mesh::Error> {
//!     let mut ranks = LocalTransport::mesh(2);
//!     let worker = ranks.pop().unwrap();
//!     let root = ranks.pop().unwrap();
//!
//!     let echo = tokio::spawn(async move {
//!         let shared = worker.broadcast(0, Vec::new()).await?;
//!         worker.send(0, Tag::new(1), shared).wait().await
//!     });
//!
//!     root.broadcast(0, vec![1, 2, 3]).await?;
//!     assert_eq!(root.recv(1, Tag::new(1)).await?, vec![1, 2, 3]);
//!     echo.await.unwrap()?;
//!     Ok(())
//! }
//! ```

mod error;
mod grpc;
mod handle;
mod inbox;
mod local;
mod outbox;
mod service;
mod tag;
mod transport;

pub use error::Error;
pub use grpc::{GrpcTransport, PeerAddr};
pub use handle::{SendHandle, wait_all};
pub use local::LocalTransport;
pub use outbox::DeliveryPolicy;
pub use service::MAX_MESSAGE_SIZE;
pub use tag::Tag;
pub use transport::Transport;

/// Position of a participant in the mesh, `0..size`.
pub type Rank = usize;

/// Message body: a scalar travels as one element, matrix rows as flat data.
pub type Payload = Vec<i64>;
