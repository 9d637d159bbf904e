//! Multi-process mesh: each rank hosts a gRPC mailbox and dials its peers.

use async_trait::async_trait;
use mesh_types::Envelope;
use mesh_types::mailbox::mailbox_client::MailboxClient;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Endpoint, Server};
use tracing::{error, info};

use crate::handle::SendHandle;
use crate::inbox::Inbox;
use crate::outbox::{DeliveryPolicy, Outbox, Outgoing};
use crate::service::create_server;
use crate::{Error, Payload, Rank, Tag, Transport};

/// A mesh endpoint that talks to its peers over gRPC.
///
/// Every participant runs a `Mailbox` service on its own address; sending
/// to a rank is a `Deliver` call against that rank's service. Each peer is
/// served by a single outbox task, so messages to one peer leave in the
/// order they were issued and a [`SendHandle`] resolves once the peer's
/// service has queued the message.
///
/// # Example
///
/// ```no_run
/// use mesh::{DeliveryPolicy, GrpcTransport, Tag, Transport};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let peers = vec!["127.0.0.1:7000".into(), "127.0.0.1:7001".into()];
///     let mesh = GrpcTransport::bind(0, peers, DeliveryPolicy::default()).await?;
///
///     mesh.send(1, Tag::new(1), vec![42]).wait().await?;
///     let reply = mesh.recv(1, Tag::new(2)).await?;
///     println!("{:?}", reply);
///     Ok(())
/// }
/// ```
pub struct GrpcTransport {
    rank: Rank,
    outboxes: Vec<mpsc::UnboundedSender<Outgoing>>,
    inbox: Inbox,
    tasks: Vec<JoinHandle<()>>,
}

impl GrpcTransport {
    /// Binds `peers[rank]` and connects to every peer.
    ///
    /// Peers are dialled lazily; messages to a peer that is still starting
    /// are retried according to `policy`.
    pub async fn bind(
        rank: Rank,
        peers: Vec<PeerAddr>,
        policy: DeliveryPolicy,
    ) -> Result<Self, Error> {
        let addr = peers.get(rank).ok_or(Error::UnknownRank {
            rank,
            size: peers.len(),
        })?;
        let listener = TcpListener::bind(addr.0.as_str()).await?;
        Self::from_listener(rank, listener, peers, policy)
    }

    /// Like [`bind`](Self::bind) but serves on an already bound listener.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_listener(
        rank: Rank,
        listener: TcpListener,
        peers: Vec<PeerAddr>,
        policy: DeliveryPolicy,
    ) -> Result<Self, Error> {
        let size = peers.len();
        if rank >= size {
            return Err(Error::UnknownRank { rank, size });
        }

        let local = listener.local_addr()?;
        let (inbox, inlets) = Inbox::new(size);
        let server = create_server(inlets);
        let mut tasks = Vec::with_capacity(size + 1);
        tasks.push(tokio::spawn(async move {
            let incoming = TcpListenerStream::new(listener);
            if let Err(e) = Server::builder()
                .add_service(server)
                .serve_with_incoming(incoming)
                .await
            {
                error!(rank, error = %e, "mailbox server stopped");
            }
        }));

        let mut outboxes = Vec::with_capacity(size);
        for (dest, peer) in peers.iter().enumerate() {
            let channel = Endpoint::from_shared(format!("http://{}", peer.0))?.connect_lazy();
            let (tx, rx) = mpsc::unbounded_channel();
            let outbox = Outbox::new(dest, MailboxClient::new(channel), rx, policy.clone());
            tasks.push(tokio::spawn(outbox.run()));
            outboxes.push(tx);
        }

        info!(rank, size, %local, "mesh endpoint listening");
        Ok(Self {
            rank,
            outboxes,
            inbox,
            tasks,
        })
    }
}

impl Drop for GrpcTransport {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[async_trait]
impl Transport for GrpcTransport {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn post(&self, dest: Rank, tag: Tag, payload: Payload) -> SendHandle {
        let Some(outbox) = self.outboxes.get(dest) else {
            return SendHandle::ready(Err(Error::UnknownRank {
                rank: dest,
                size: self.size(),
            }));
        };

        let (done, handle) = SendHandle::pending();
        let outgoing = Outgoing {
            envelope: Envelope {
                source: self.rank as u32,
                tag: tag.0,
                payload,
            },
            done,
        };
        if let Err(mpsc::error::SendError(outgoing)) = outbox.send(outgoing) {
            let _ = outgoing.done.send(Err(Error::ConnectionClosed));
        }
        handle
    }

    async fn take(&self, src: Rank, tag: Tag) -> Result<Payload, Error> {
        self.inbox.take(src, tag).await
    }
}

/// Address of a participant's mailbox, `host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddr(pub String);

impl From<String> for PeerAddr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PeerAddr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
