//! In-process mesh: every rank is a tokio task, links are channels.

use async_trait::async_trait;
use mesh_types::Envelope;

use crate::handle::SendHandle;
use crate::inbox::{Inbox, Inlet};
use crate::{Error, Payload, Rank, Tag, Transport};

/// One endpoint of an in-process mesh.
///
/// Endpoints share no state beyond the channels between them. Dropping an
/// endpoint closes its outgoing links, so peers waiting on it fail with
/// [`Error::Disconnected`] rather than hanging.
pub struct LocalTransport {
    rank: Rank,
    outlets: Vec<Inlet>,
    inbox: Inbox,
}

impl LocalTransport {
    /// Builds a fully connected mesh of `size` endpoints, indexed by rank.
    pub fn mesh(size: usize) -> Vec<LocalTransport> {
        let (inboxes, inlets): (Vec<Inbox>, Vec<Vec<Inlet>>) =
            (0..size).map(|_| Inbox::new(size)).unzip();

        // inlets[dest][src] becomes outlets[src][dest].
        let mut outlets: Vec<Vec<Inlet>> = (0..size).map(|_| Vec::with_capacity(size)).collect();
        for row in inlets {
            for (src, inlet) in row.into_iter().enumerate() {
                outlets[src].push(inlet);
            }
        }

        inboxes
            .into_iter()
            .zip(outlets)
            .enumerate()
            .map(|(rank, (inbox, outlets))| LocalTransport {
                rank,
                outlets,
                inbox,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.outlets.len()
    }

    fn post(&self, dest: Rank, tag: Tag, payload: Payload) -> SendHandle {
        let Some(outlet) = self.outlets.get(dest) else {
            return SendHandle::ready(Err(Error::UnknownRank {
                rank: dest,
                size: self.size(),
            }));
        };
        let envelope = Envelope {
            source: self.rank as u32,
            tag: tag.0,
            payload,
        };
        SendHandle::ready(
            outlet
                .send(envelope)
                .map_err(|_| Error::Disconnected { rank: dest, tag }),
        )
    }

    async fn take(&self, src: Rank, tag: Tag) -> Result<Payload, Error> {
        self.inbox.take(src, tag).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_assigns_ranks_in_order() {
        let mesh = LocalTransport::mesh(4);
        let ranks: Vec<Rank> = mesh.iter().map(|endpoint| endpoint.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
        assert!(mesh.iter().all(|endpoint| endpoint.size() == 4));
    }

    #[tokio::test]
    async fn send_to_unknown_rank_fails() {
        let mesh = LocalTransport::mesh(2);
        let result = mesh[0].send(9, Tag::new(1), vec![1]).wait().await;
        assert!(matches!(result, Err(Error::UnknownRank { rank: 9, size: 2 })));
    }

    #[tokio::test]
    async fn send_to_dropped_rank_fails() {
        let mut mesh = LocalTransport::mesh(2);
        drop(mesh.pop());
        let result = mesh[0].send(1, Tag::new(1), vec![1]).wait().await;
        assert!(matches!(result, Err(Error::Disconnected { rank: 1, .. })));
    }
}
