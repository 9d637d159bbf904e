//! The transport contract every participant talks through.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::handle::{SendHandle, wait_all};
use crate::{Error, Payload, Rank, Tag};

/// How long [`Transport::abort`] waits for its notices to land.
const ABORT_GRACE: Duration = Duration::from_secs(2);

/// Point-to-point messaging plus one collective between a fixed set of ranks.
///
/// Backends supply the raw [`post`](Transport::post) and
/// [`take`](Transport::take); the checked [`send`](Transport::send) and
/// [`recv`](Transport::recv), [`broadcast`](Transport::broadcast) and
/// [`abort`](Transport::abort) are built on top of them.
///
/// Messages between one `(sender, receiver)` pair arrive in the order they
/// were sent. Nothing is promised across different pairs.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Rank of this participant.
    fn rank(&self) -> Rank;

    /// Number of participants, this one included.
    fn size(&self) -> usize;

    /// Issues a delivery of `payload` to `dest` without checking `tag`.
    fn post(&self, dest: Rank, tag: Tag, payload: Payload) -> SendHandle;

    /// Blocks until a message from `src` with `tag` arrives, without checking `tag`.
    async fn take(&self, src: Rank, tag: Tag) -> Result<Payload, Error>;

    /// Issues a send and returns immediately; await the handle for completion.
    fn send(&self, dest: Rank, tag: Tag, payload: Payload) -> SendHandle {
        if tag.is_reserved() {
            return SendHandle::ready(Err(Error::ReservedTag(tag)));
        }
        self.post(dest, tag, payload)
    }

    /// Blocks until the oldest message from `src` with `tag` arrives.
    async fn recv(&self, src: Rank, tag: Tag) -> Result<Payload, Error> {
        if tag.is_reserved() {
            return Err(Error::ReservedTag(tag));
        }
        self.take(src, tag).await
    }

    /// Replicates `root`'s payload to every participant.
    ///
    /// Every rank must call this once per round. No rank returns before all
    /// ranks have entered the call; on return each holds root's payload.
    /// The payload passed by a non-root rank is ignored.
    async fn broadcast(&self, root: Rank, payload: Payload) -> Result<Payload, Error> {
        let size = self.size();
        if root >= size {
            return Err(Error::UnknownRank { rank: root, size });
        }

        let me = self.rank();
        if me != root {
            let replica = self.take(root, Tag::BROADCAST).await?;
            self.post(root, Tag::BARRIER_ARRIVE, Vec::new()).wait().await?;
            self.take(root, Tag::BARRIER_RELEASE).await?;
            debug!(rank = me, root, len = replica.len(), "broadcast received");
            return Ok(replica);
        }

        let others: Vec<Rank> = (0..size).filter(|&rank| rank != root).collect();
        wait_all(
            others
                .iter()
                .map(|&rank| self.post(rank, Tag::BROADCAST, payload.clone())),
        )
        .await?;
        for &rank in &others {
            self.take(rank, Tag::BARRIER_ARRIVE).await?;
        }
        wait_all(
            others
                .iter()
                .map(|&rank| self.post(rank, Tag::BARRIER_RELEASE, Vec::new())),
        )
        .await?;
        debug!(root, len = payload.len(), peers = others.len(), "broadcast released");
        Ok(payload)
    }

    /// Tells every other rank to give up.
    ///
    /// A peer blocked on a receive from this rank fails with
    /// [`Error::Aborted`] instead of waiting forever. Delivery is best effort.
    async fn abort(&self) {
        let me = self.rank();
        let notices: Vec<(Rank, SendHandle)> = (0..self.size())
            .filter(|&rank| rank != me)
            .map(|rank| (rank, self.post(rank, Tag::ABORT, Vec::new())))
            .collect();

        for (rank, notice) in notices {
            match tokio::time::timeout(ABORT_GRACE, notice.wait()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(rank = me, peer = rank, error = %e, "abort notice failed"),
                Err(_) => warn!(rank = me, peer = rank, "abort notice timed out"),
            }
        }
    }
}
