//! Per-rank inbox that matches receives by source and tag.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex as SyncMutex, MutexGuard, PoisonError};

use mesh_types::Envelope;
use tokio::sync::{Mutex, Notify, mpsc};

use crate::{Error, Payload, Rank, Tag};

/// Sending half of one link into an inbox.
pub type Inlet = mpsc::UnboundedSender<Envelope>;

/// Incoming messages of one participant, one ordered link per source rank.
///
/// Envelopes pulled off a link are filed under their tag and handed out,
/// oldest first, to the receive asking for that tag. Only one receive pulls
/// from a link at a time; the others wait to be told that something was
/// filed. A receive for one tag never holds up a receive for another.
pub struct Inbox {
    links: Vec<Link>,
}

struct Link {
    rx: Mutex<mpsc::UnboundedReceiver<Envelope>>,
    mail: SyncMutex<Mail>,
    filed: Notify,
}

impl Link {
    /// Never held across an await, so a pulled envelope is filed even if
    /// the receive that pulled it is cancelled right after.
    fn mail(&self) -> MutexGuard<'_, Mail> {
        self.mail.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Default)]
struct Mail {
    parked: HashMap<Tag, VecDeque<Payload>>,
    aborted: bool,
    closed: bool,
}

impl Mail {
    fn claim(&mut self, src: Rank, tag: Tag) -> Option<Result<Payload, Error>> {
        if self.aborted {
            return Some(Err(Error::Aborted { rank: src }));
        }
        if let Some(queue) = self.parked.get_mut(&tag) {
            let payload = queue.pop_front();
            if queue.is_empty() {
                self.parked.remove(&tag);
            }
            if let Some(payload) = payload {
                return Some(Ok(payload));
            }
        }
        if self.closed {
            return Some(Err(Error::Disconnected { rank: src, tag }));
        }
        None
    }

    fn file(&mut self, envelope: Option<Envelope>) {
        match envelope {
            None => self.closed = true,
            Some(envelope) if Tag(envelope.tag) == Tag::ABORT => self.aborted = true,
            Some(envelope) => self
                .parked
                .entry(Tag(envelope.tag))
                .or_default()
                .push_back(envelope.payload),
        }
    }
}

impl Inbox {
    /// Creates an inbox for a mesh of `size` ranks together with the inlet
    /// each source rank writes into, indexed by source rank.
    pub fn new(size: usize) -> (Self, Vec<Inlet>) {
        let (inlets, links) = (0..size)
            .map(|_| {
                let (tx, rx) = mpsc::unbounded_channel();
                let link = Link {
                    rx: Mutex::new(rx),
                    mail: SyncMutex::new(Mail::default()),
                    filed: Notify::new(),
                };
                (tx, link)
            })
            .unzip();
        (Self { links }, inlets)
    }

    /// Waits for the oldest message from `src` carrying `tag`.
    ///
    /// Fails with [`Error::Aborted`] once `src` has sent an abort, and with
    /// [`Error::Disconnected`] when the link closes with nothing left for `tag`.
    pub async fn take(&self, src: Rank, tag: Tag) -> Result<Payload, Error> {
        let link = self.links.get(src).ok_or(Error::UnknownRank {
            rank: src,
            size: self.links.len(),
        })?;

        loop {
            // Registered before looking, so a filing in between is not missed.
            let filed = link.filed.notified();
            tokio::pin!(filed);
            filed.as_mut().enable();

            let claimed = link.mail().claim(src, tag);
            if let Some(claimed) = claimed {
                return claimed;
            }

            tokio::select! {
                mut rx = link.rx.lock() => {
                    let envelope = rx.recv().await;
                    link.mail().file(envelope);
                    drop(rx);
                    link.filed.notify_waiters();
                }
                _ = &mut filed => {}
            }
        }
    }
}
