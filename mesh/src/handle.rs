//! Completion tracking for issued sends.

use futures_util::future::try_join_all;
use tokio::sync::oneshot;

use crate::Error;

pub(crate) type Completion = oneshot::Sender<Result<(), Error>>;

/// Tracks one issued send until it has reached the destination mailbox.
///
/// The payload is owned by the transport from the moment `send` returns, so
/// the caller cannot touch it while it is in flight. Dropping a handle does
/// not cancel the delivery, it only gives up on hearing how it went.
#[must_use = "a send is only known to be complete once its handle is awaited"]
#[derive(Debug)]
pub struct SendHandle {
    rx: oneshot::Receiver<Result<(), Error>>,
}

impl SendHandle {
    pub(crate) fn pending() -> (Completion, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    pub(crate) fn ready(result: Result<(), Error>) -> Self {
        let (tx, handle) = Self::pending();
        let _ = tx.send(result);
        handle
    }

    /// Waits until the message sits in the destination's mailbox.
    pub async fn wait(self) -> Result<(), Error> {
        self.rx.await.map_err(|_| Error::ConnectionClosed)?
    }
}

/// Awaits every handle, failing on the first delivery error.
pub async fn wait_all<I>(handles: I) -> Result<(), Error>
where
    I: IntoIterator<Item = SendHandle>,
{
    try_join_all(handles.into_iter().map(SendHandle::wait)).await?;
    Ok(())
}
