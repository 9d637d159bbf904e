//! Background delivery task, one per destination rank.

use std::time::Duration;

use mesh_types::Envelope;
use mesh_types::mailbox::mailbox_client::MailboxClient;
use tokio::sync::mpsc;
use tonic::Code;
use tonic::transport::Channel;
use tracing::{debug, warn};

use crate::Error;
use crate::handle::Completion;

/// Retry schedule for delivering to a peer that is not reachable yet.
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    /// Total delivery attempts per message, the first one included.
    pub attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            attempts: 50,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(1),
        }
    }
}

pub(crate) struct Outgoing {
    pub envelope: Envelope,
    pub done: Completion,
}

/// Delivers queued envelopes to one peer strictly in queue order.
pub(crate) struct Outbox {
    dest: usize,
    client: MailboxClient<Channel>,
    queue: mpsc::UnboundedReceiver<Outgoing>,
    policy: DeliveryPolicy,
}

impl Outbox {
    pub fn new(
        dest: usize,
        client: MailboxClient<Channel>,
        queue: mpsc::UnboundedReceiver<Outgoing>,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            dest,
            client,
            queue,
            policy,
        }
    }

    pub async fn run(mut self) {
        while let Some(Outgoing { envelope, done }) = self.queue.recv().await {
            let result = self.deliver(envelope).await;
            if let Err(e) = &result {
                warn!(dest = self.dest, error = %e, "delivery failed");
            }
            let _ = done.send(result);
        }
    }

    /// Only `Unavailable` is retried: the peer has not started listening.
    /// Any other status means the peer saw the request and is final.
    async fn deliver(&mut self, envelope: Envelope) -> Result<(), Error> {
        let mut attempt = 1;
        let mut delay = self.policy.initial_backoff;

        loop {
            match self.client.deliver(envelope.clone()).await {
                Ok(_) => {
                    debug!(dest = self.dest, tag = envelope.tag, "delivered");
                    return Ok(());
                }
                Err(status)
                    if status.code() == Code::Unavailable && attempt < self.policy.attempts =>
                {
                    debug!(dest = self.dest, attempt, "peer unavailable, retrying");
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.policy.max_backoff);
                }
                Err(status) => return Err(Error::from(status)),
            }
        }
    }
}
