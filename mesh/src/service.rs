//! gRPC side of a participant's inbox.

use std::sync::Arc;

use mesh_types::mailbox::mailbox_server::{Mailbox, MailboxServer};
use mesh_types::{Ack, Envelope};
use tonic::{Request, Response, Status};

use crate::inbox::Inlet;

/// Largest envelope a participant accepts.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

#[derive(Clone)]
pub struct MailboxService {
    inlets: Arc<Vec<Inlet>>,
}

impl MailboxService {
    pub fn new(inlets: Vec<Inlet>) -> Self {
        Self {
            inlets: Arc::new(inlets),
        }
    }
}

#[tonic::async_trait]
impl Mailbox for MailboxService {
    async fn deliver(&self, request: Request<Envelope>) -> Result<Response<Ack>, Status> {
        let envelope = request.into_inner();
        let source = envelope.source as usize;
        let inlet = self.inlets.get(source).ok_or_else(|| {
            Status::invalid_argument(format!(
                "source rank {} outside a mesh of {}",
                source,
                self.inlets.len()
            ))
        })?;

        inlet
            .send(envelope)
            .map_err(|_| Status::failed_precondition("mailbox closed"))?;

        Ok(Response::new(Ack {}))
    }
}

pub fn create_server(inlets: Vec<Inlet>) -> MailboxServer<MailboxService> {
    MailboxServer::new(MailboxService::new(inlets)).max_decoding_message_size(MAX_MESSAGE_SIZE)
}
