//! In-process transport

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use agora_consensus_core::effects::{Deliver, DeliverCommand};
use agora_consensus_core::representative::RepresentativeId;
use agora_util_error::BoxedErrorResult;
use snafu::Snafu;
use tokio::sync::mpsc;
use tracing::trace;

use crate::LOG_TARGET;
use crate::handle_message::InboundMsg;

#[derive(Debug, Snafu)]
#[snafu(display("Unreachable recipients: {recipients:?}"))]
pub struct UnreachableError {
    pub recipients: Vec<RepresentativeId>,
}

/// Routes messages between endpoints connected to it
///
/// Every endpoint gets its own unbounded inbox, so messages from one sender
/// to one recipient arrive in the order they were sent.
#[derive(Debug, Clone, Default)]
pub struct LocalNetwork {
    inboxes: Arc<Mutex<BTreeMap<RepresentativeId, mpsc::UnboundedSender<InboundMsg>>>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `id`, returning its endpoint and inbox
    ///
    /// Connecting an already connected `id` replaces its inbox.
    pub fn connect(
        &self,
        id: impl Into<RepresentativeId>,
    ) -> (LocalEndpoint, mpsc::UnboundedReceiver<InboundMsg>) {
        let id = id.into();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inboxes
            .lock()
            .expect("Locking failed")
            .insert(id.clone(), tx);

        (
            LocalEndpoint {
                our_id: id,
                network: self.clone(),
            },
            rx,
        )
    }

    /// Detach `id`, closing its inbox
    pub fn disconnect(&self, id: &RepresentativeId) -> bool {
        self.inboxes
            .lock()
            .expect("Locking failed")
            .remove(id)
            .is_some()
    }

    pub fn is_connected(&self, id: &RepresentativeId) -> bool {
        self.inboxes
            .lock()
            .expect("Locking failed")
            .contains_key(id)
    }
}

/// Sending side of a [`LocalNetwork`] member
#[derive(Debug, Clone)]
pub struct LocalEndpoint {
    our_id: RepresentativeId,
    network: LocalNetwork,
}

impl LocalEndpoint {
    pub fn our_id(&self) -> &RepresentativeId {
        &self.our_id
    }
}

impl Deliver for LocalEndpoint {
    fn deliver(&self, cmd: DeliverCommand) -> BoxedErrorResult<()> {
        let inboxes = self.network.inboxes.lock().expect("Locking failed");

        let mut unreachable = vec![];
        for recipient in cmd.recipients {
            let msg = InboundMsg {
                message_id: cmd.message_id.clone(),
                sender: self.our_id.clone(),
                protocol: cmd.protocol,
                body: cmd.body.clone(),
            };
            match inboxes.get(&recipient) {
                Some(tx) if tx.send(msg).is_ok() => {
                    trace!(
                        target: LOG_TARGET,
                        from = %self.our_id,
                        to = %recipient,
                        protocol = %cmd.protocol,
                        "Delivered"
                    );
                }
                _ => unreachable.push(recipient),
            }
        }

        if !unreachable.is_empty() {
            return Err(UnreachableError {
                recipients: unreachable,
            }
            .into());
        }
        Ok(())
    }
}
