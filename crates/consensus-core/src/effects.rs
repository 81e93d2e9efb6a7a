//! Capabilities of the collaborators the consensus core is written against
//!
//! Transport, event bus and ledger are owned by the embedding application,
//! the core only ever sees them through these traits.

use agora_util_error::BoxedErrorResult;

use crate::bincode::encode_to_vec;
use crate::block::ProposedBlock;
use crate::msg::{Protocol, ProtocolMsg};
use crate::representative::RepresentativeId;
use crate::state_id::StateId;

/// An encoded message addressed to a list of representatives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverCommand {
    pub message_id: String,
    pub protocol: Protocol,
    pub body: Vec<u8>,
    pub recipients: Vec<RepresentativeId>,
}

impl DeliverCommand {
    pub fn new<M: ProtocolMsg>(msg: &M, recipients: Vec<RepresentativeId>) -> Self {
        Self {
            message_id: StateId::generate().as_str().to_owned(),
            protocol: M::PROTOCOL,
            body: encode_to_vec(msg),
            recipients,
        }
    }
}

/// Message transport
///
/// Delivery is fire-and-forget: an `Ok` only means the message was handed
/// over.
pub trait Deliver: Send + Sync {
    fn deliver(&self, cmd: DeliverCommand) -> BoxedErrorResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    LeaderUpdated {
        leader: RepresentativeId,
    },
    BlockConfirmed {
        state_id: StateId,
        block: ProposedBlock,
    },
    NodeDeleted {
        id: RepresentativeId,
    },
}

impl Event {
    pub const TOPIC_LEADER_UPDATED: &'static str = "leader.updated";
    pub const TOPIC_BLOCK_CONFIRMED: &'static str = "block.confirmed";
    pub const TOPIC_NODE_DELETED: &'static str = "node.deleted";

    pub fn topic(&self) -> &'static str {
        match self {
            Event::LeaderUpdated { .. } => Self::TOPIC_LEADER_UPDATED,
            Event::BlockConfirmed { .. } => Self::TOPIC_BLOCK_CONFIRMED,
            Event::NodeDeleted { .. } => Self::TOPIC_NODE_DELETED,
        }
    }
}

/// Event bus
pub trait Publish: Send + Sync {
    fn publish(&self, event: &Event) -> BoxedErrorResult<()>;
}

/// Final acceptance of an agreed block by the ledger
pub trait ConfirmBlock: Send + Sync {
    fn confirm_block(&self, block: &ProposedBlock) -> BoxedErrorResult<()>;
}
