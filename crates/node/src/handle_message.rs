use std::sync::Arc;

use agora_consensus_core::bincode::decode_whole;
use agora_consensus_core::msg::{
    PreCommitMsg, PrevoteMsg, ProposeMsg, Protocol, ProtocolMsg, RequestVoteMsg,
    UpdateLeaderMsg, VoteMsg,
};
use agora_consensus_core::representative::RepresentativeId;
use agora_util_error::fmt::FmtCompact as _;
use snafu::ResultExt as _;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace};

use crate::{DecodeSnafu, LOG_TARGET, Node, NodeResult, SenderMismatchSnafu};

/// A message as handed over by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMsg {
    pub message_id: String,
    pub sender: RepresentativeId,
    pub protocol: Protocol,
    pub body: Vec<u8>,
}

impl Node {
    /// Handle inbound messages until the transport closes the channel
    ///
    /// Rejected messages are logged and dropped.
    pub async fn run_inbound(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<InboundMsg>) {
        while let Some(msg) = rx.recv().await {
            if let Err(err) = self
                .handle_message(&msg.sender, msg.protocol, &msg.body)
                .await
            {
                debug!(
                    target: LOG_TARGET,
                    sender = %msg.sender,
                    protocol = %msg.protocol,
                    message_id = %msg.message_id,
                    err = %err.fmt_compact(),
                    "Rejected message"
                );
            }
        }
        info!(target: LOG_TARGET, "Inbound channel closed");
    }

    /// Decode a message received from `sender` and apply it
    #[instrument(skip_all, fields(%sender, %protocol))]
    pub async fn handle_message(
        &self,
        sender: &RepresentativeId,
        protocol: Protocol,
        body: &[u8],
    ) -> NodeResult<()> {
        trace!(target: LOG_TARGET, len = body.len(), "Handling message");

        match protocol {
            Protocol::Propose => {
                let msg: ProposeMsg = decode(sender, body)?;
                check_sender(sender, &msg.sender_id)?;
                self.consensus.handle_propose_msg(msg).await?;
            }
            Protocol::Prevote => {
                let msg: PrevoteMsg = decode(sender, body)?;
                check_sender(sender, &msg.sender_id)?;
                self.consensus.handle_prevote_msg(msg).await?;
            }
            Protocol::PreCommit => {
                let msg: PreCommitMsg = decode(sender, body)?;
                check_sender(sender, &msg.sender_id)?;
                self.consensus.handle_precommit_msg(msg).await?;
            }
            Protocol::RequestVote => {
                let msg: RequestVoteMsg = decode(sender, body)?;
                self.election.vote(sender, msg.term)?;
            }
            Protocol::VoteLeader => {
                let msg: VoteMsg = decode(sender, body)?;
                self.election.decide_to_be_leader(sender, msg.term)?;
            }
            Protocol::UpdateLeader => {
                let msg: UpdateLeaderMsg = decode(sender, body)?;
                self.election.update_leader(sender, msg.representative)?;
            }
        }

        Ok(())
    }
}

fn decode<M: ProtocolMsg>(sender: &RepresentativeId, body: &[u8]) -> NodeResult<M> {
    decode_whole(body).context(DecodeSnafu {
        protocol: M::PROTOCOL,
        sender: sender.clone(),
    })
}

fn check_sender(sender: &RepresentativeId, claimed: &RepresentativeId) -> NodeResult<()> {
    if sender != claimed {
        return SenderMismatchSnafu {
            sender: sender.clone(),
            claimed: claimed.clone(),
        }
        .fail();
    }
    Ok(())
}
