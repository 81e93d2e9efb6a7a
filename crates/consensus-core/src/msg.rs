//! Messages exchanged between representatives
//!
//! Every message type is carried by the transport under its own
//! [`Protocol`] name, with the body encoded using
//! [`crate::bincode::STD_BINCODE_CONFIG`].

use core::fmt;
use std::str::FromStr;

use bincode::{Decode, Encode};
use snafu::Snafu;

use crate::block::ProposedBlock;
use crate::representative::{Representative, RepresentativeId};
use crate::state_id::StateId;

#[derive(Encode, Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Protocol {
    Propose,
    Prevote,
    PreCommit,
    RequestVote,
    VoteLeader,
    UpdateLeader,
}

impl Protocol {
    pub const ALL: [Protocol; 6] = [
        Protocol::Propose,
        Protocol::Prevote,
        Protocol::PreCommit,
        Protocol::RequestVote,
        Protocol::VoteLeader,
        Protocol::UpdateLeader,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Propose => "ProposeMsgProtocol",
            Protocol::Prevote => "PrevoteMsgProtocol",
            Protocol::PreCommit => "PreCommitMsgProtocol",
            Protocol::RequestVote => "RequestVoteProtocol",
            Protocol::VoteLeader => "VoteLeaderProtocol",
            Protocol::UpdateLeader => "UpdateLeaderProtocol",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Unknown protocol: {name}"))]
pub struct UnknownProtocolError {
    pub name: String,
}

impl FromStr for Protocol {
    type Err = UnknownProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownProtocolError { name: s.to_owned() })
    }
}

/// A message type bound to the protocol it travels under
pub trait ProtocolMsg: Encode + Decode<()> {
    const PROTOCOL: Protocol;
}

/// Leader's proposal opening a round
#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct ProposeMsg {
    pub state_id: StateId,
    pub sender_id: RepresentativeId,
    pub representative: Option<Representative>,
    pub proposed_block: ProposedBlock,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct PrevoteMsg {
    pub state_id: StateId,
    pub sender_id: RepresentativeId,
    /// Seal of the block the sender votes for
    pub block_hash: Vec<u8>,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct PreCommitMsg {
    pub state_id: StateId,
    pub sender_id: RepresentativeId,
}

/// A candidate asking for votes in its election `term`
#[derive(Encode, Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestVoteMsg {
    pub term: u64,
}

/// A vote for the candidate the message is delivered to
#[derive(Encode, Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteMsg {
    pub term: u64,
}

/// Announcement of an elected leader
#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct UpdateLeaderMsg {
    pub representative: Representative,
}

impl ProtocolMsg for ProposeMsg {
    const PROTOCOL: Protocol = Protocol::Propose;
}
impl ProtocolMsg for PrevoteMsg {
    const PROTOCOL: Protocol = Protocol::Prevote;
}
impl ProtocolMsg for PreCommitMsg {
    const PROTOCOL: Protocol = Protocol::PreCommit;
}
impl ProtocolMsg for RequestVoteMsg {
    const PROTOCOL: Protocol = Protocol::RequestVote;
}
impl ProtocolMsg for VoteMsg {
    const PROTOCOL: Protocol = Protocol::VoteLeader;
}
impl ProtocolMsg for UpdateLeaderMsg {
    const PROTOCOL: Protocol = Protocol::UpdateLeader;
}
