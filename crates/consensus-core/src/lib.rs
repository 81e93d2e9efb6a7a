// SPDX-License-Identifier: MIT

//! Core types of the Agora parliament consensus
//!
//! The parliament model, blocks under agreement, round identifiers, the
//! messages exchanged between representatives, and the capability traits
//! (transport, event bus, ledger, repositories) the consensus and election
//! crates are written against.

pub mod bincode;
pub mod block;
pub mod effects;
pub mod mem;
pub mod msg;
pub mod num_peers;
pub mod parliament;
pub mod representative;
pub mod state_id;
