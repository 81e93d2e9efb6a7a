// SPDX-License-Identifier: MIT

//! Three-phase (propose → prevote → precommit) agreement on a single block
//! per round among the parliament's representatives.
//!
//! The state machine in [`consensus::Consensus`] is side-effect free apart
//! from the capabilities it is constructed with: it persists the round in a
//! [`state::StateRepository`], hands outgoing messages to a
//! [`agora_consensus_core::effects::Deliver`] and confirms agreed blocks
//! through [`agora_consensus_core::effects::ConfirmBlock`].
//!
//! Only one round is in flight at a time. A round lives from the proposal
//! until its commit, when it is removed from the repository again.

pub mod consensus;
pub mod mem;
pub mod msg_pool;
pub mod state;
