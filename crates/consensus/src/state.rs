//! A single consensus round and the storage it lives in

use core::fmt;

use agora_consensus_core::block::ProposedBlock;
use agora_consensus_core::msg::PreCommitMsg;
use agora_consensus_core::num_peers::{NumPeers, ToNumPeers as _};
use agora_consensus_core::representative::{Representative, RepresentativeId};
use agora_consensus_core::state_id::StateId;
use snafu::Snafu;

use crate::msg_pool::{PreCommitMsgPool, PrevoteMsgPool};

/// Phase of a round
///
/// Ordered: a round only ever moves forward, entering each stage at most
/// once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// No round on record
    #[default]
    Idle,
    Prevote,
    Precommit,
    Commit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Idle => "idle",
            Stage::Prevote => "prevote",
            Stage::Precommit => "precommit",
            Stage::Commit => "commit",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub state_id: StateId,
    /// Participants of the round, snapshotted when it was created
    pub representatives: Vec<Representative>,
    pub block: ProposedBlock,
    pub current_stage: Stage,
    pub prevote_msg_pool: PrevoteMsgPool,
    pub precommit_msg_pool: PreCommitMsgPool,
}

/// Stage transition performed by [`State::advance`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    EnteredPrecommit {
        /// Our own precommit, already recorded in the pool, to be sent to
        /// the other participants
        own_vote: Option<PreCommitMsg>,
    },
    Committed,
}

impl State {
    pub fn new(
        state_id: StateId,
        representatives: Vec<Representative>,
        block: ProposedBlock,
    ) -> Self {
        Self {
            state_id,
            representatives,
            block,
            current_stage: Stage::Idle,
            prevote_msg_pool: PrevoteMsgPool::new(),
            precommit_msg_pool: PreCommitMsgPool::new(),
        }
    }

    pub fn num_peers(&self) -> NumPeers {
        self.representatives.to_num_peers()
    }

    /// Number of distinct senders needed to leave a stage
    pub fn quorum(&self) -> usize {
        self.num_peers().threshold()
    }

    pub fn is_participant(&self, id: &RepresentativeId) -> bool {
        self.representatives.iter().any(|r| &r.id == id)
    }

    pub fn recipients_except(&self, id: &RepresentativeId) -> Vec<RepresentativeId> {
        self.representatives
            .iter()
            .filter(|r| &r.id != id)
            .map(|r| r.id.clone())
            .collect()
    }

    /// Move the round forward as far as the collected votes allow
    ///
    /// Entering [`Stage::Precommit`] records our own precommit, which can in
    /// turn complete the precommit quorum, so a single call may return both
    /// transitions. Calling it again without new votes returns nothing.
    ///
    /// A precommit quorum is enough to leave [`Stage::Prevote`] even if some
    /// of the prevotes never reached us.
    pub fn advance(&mut self, our_id: &RepresentativeId) -> Vec<Advance> {
        let quorum = self.quorum();
        let mut advances = vec![];

        if self.current_stage == Stage::Prevote
            && (quorum <= self.prevote_msg_pool.count()
                || quorum <= self.precommit_msg_pool.count())
        {
            self.current_stage = Stage::Precommit;

            let own_vote = self.is_participant(our_id).then(|| {
                let msg = PreCommitMsg {
                    state_id: self.state_id.clone(),
                    sender_id: our_id.clone(),
                };
                self.precommit_msg_pool.save(msg.clone());
                msg
            });
            advances.push(Advance::EnteredPrecommit { own_vote });
        }

        if self.current_stage == Stage::Precommit && quorum <= self.precommit_msg_pool.count() {
            self.current_stage = Stage::Commit;
            advances.push(Advance::Committed);
        }

        advances
    }
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum StateRepoError {
    #[snafu(display("No round on record"))]
    EmptyRepo,
    #[snafu(display("Can't save round {state_id}: round {stored} is on record"))]
    InvalidSave { state_id: StateId, stored: StateId },
}

pub type StateRepoResult<T> = Result<T, StateRepoError>;

/// Storage holding the (at most one) round in flight
///
/// `save` overwrites the stored round only if it has the same [`StateId`].
pub trait StateRepository: Send + Sync {
    fn load(&self) -> StateRepoResult<State>;
    fn save(&self, state: State) -> StateRepoResult<()>;
    fn remove(&self) -> Option<State>;
}
