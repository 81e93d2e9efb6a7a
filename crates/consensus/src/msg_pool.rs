use std::collections::BTreeMap;

use agora_consensus_core::msg::{PreCommitMsg, PrevoteMsg};
use agora_consensus_core::representative::RepresentativeId;

/// Vote message kept in a [`MsgPool`], keyed by its sender
pub trait PoolMsg {
    fn sender_id(&self) -> &RepresentativeId;
}

impl PoolMsg for PrevoteMsg {
    fn sender_id(&self) -> &RepresentativeId {
        &self.sender_id
    }
}

impl PoolMsg for PreCommitMsg {
    fn sender_id(&self) -> &RepresentativeId {
        &self.sender_id
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome<T> {
    Inserted,
    /// The sender already had a message in the pool, which got overwritten
    Replaced(T),
}

/// Votes of one round, at most one per sender
///
/// A repeated message from the same sender overwrites the previous one, so
/// [`MsgPool::count`] is the number of distinct senders and never exceeds the
/// size of the round's membership.
///
/// The pool has no synchronization of its own. It is owned by a
/// [`crate::state::State`] and mutated only under the consensus round lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgPool<M> {
    messages: BTreeMap<RepresentativeId, M>,
}

impl<M> Default for MsgPool<M> {
    fn default() -> Self {
        Self {
            messages: BTreeMap::new(),
        }
    }
}

impl<M> MsgPool<M>
where
    M: PoolMsg,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, msg: M) -> InsertOutcome<M> {
        match self.messages.insert(msg.sender_id().clone(), msg) {
            Some(prev) => InsertOutcome::Replaced(prev),
            None => InsertOutcome::Inserted,
        }
    }

    pub fn load(&self, sender_id: &RepresentativeId) -> Option<&M> {
        self.messages.get(sender_id)
    }

    pub fn contains(&self, sender_id: &RepresentativeId) -> bool {
        self.messages.contains_key(sender_id)
    }

    /// Number of distinct senders
    pub fn count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn senders(&self) -> impl Iterator<Item = &RepresentativeId> {
        self.messages.keys()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

pub type PrevoteMsgPool = MsgPool<PrevoteMsg>;
pub type PreCommitMsgPool = MsgPool<PreCommitMsg>;
