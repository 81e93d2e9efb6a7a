use agora_consensus_core::msg::PreCommitMsg;
use tracing::{debug, instrument};

use super::{
    Consensus, ConsensusResult, LOG_TARGET, Outbox, StateIdNotSameSnafu, UnknownSenderSnafu,
};
use crate::msg_pool::InsertOutcome;

impl Consensus {
    /// Record a precommit, committing the round once enough of them arrived
    pub async fn handle_precommit_msg(&self, msg: PreCommitMsg) -> ConsensusResult<()> {
        let outbox = {
            let _guard = self.round_lock.lock().await;
            self.handle_precommit_msg_locked(msg)?
        };
        self.flush(outbox);
        Ok(())
    }

    #[instrument(skip_all, fields(state_id = %msg.state_id, sender = %msg.sender_id))]
    fn handle_precommit_msg_locked(&self, msg: PreCommitMsg) -> ConsensusResult<Outbox> {
        let mut state = self.state_repo.load()?;

        if state.state_id != msg.state_id {
            return StateIdNotSameSnafu {
                expected: state.state_id,
                received: msg.state_id,
            }
            .fail();
        }
        if !state.is_participant(&msg.sender_id) {
            return UnknownSenderSnafu {
                sender_id: msg.sender_id,
            }
            .fail();
        }

        if let InsertOutcome::Replaced(_) = state.precommit_msg_pool.save(msg) {
            debug!(target: LOG_TARGET, "Repeated precommit replaced the previous one");
            self.store_state(state)?;
            return Ok(Outbox::default());
        }

        let mut outbox = Outbox::default();
        self.advance_round(state, &mut outbox)?;
        Ok(outbox)
    }
}
