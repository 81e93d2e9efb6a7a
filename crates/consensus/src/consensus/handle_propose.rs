use agora_consensus_core::effects::DeliverCommand;
use agora_consensus_core::msg::{PrevoteMsg, ProposeMsg};
use tracing::{debug, instrument, warn};

use super::{Consensus, ConsensusResult, InvalidLeaderIdSnafu, InvalidSaveSnafu, LOG_TARGET, Outbox};
use crate::state::{Stage, State};

impl Consensus {
    pub async fn handle_propose_msg(&self, msg: ProposeMsg) -> ConsensusResult<()> {
        let outbox = {
            let _guard = self.round_lock.lock().await;
            self.handle_propose_msg_locked(msg)?
        };
        self.flush(outbox);
        Ok(())
    }

    #[instrument(skip_all, fields(state_id = %msg.state_id, sender = %msg.sender_id))]
    fn handle_propose_msg_locked(&self, msg: ProposeMsg) -> ConsensusResult<Outbox> {
        let parliament = self.parliament_repo.load();

        if !parliament.is_leader(&msg.sender_id) {
            return InvalidLeaderIdSnafu {
                sender_id: msg.sender_id,
                leader: parliament.leader_id().cloned(),
            }
            .fail();
        }

        if let Ok(stored) = self.state_repo.load() {
            if stored.state_id == msg.state_id {
                debug!(target: LOG_TARGET, "Round already on record");
                return Ok(Outbox::default());
            }
            return InvalidSaveSnafu {
                state_id: msg.state_id,
                stored: stored.state_id,
            }
            .fail();
        }

        if !msg.proposed_block.is_valid() {
            warn!(target: LOG_TARGET, "Ignoring proposal of an invalid block");
            return Ok(Outbox::default());
        }

        let mut state = State::new(
            msg.state_id.clone(),
            parliament.participants(),
            msg.proposed_block,
        );
        state.current_stage = Stage::Prevote;

        // The proposal stands for the leader's prevote
        state.prevote_msg_pool.save(PrevoteMsg {
            state_id: msg.state_id.clone(),
            sender_id: msg.sender_id,
            block_hash: state.block.seal.clone(),
        });

        let mut outbox = Outbox::default();
        if state.is_participant(&self.our_id) {
            let own_vote = PrevoteMsg {
                state_id: msg.state_id,
                sender_id: self.our_id.clone(),
                block_hash: state.block.seal.clone(),
            };
            state.prevote_msg_pool.save(own_vote.clone());
            outbox.deliveries.push(DeliverCommand::new(
                &own_vote,
                state.recipients_except(&self.our_id),
            ));
        }

        debug!(
            target: LOG_TARGET,
            block = %state.block.seal_short(),
            "Accepted proposal"
        );
        self.advance_round(state, &mut outbox)?;
        Ok(outbox)
    }
}
