use agora_consensus_core::block::ProposedBlock;
use agora_consensus_core::effects::DeliverCommand;
use agora_consensus_core::msg::{PrevoteMsg, ProposeMsg};
use agora_consensus_core::state_id::StateId;
use tracing::{Level, info, instrument};

use super::{
    Consensus, ConsensusCreateSnafu, ConsensusResult, InvalidBlockSnafu, LOG_TARGET,
    NotLeaderSnafu, Outbox,
};
use crate::state::{Stage, State};

impl Consensus {
    /// Open a new round proposing `block` to the parliament
    ///
    /// Only the leader can do it, and only when there is somebody else to
    /// agree with. The proposal counts as the leader's own prevote.
    pub async fn start_consensus(&self, block: ProposedBlock) -> ConsensusResult<StateId> {
        let (state_id, outbox) = {
            let _guard = self.round_lock.lock().await;
            self.start_consensus_locked(block)?
        };
        self.flush(outbox);
        Ok(state_id)
    }

    #[instrument(skip_all, fields(block = %block.seal_short()), ret(level = Level::DEBUG))]
    fn start_consensus_locked(&self, block: ProposedBlock) -> ConsensusResult<(StateId, Outbox)> {
        let parliament = self.parliament_repo.load();

        let num_participants = parliament.num_participants().total();
        if num_participants < 2 {
            return ConsensusCreateSnafu { num_participants }.fail();
        }

        if !parliament.is_leader(&self.our_id) {
            return NotLeaderSnafu {
                leader: parliament.leader_id().cloned(),
            }
            .fail();
        }

        if !block.is_valid() {
            return InvalidBlockSnafu.fail();
        }

        let state_id = StateId::generate();
        let mut state = State::new(state_id.clone(), parliament.participants(), block.clone());
        state.current_stage = Stage::Prevote;
        state.prevote_msg_pool.save(PrevoteMsg {
            state_id: state_id.clone(),
            sender_id: self.our_id.clone(),
            block_hash: block.seal.clone(),
        });

        let propose = ProposeMsg {
            state_id: state_id.clone(),
            sender_id: self.our_id.clone(),
            representative: parliament.leader().cloned(),
            proposed_block: block,
        };
        let outbox = Outbox {
            deliveries: vec![DeliverCommand::new(
                &propose,
                state.recipients_except(&self.our_id),
            )],
            committed: None,
        };

        self.store_state(state)?;

        info!(
            target: LOG_TARGET,
            %state_id,
            %num_participants,
            "Started a round"
        );
        Ok((state_id, outbox))
    }
}
