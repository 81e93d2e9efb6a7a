mod getters;
mod handle_precommit;
mod handle_prevote;
mod handle_propose;
mod start_consensus;

use std::sync::Arc;

use agora_consensus_core::block::ProposedBlock;
use agora_consensus_core::effects::{ConfirmBlock, Deliver, DeliverCommand, Event, Publish};
use agora_consensus_core::parliament::ParliamentRepository;
use agora_consensus_core::representative::RepresentativeId;
use agora_consensus_core::state_id::StateId;
use agora_util_error::BoxedError;
use agora_util_error::fmt::FmtCompact as _;
use agora_util_fmt_opt::AsFmtOption as _;
use snafu::{ResultExt as _, Snafu};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::state::{Advance, Stage, State, StateRepoError, StateRepository};

const LOG_TARGET: &str = "agora::consensus";

#[derive(Debug, Snafu)]
pub enum ConsensusError {
    #[snafu(display("A round needs at least 2 participants, got {num_participants}"))]
    ConsensusCreate { num_participants: usize },
    #[snafu(display("Only the leader can start a round (leader: {})", leader.fmt_option()))]
    NotLeader { leader: Option<RepresentativeId> },
    #[snafu(display("Block must have a seal and a body"))]
    InvalidBlock,
    #[snafu(display("Can't save round {state_id}: round {stored} is in progress"))]
    InvalidSave { state_id: StateId, stored: StateId },
    #[snafu(display("Propose from {sender_id}, but the leader is {}", leader.fmt_option()))]
    InvalidLeaderId {
        sender_id: RepresentativeId,
        leader: Option<RepresentativeId>,
    },
    #[snafu(display("Round mismatch - expected: {expected}, received: {received}"))]
    StateIdNotSame { expected: StateId, received: StateId },
    #[snafu(display("No round on record"))]
    EmptyRepo,
    #[snafu(display("{sender_id} is not a participant of the round"))]
    UnknownSender { sender_id: RepresentativeId },
    #[snafu(display("{sender_id} voted for a different block"))]
    BlockHashMismatch { sender_id: RepresentativeId },
    #[snafu(display("Ledger failed to confirm the block"))]
    ConfirmBlock { source: BoxedError },
}

pub type ConsensusResult<T> = Result<T, ConsensusError>;

impl From<StateRepoError> for ConsensusError {
    fn from(err: StateRepoError) -> Self {
        match err {
            StateRepoError::EmptyRepo => ConsensusError::EmptyRepo,
            StateRepoError::InvalidSave { state_id, stored } => {
                ConsensusError::InvalidSave { state_id, stored }
            }
        }
    }
}

/// Round progress, as seen by [`Consensus::round_rx`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundStatus {
    /// Round in flight, if any
    pub state_id: Option<StateId>,
    pub stage: Stage,
    pub last_committed: Option<StateId>,
}

/// Effects of a handled message, performed once the round lock is released
#[derive(Debug, Default)]
struct Outbox {
    deliveries: Vec<DeliverCommand>,
    committed: Option<(StateId, ProposedBlock)>,
}

pub struct Consensus {
    our_id: RepresentativeId,
    parliament_repo: Arc<dyn ParliamentRepository>,
    state_repo: Arc<dyn StateRepository>,
    deliver: Arc<dyn Deliver>,
    publish: Arc<dyn Publish>,
    ledger: Arc<dyn ConfirmBlock>,
    /// Serializes handlers, so load, vote insert, stage change and save of a
    /// round happen as one step
    round_lock: Mutex<()>,
    round_tx: watch::Sender<RoundStatus>,
    round_rx: watch::Receiver<RoundStatus>,
}

#[bon::bon]
impl Consensus {
    #[builder]
    pub fn new(
        #[builder(into)] our_id: RepresentativeId,
        parliament_repo: Arc<dyn ParliamentRepository>,
        state_repo: Arc<dyn StateRepository>,
        deliver: Arc<dyn Deliver>,
        publish: Arc<dyn Publish>,
        ledger: Arc<dyn ConfirmBlock>,
    ) -> Self {
        let status = match state_repo.load() {
            Ok(state) => RoundStatus {
                state_id: Some(state.state_id),
                stage: state.current_stage,
                last_committed: None,
            },
            Err(_) => RoundStatus::default(),
        };
        let (round_tx, round_rx) = watch::channel(status);

        Self {
            our_id,
            parliament_repo,
            state_repo,
            deliver,
            publish,
            ledger,
            round_lock: Mutex::new(()),
            round_tx,
            round_rx,
        }
    }
}

impl Consensus {
    /// Apply the stage transitions the votes collected in `state` allow
    ///
    /// Must be called under the round lock. Nothing is saved or sent if it
    /// fails.
    fn advance_round(&self, mut state: State, outbox: &mut Outbox) -> ConsensusResult<()> {
        for advance in state.advance(&self.our_id) {
            match advance {
                Advance::EnteredPrecommit { own_vote } => {
                    debug!(
                        target: LOG_TARGET,
                        state_id = %state.state_id,
                        prevotes = state.prevote_msg_pool.count(),
                        "Prevote quorum reached"
                    );
                    if let Some(own_vote) = own_vote {
                        outbox.deliveries.push(DeliverCommand::new(
                            &own_vote,
                            state.recipients_except(&self.our_id),
                        ));
                    }
                }
                Advance::Committed => {
                    debug!(
                        target: LOG_TARGET,
                        state_id = %state.state_id,
                        precommits = state.precommit_msg_pool.count(),
                        "Precommit quorum reached"
                    );
                    self.ledger
                        .confirm_block(&state.block)
                        .context(ConfirmBlockSnafu)?;
                    outbox.committed = Some((state.state_id.clone(), state.block.clone()));
                }
            }
        }

        self.store_state(state)
    }

    /// Persist `state`, or release it if it got committed
    fn store_state(&self, state: State) -> ConsensusResult<()> {
        if state.current_stage == Stage::Commit {
            self.state_repo.remove();
            info!(
                target: LOG_TARGET,
                state_id = %state.state_id,
                block = %state.block.seal_short(),
                "Round committed"
            );
            self.round_tx.send_replace(RoundStatus {
                state_id: None,
                stage: Stage::Idle,
                last_committed: Some(state.state_id),
            });
            return Ok(());
        }

        let state_id = state.state_id.clone();
        let stage = state.current_stage;
        self.state_repo.save(state)?;
        self.round_tx.send_if_modified(|status| {
            if status.state_id.as_ref() == Some(&state_id) && status.stage == stage {
                return false;
            }
            status.state_id = Some(state_id);
            status.stage = stage;
            true
        });
        Ok(())
    }

    /// Drop the round in flight without committing it
    ///
    /// Used when the round can't complete anymore, e.g. its leader is gone.
    pub async fn abandon_round(&self) -> Option<StateId> {
        let _guard = self.round_lock.lock().await;

        let state = self.state_repo.remove()?;
        warn!(
            target: LOG_TARGET,
            state_id = %state.state_id,
            stage = %state.current_stage,
            "Abandoning round"
        );
        self.round_tx.send_modify(|status| {
            status.state_id = None;
            status.stage = Stage::Idle;
        });
        Some(state.state_id)
    }

    /// Send out the effects of a handled message
    ///
    /// Delivery and publication are fire-and-forget, failures are only
    /// logged.
    fn flush(&self, outbox: Outbox) {
        for cmd in outbox.deliveries {
            let protocol = cmd.protocol;
            if let Err(err) = self.deliver.deliver(cmd) {
                warn!(
                    target: LOG_TARGET,
                    %protocol,
                    err = %err.fmt_compact(),
                    "Failed to deliver message"
                );
            }
        }

        if let Some((state_id, block)) = outbox.committed {
            if let Err(err) = self
                .publish
                .publish(&Event::BlockConfirmed { state_id, block })
            {
                warn!(
                    target: LOG_TARGET,
                    err = %err.fmt_compact(),
                    "Failed to publish block confirmation"
                );
            }
        }
    }
}
