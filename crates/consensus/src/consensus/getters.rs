use agora_consensus_core::representative::RepresentativeId;
use tokio::sync::watch;

use super::{Consensus, RoundStatus};
use crate::state::{Stage, State};

impl Consensus {
    pub fn our_id(&self) -> &RepresentativeId {
        &self.our_id
    }

    /// Round in flight, if any
    pub fn current_state(&self) -> Option<State> {
        self.state_repo.load().ok()
    }

    pub fn current_stage(&self) -> Stage {
        self.current_state()
            .map(|state| state.current_stage)
            .unwrap_or_default()
    }

    pub fn round_rx(&self) -> watch::Receiver<RoundStatus> {
        self.round_rx.clone()
    }
}
