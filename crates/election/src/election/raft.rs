use agora_consensus_core::effects::DeliverCommand;
use agora_consensus_core::msg::RequestVoteMsg;
use agora_consensus_core::representative::RepresentativeId;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{Election, LOG_TARGET};
use crate::service::ElectionState;

impl Election {
    /// Start counting down from a fresh random timeout
    ///
    /// Must precede [`Self::run_raft`]. A stop requested with
    /// [`Self::end_raft`] afterwards is not lost, even if the loop did not
    /// start yet.
    pub fn init_raft(&self) {
        self.lock_service().init_left_time(&self.config);
        self.quit_tx.send_replace(false);
    }

    /// Run the countdown until stopped or for at most the hard timeout
    ///
    /// Reaching the hard timeout is not an error: the node simply stays
    /// without a leader until the election is started again.
    pub async fn run_raft(&self) {
        let mut quit_rx = self.quit_tx.subscribe();
        let mut interval = time::interval(self.config.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let hard_timeout = time::sleep(self.config.hard_timeout);
        tokio::pin!(hard_timeout);

        loop {
            tokio::select! {
                _ = quit_rx.wait_for(|quit| *quit) => {
                    info!(target: LOG_TARGET, "Election loop ended");
                    return;
                }
                () = &mut hard_timeout => {
                    warn!(
                        target: LOG_TARGET,
                        hard_timeout_secs = self.config.hard_timeout.as_secs(),
                        state = %self.state(),
                        "Election loop timed out"
                    );
                    return;
                }
                _ = interval.tick() => {
                    self.tick();
                }
            }
        }
    }

    /// [`Self::init_raft`] followed by [`Self::run_raft`]
    pub async fn elect_leader_with_raft(&self) {
        self.init_raft();
        self.run_raft().await;
    }

    pub fn end_raft(&self) {
        self.quit_tx.send_replace(true);
    }

    pub fn is_raft_running(&self) -> bool {
        !*self.quit_tx.borrow()
    }

    fn tick(&self) {
        let timed_out = self.lock_service().count_down_left_time_by(1);
        if timed_out {
            self.handle_raft_timeout();
        }
    }

    /// Countdown ran out
    ///
    /// A follower becomes a candidate in the next term and asks for votes. A
    /// candidate that did not collect enough of them goes back to counting
    /// down.
    pub fn handle_raft_timeout(&self) {
        let parliament = self.parliament_repo.load();
        let peers = parliament.recipients_except(&self.our_id);

        let term = {
            let mut service = self.lock_service();
            match service.state() {
                ElectionState::Ticking => {
                    service.become_candidate(&self.config);
                    if peers.is_empty() {
                        service.set_state(ElectionState::Leader);
                    }
                    service.term()
                }
                ElectionState::Candidate => {
                    debug!(
                        target: LOG_TARGET,
                        term = service.term(),
                        vote_count = service.vote_count(),
                        "Candidacy timed out"
                    );
                    service.init_left_time(&self.config);
                    return;
                }
                ElectionState::Leader => return,
            }
        };

        if peers.is_empty() {
            // Nobody else to ask
            self.on_elected();
            return;
        }

        info!(target: LOG_TARGET, %term, "Becoming a candidate");
        self.request_vote_in_term(peers, term);
    }

    /// Ask `peers` to vote for us in the current term
    pub fn request_vote(&self, peers: Vec<RepresentativeId>) {
        let term = self.term();
        self.request_vote_in_term(peers, term);
    }

    fn request_vote_in_term(&self, peers: Vec<RepresentativeId>, term: u64) {
        debug!(
            target: LOG_TARGET,
            %term,
            peers = peers.len(),
            "Requesting votes"
        );
        self.send(DeliverCommand::new(&RequestVoteMsg { term }, peers));
    }
}
