mod raft;

use std::sync::{Arc, Mutex, MutexGuard};

use agora_consensus_core::effects::{Deliver, DeliverCommand, Event, Publish};
use agora_consensus_core::msg::{UpdateLeaderMsg, VoteMsg};
use agora_consensus_core::parliament::{NotFoundError, ParliamentRepository};
use agora_consensus_core::representative::{Representative, RepresentativeId};
use agora_util_error::fmt::FmtCompact as _;
use snafu::Snafu;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::config::ElectionConfig;
use crate::service::{ElectionService, ElectionState};

const LOG_TARGET: &str = "agora::election";

#[derive(Debug, Snafu)]
pub enum ElectionError {
    #[snafu(transparent)]
    NotFound { source: NotFoundError },
    #[snafu(display("Already voted in term {term}"))]
    AlreadyVoted { term: u64 },
    #[snafu(display("Vote requested for term {term}, current term is {current}"))]
    StaleTerm { term: u64, current: u64 },
    #[snafu(display("{sender_id} announced {announced} as the leader"))]
    LeaderMismatch {
        sender_id: RepresentativeId,
        announced: RepresentativeId,
    },
}

pub type ElectionResult<T> = Result<T, ElectionError>;

pub struct Election {
    our_id: RepresentativeId,
    config: ElectionConfig,
    service: Mutex<ElectionService>,
    parliament_repo: Arc<dyn ParliamentRepository>,
    deliver: Arc<dyn Deliver>,
    publish: Arc<dyn Publish>,
    /// Set to `true` to stop the tick loop
    quit_tx: watch::Sender<bool>,
}

#[bon::bon]
impl Election {
    #[builder]
    pub fn new(
        #[builder(into)] our_id: RepresentativeId,
        #[builder(default)] config: ElectionConfig,
        parliament_repo: Arc<dyn ParliamentRepository>,
        deliver: Arc<dyn Deliver>,
        publish: Arc<dyn Publish>,
    ) -> Self {
        let (quit_tx, _) = watch::channel(true);
        Self {
            service: Mutex::new(ElectionService::new(our_id.clone())),
            our_id,
            config,
            parliament_repo,
            deliver,
            publish,
            quit_tx,
        }
    }
}

impl Election {
    fn lock_service(&self) -> MutexGuard<'_, ElectionService> {
        self.service.lock().expect("Locking failed")
    }

    fn send(&self, cmd: DeliverCommand) {
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

    fn publish_leader(&self, leader: RepresentativeId) {
        if let Err(err) = self.publish.publish(&Event::LeaderUpdated { leader }) {
            warn!(
                target: LOG_TARGET,
                err = %err.fmt_compact(),
                "Failed to publish leader update"
            );
        }
    }

    /// Vote for `candidate_id` asking for a vote in `term`
    ///
    /// A single vote is given per term. Voting pushes back our own
    /// countdown, and a candidate voting for somebody else gives up its own
    /// candidacy.
    #[instrument(skip_all, fields(candidate = %candidate_id, %term))]
    pub fn vote(&self, candidate_id: &RepresentativeId, term: u64) -> ElectionResult<()> {
        let candidate = self
            .parliament_repo
            .load()
            .find_representative_by_id(candidate_id)?;

        {
            let mut service = self.lock_service();

            if term < service.term() {
                return StaleTermSnafu {
                    term,
                    current: service.term(),
                }
                .fail();
            }
            service.observe_term(term);

            if service.voted() {
                return AlreadyVotedSnafu { term }.fail();
            }

            if service.state() == ElectionState::Candidate {
                debug!(target: LOG_TARGET, "Giving up candidacy");
                service.set_state(ElectionState::Ticking);
            }
            service.set_candidate(candidate);
            service.reset_left_time(&self.config);
            service.set_voted(true);
        }

        info!(target: LOG_TARGET, "Voting for a candidate");
        self.send(DeliverCommand::new(
            &VoteMsg { term },
            vec![candidate_id.clone()],
        ));
        Ok(())
    }

    /// Count a vote `voter_id` gave our candidacy in `term`
    ///
    /// Votes received while not a candidate, or for another term, are
    /// dropped, and so is a repeated vote of the same voter. Returns `true`
    /// if this vote made us the leader, which takes a vote from every other
    /// participant.
    #[instrument(skip_all, fields(voter = %voter_id, %term))]
    pub fn decide_to_be_leader(
        &self,
        voter_id: &RepresentativeId,
        term: u64,
    ) -> ElectionResult<bool> {
        let parliament = self.parliament_repo.load();
        parliament.find_representative_by_id(voter_id)?;
        let needed = parliament.num_participants().others();

        {
            let mut service = self.lock_service();

            if service.state() != ElectionState::Candidate {
                debug!(target: LOG_TARGET, state = %service.state(), "Not a candidate, dropping vote");
                return Ok(false);
            }
            if service.term() != term {
                debug!(target: LOG_TARGET, current = service.term(), "Vote for another term, dropping");
                return Ok(false);
            }
            if voter_id == &self.our_id {
                debug!(target: LOG_TARGET, "Our own vote, dropping");
                return Ok(false);
            }
            if !service.add_voter(voter_id.clone()) {
                debug!(target: LOG_TARGET, "Repeated vote, dropping");
                return Ok(false);
            }

            let vote_count = service.vote_count();
            if vote_count < needed {
                debug!(target: LOG_TARGET, %vote_count, %needed, "Received vote");
                return Ok(false);
            }
            service.set_state(ElectionState::Leader);
        }

        self.on_elected();
        Ok(true)
    }

    /// We got voted in: stop the countdown, take the lead and announce it
    fn on_elected(&self) {
        info!(target: LOG_TARGET, "Elected as the leader");
        self.end_raft();

        let mut parliament = self.parliament_repo.load();
        parliament.set_leader(self.our_id.clone());
        self.parliament_repo.save(parliament);

        self.publish_leader(self.our_id.clone());
        self.broadcast_leader(Representative::new(self.our_id.clone()));
    }

    /// Announce `rep` as the leader to everybody else
    pub fn broadcast_leader(&self, rep: Representative) {
        let recipients = self
            .parliament_repo
            .load()
            .recipients_except(&self.our_id);
        debug!(
            target: LOG_TARGET,
            leader = %rep,
            recipients = recipients.len(),
            "Broadcasting leader"
        );
        self.send(DeliverCommand::new(
            &UpdateLeaderMsg {
                representative: rep,
            },
            recipients,
        ));
    }

    /// Accept a leader announced by `sender_id`
    ///
    /// Only the new leader itself can announce its leadership. Ends our own
    /// election.
    #[instrument(skip_all, fields(sender = %sender_id, leader = %rep))]
    pub fn update_leader(
        &self,
        sender_id: &RepresentativeId,
        rep: Representative,
    ) -> ElectionResult<()> {
        let mut parliament = self.parliament_repo.load();
        parliament.find_representative_by_id(&rep.id)?;

        if sender_id != &rep.id {
            return LeaderMismatchSnafu {
                sender_id: sender_id.clone(),
                announced: rep.id,
            }
            .fail();
        }

        self.lock_service().init_left_time(&self.config);
        self.end_raft();

        parliament.set_leader(rep.id.clone());
        self.parliament_repo.save(parliament);

        info!(target: LOG_TARGET, "Leader updated");
        self.publish_leader(rep.id);
        Ok(())
    }

    pub fn our_id(&self) -> &RepresentativeId {
        &self.our_id
    }

    pub fn config(&self) -> &ElectionConfig {
        &self.config
    }

    pub fn state(&self) -> ElectionState {
        self.lock_service().state()
    }

    pub fn set_state(&self, state: ElectionState) {
        self.lock_service().set_state(state);
    }

    pub fn term(&self) -> u64 {
        self.lock_service().term()
    }

    pub fn vote_count(&self) -> usize {
        self.lock_service().vote_count()
    }

    pub fn candidate(&self) -> Option<Representative> {
        self.lock_service().candidate().cloned()
    }

    /// Copy of the whole election state
    pub fn service(&self) -> ElectionService {
        self.lock_service().clone()
    }
}

#[cfg(test)]
mod tests;
