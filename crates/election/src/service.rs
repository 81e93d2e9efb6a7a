//! Election state of a single node

use core::fmt;
use std::collections::BTreeSet;

use agora_consensus_core::representative::{Representative, RepresentativeId};

use crate::config::ElectionConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ElectionState {
    /// Following, counting down towards a candidacy
    #[default]
    Ticking,
    /// Asking the others for votes
    Candidate,
    /// Voted in by everybody else
    Leader,
}

impl fmt::Display for ElectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElectionState::Ticking => "ticking",
            ElectionState::Candidate => "candidate",
            ElectionState::Leader => "leader",
        })
    }
}

/// Counters and flags of the election
///
/// Plain owned state: it does no locking and no I/O. [`crate::election::Election`]
/// keeps it behind a single mutex and is the only thing mutating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionService {
    node_id: RepresentativeId,
    state: ElectionState,
    /// Remaining countdown, in ticks
    left_time: u64,
    term: u64,
    /// Representatives that voted for our candidacy in the current term
    voters: BTreeSet<RepresentativeId>,
    /// Representative we voted for in the current term
    candidate: Option<Representative>,
    voted: bool,
}

impl ElectionService {
    pub fn new(node_id: RepresentativeId) -> Self {
        Self {
            node_id,
            state: ElectionState::Ticking,
            left_time: 0,
            term: 0,
            voters: BTreeSet::new(),
            candidate: None,
            voted: false,
        }
    }

    pub fn node_id(&self) -> &RepresentativeId {
        &self.node_id
    }

    pub fn state(&self) -> ElectionState {
        self.state
    }

    pub fn set_state(&mut self, state: ElectionState) {
        self.state = state;
    }

    pub fn left_time(&self) -> u64 {
        self.left_time
    }

    /// Start over as a follower: fresh countdown, no votes given or received
    ///
    /// The term is kept.
    pub fn init_left_time(&mut self, config: &ElectionConfig) {
        self.state = ElectionState::Ticking;
        self.voters.clear();
        self.candidate = None;
        self.voted = false;
        self.reset_left_time(config);
    }

    /// Draw a fresh countdown, leaving everything else as is
    pub fn reset_left_time(&mut self, config: &ElectionConfig) {
        self.left_time = config.new_rand_timeout_ticks();
    }

    /// Returns `true` if the countdown just reached zero
    pub fn count_down_left_time_by(&mut self, ticks: u64) -> bool {
        if self.left_time == 0 {
            return false;
        }
        self.left_time = self.left_time.saturating_sub(ticks);
        self.left_time == 0
    }

    pub fn term(&self) -> u64 {
        self.term
    }

    /// Move to a newer term, forgetting the vote given in the previous one
    pub fn observe_term(&mut self, term: u64) {
        if self.term < term {
            self.term = term;
            self.voted = false;
            self.candidate = None;
        }
    }

    /// Number of distinct voters for our candidacy
    pub fn vote_count(&self) -> usize {
        self.voters.len()
    }

    /// Returns `false` if `voter` already voted for us in this term
    pub fn add_voter(&mut self, voter: RepresentativeId) -> bool {
        self.voters.insert(voter)
    }

    pub fn candidate(&self) -> Option<&Representative> {
        self.candidate.as_ref()
    }

    pub fn set_candidate(&mut self, candidate: Representative) {
        self.candidate = Some(candidate);
    }

    pub fn voted(&self) -> bool {
        self.voted
    }

    pub fn set_voted(&mut self, voted: bool) {
        self.voted = voted;
    }

    /// Start a candidacy in the next term, voting for ourselves
    pub fn become_candidate(&mut self, config: &ElectionConfig) {
        self.state = ElectionState::Candidate;
        self.term += 1;
        self.voters.clear();
        self.candidate = Some(Representative::new(self.node_id.clone()));
        self.voted = true;
        self.reset_left_time(config);
    }
}

#[cfg(test)]
mod tests;
