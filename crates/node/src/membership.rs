use agora_consensus_core::effects::Event;
use agora_consensus_core::representative::{Representative, RepresentativeId};
use agora_util_error::fmt::FmtCompact as _;
use tracing::{info, warn};

use crate::{LOG_TARGET, Node};

impl Node {
    /// A connection to `id` got established
    ///
    /// Returns `false` if `id` was already a member.
    pub fn on_connection_created(&self, id: RepresentativeId) -> bool {
        let mut parliament = self.parliament_repo.load();
        if !parliament.add_representative(Representative::new(id.clone())) {
            return false;
        }
        self.parliament_repo.save(parliament);

        info!(target: LOG_TARGET, %id, "Representative joined");
        true
    }

    /// The connection to `id` is gone
    ///
    /// Losing the leader abandons the round in flight and starts a new
    /// election.
    pub async fn on_connection_closed(&self, id: &RepresentativeId) {
        let mut parliament = self.parliament_repo.load();
        let was_leader = parliament.is_leader(id);
        if parliament.remove_representative(id).is_none() {
            return;
        }
        self.parliament_repo.save(parliament);

        info!(target: LOG_TARGET, %id, %was_leader, "Representative left");
        if let Err(err) = self.publish.publish(&Event::NodeDeleted { id: id.clone() }) {
            warn!(
                target: LOG_TARGET,
                err = %err.fmt_compact(),
                "Failed to publish node deletion"
            );
        }

        if was_leader {
            warn!(target: LOG_TARGET, "Lost the leader, electing a new one");
            self.consensus.abandon_round().await;
            self.start_election();
        }
    }
}
