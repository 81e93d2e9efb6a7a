use snafu::Snafu;

use crate::num_peers::{NumPeers, ToNumPeers as _};
use crate::representative::{Representative, RepresentativeId};

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(display("Representative {id} is not a member of the parliament"))]
pub struct NotFoundError {
    pub id: RepresentativeId,
}

/// Fixed group of representatives plus the currently recognized leader
///
/// The leader is never part of [`Self::get_representatives`]; use
/// [`Self::participants`] for the whole group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parliament {
    leader: Option<Representative>,
    members: Vec<Representative>,
}

impl Parliament {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_leader(&self) -> bool {
        self.leader.is_some()
    }

    pub fn leader(&self) -> Option<&Representative> {
        self.leader.as_ref()
    }

    pub fn leader_id(&self) -> Option<&RepresentativeId> {
        self.leader.as_ref().map(|l| &l.id)
    }

    pub fn is_leader(&self, id: &RepresentativeId) -> bool {
        self.leader_id() == Some(id)
    }

    /// Make `id` the leader
    ///
    /// `id` leaves the member set, while the previous leader (if any) joins
    /// it.
    pub fn set_leader(&mut self, id: impl Into<RepresentativeId>) {
        let id = id.into();
        if self.is_leader(&id) {
            return;
        }

        self.members.retain(|m| m.id != id);
        if let Some(prev) = self.leader.replace(Representative::new(id)) {
            self.members.push(prev);
        }
    }

    /// Returns `false` if a representative with the same id is already there
    pub fn add_representative(&mut self, rep: Representative) -> bool {
        if self.contains(&rep.id) {
            return false;
        }
        self.members.push(rep);
        true
    }

    /// Remove a representative, clearing the leader if it was the one removed
    pub fn remove_representative(&mut self, id: &RepresentativeId) -> Option<Representative> {
        if self.is_leader(id) {
            return self.leader.take();
        }

        let idx = self.members.iter().position(|m| &m.id == id)?;
        Some(self.members.remove(idx))
    }

    pub fn find_representative_by_id(
        &self,
        id: &RepresentativeId,
    ) -> Result<Representative, NotFoundError> {
        self.leader
            .iter()
            .chain(self.members.iter())
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| NotFoundError { id: id.clone() })
    }

    pub fn contains(&self, id: &RepresentativeId) -> bool {
        self.find_representative_by_id(id).is_ok()
    }

    /// Members, leader excluded
    pub fn get_representatives(&self) -> &[Representative] {
        &self.members
    }

    /// Leader (if any) followed by all the members
    pub fn participants(&self) -> Vec<Representative> {
        self.leader
            .iter()
            .chain(self.members.iter())
            .cloned()
            .collect()
    }

    pub fn num_participants(&self) -> NumPeers {
        self.participants().to_num_peers()
    }

    /// Ids of every participant except `id`, to address a broadcast
    pub fn recipients_except(&self, id: &RepresentativeId) -> Vec<RepresentativeId> {
        self.leader
            .iter()
            .chain(self.members.iter())
            .filter(|r| &r.id != id)
            .map(|r| r.id.clone())
            .collect()
    }
}

/// Storage of the node's view of the parliament
///
/// Implementations are expected to be thread-safe, `load` returns a
/// consistent snapshot and `save` is last-writer-wins.
pub trait ParliamentRepository: Send + Sync {
    fn load(&self) -> Parliament;
    fn save(&self, parliament: Parliament);
}

#[cfg(test)]
mod tests;
