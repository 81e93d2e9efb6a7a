use std::sync::Mutex;

use crate::state::{State, StateRepoError, StateRepoResult, StateRepository};

/// [`StateRepository`] holding the round in memory
#[derive(Debug, Default)]
pub struct MemStateRepository {
    state: Mutex<Option<State>>,
}

impl MemStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().expect("Locking failed").is_none()
    }
}

impl StateRepository for MemStateRepository {
    fn load(&self) -> StateRepoResult<State> {
        self.state
            .lock()
            .expect("Locking failed")
            .clone()
            .ok_or(StateRepoError::EmptyRepo)
    }

    fn save(&self, state: State) -> StateRepoResult<()> {
        let mut stored = self.state.lock().expect("Locking failed");

        if let Some(existing) = stored.as_ref() {
            if existing.state_id != state.state_id {
                return Err(StateRepoError::InvalidSave {
                    state_id: state.state_id,
                    stored: existing.state_id.clone(),
                });
            }
        }

        *stored = Some(state);
        Ok(())
    }

    fn remove(&self) -> Option<State> {
        self.state.lock().expect("Locking failed").take()
    }
}
