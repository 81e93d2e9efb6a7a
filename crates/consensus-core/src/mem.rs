//! In-memory implementations of the collaborator traits

use std::sync::Mutex;

use agora_util_error::BoxedErrorResult;

use crate::block::ProposedBlock;
use crate::effects::ConfirmBlock;
use crate::parliament::{Parliament, ParliamentRepository};

#[derive(Debug, Default)]
pub struct MemParliamentRepository {
    parliament: Mutex<Parliament>,
}

impl MemParliamentRepository {
    pub fn new(parliament: Parliament) -> Self {
        Self {
            parliament: Mutex::new(parliament),
        }
    }
}

impl ParliamentRepository for MemParliamentRepository {
    fn load(&self) -> Parliament {
        self.parliament.lock().expect("Locking failed").clone()
    }

    fn save(&self, parliament: Parliament) {
        *self.parliament.lock().expect("Locking failed") = parliament;
    }
}

/// Ledger keeping confirmed blocks in order of confirmation
#[derive(Debug, Default)]
pub struct MemLedger {
    blocks: Mutex<Vec<ProposedBlock>>,
}

impl MemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> Vec<ProposedBlock> {
        self.blocks.lock().expect("Locking failed").clone()
    }
}

impl ConfirmBlock for MemLedger {
    fn confirm_block(&self, block: &ProposedBlock) -> BoxedErrorResult<()> {
        self.blocks
            .lock()
            .expect("Locking failed")
            .push(block.clone());
        Ok(())
    }
}
