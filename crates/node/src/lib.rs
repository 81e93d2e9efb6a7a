//! Agora Node
//!
//! A node is one representative of the parliament. It owns the consensus
//! state machine and the leader election of that representative, feeds them
//! the messages received from the other representatives and reacts to
//! membership changes reported by the transport.
//!
//! Transport, event bus and ledger are injected. [`local_network`] and
//! [`event_bus`] provide in-process implementations, enough to run a whole
//! parliament in a single process.
pub mod event_bus;
mod handle_message;
pub mod local_network;
mod membership;

use std::sync::{Arc, Mutex};

use agora_consensus::consensus::{Consensus, ConsensusError};
use agora_consensus::mem::MemStateRepository;
use agora_consensus::state::StateRepository;
use agora_consensus_core::block::ProposedBlock;
use agora_consensus_core::effects::{ConfirmBlock, Deliver, Publish};
use agora_consensus_core::msg::Protocol;
use agora_consensus_core::parliament::{Parliament, ParliamentRepository};
use agora_consensus_core::representative::RepresentativeId;
use agora_consensus_core::state_id::StateId;
use agora_election::config::ElectionConfig;
use agora_election::election::{Election, ElectionError};
use bincode::error::DecodeError;
pub use handle_message::InboundMsg;
use n0_future::task::AbortOnDropHandle;
use snafu::Snafu;
use tracing::{Level, info, instrument};

const LOG_TARGET: &str = "agora::node";

#[derive(Debug, Snafu)]
pub enum NodeError {
    #[snafu(display("Invalid {protocol} message from {sender}"))]
    Decode {
        protocol: Protocol,
        sender: RepresentativeId,
        source: DecodeError,
    },
    #[snafu(display("Message from {sender} claims to be sent by {claimed}"))]
    SenderMismatch {
        sender: RepresentativeId,
        claimed: RepresentativeId,
    },
    #[snafu(transparent)]
    Consensus { source: ConsensusError },
    #[snafu(transparent)]
    Election { source: ElectionError },
}

pub type NodeResult<T> = Result<T, NodeError>;

pub struct Node {
    our_id: RepresentativeId,
    parliament_repo: Arc<dyn ParliamentRepository>,
    publish: Arc<dyn Publish>,

    /// Block agreement
    consensus: Arc<Consensus>,
    /// Leader election
    election: Arc<Election>,
    /// Election tick loop, if one was started
    election_task: Mutex<Option<AbortOnDropHandle<()>>>,
}

#[bon::bon]
impl Node {
    #[builder]
    pub fn new(
        #[builder(into)] our_id: RepresentativeId,
        parliament_repo: Arc<dyn ParliamentRepository>,
        // in-memory if not set
        state_repo: Option<Arc<dyn StateRepository>>,
        deliver: Arc<dyn Deliver>,
        publish: Arc<dyn Publish>,
        ledger: Arc<dyn ConfirmBlock>,
        #[builder(default)] election_config: ElectionConfig,
    ) -> Arc<Self> {
        let state_repo: Arc<dyn StateRepository> = match state_repo {
            Some(state_repo) => state_repo,
            None => Arc::new(MemStateRepository::new()),
        };

        let consensus = Consensus::builder()
            .our_id(our_id.clone())
            .parliament_repo(parliament_repo.clone())
            .state_repo(state_repo)
            .deliver(deliver.clone())
            .publish(publish.clone())
            .ledger(ledger)
            .build();

        let election = Election::builder()
            .our_id(our_id.clone())
            .config(election_config)
            .parliament_repo(parliament_repo.clone())
            .deliver(deliver)
            .publish(publish.clone())
            .build();

        info!(target: LOG_TARGET, %our_id, "Node created");

        Arc::new(Self {
            our_id,
            parliament_repo,
            publish,
            consensus: Arc::new(consensus),
            election: Arc::new(election),
            election_task: Mutex::new(None),
        })
    }
}

impl Node {
    /// Start (or restart) electing a leader in the background
    pub fn start_election(&self) {
        self.election.init_raft();

        let election = self.election.clone();
        let task = AbortOnDropHandle::new(tokio::spawn(async move {
            election.run_raft().await;
        }));

        // Replacing the handle aborts the previous loop
        *self.election_task.lock().expect("Locking failed") = Some(task);
        info!(target: LOG_TARGET, "Election started");
    }

    /// Put `block` to a vote, if we are the leader
    #[instrument(skip_all, fields(block = %block.seal_short()), ret(level = Level::DEBUG))]
    pub async fn propose_block(&self, block: ProposedBlock) -> NodeResult<StateId> {
        Ok(self.consensus.start_consensus(block).await?)
    }

    pub fn our_id(&self) -> &RepresentativeId {
        &self.our_id
    }

    pub fn is_leader(&self) -> bool {
        self.parliament_repo.load().is_leader(&self.our_id)
    }

    pub fn leader_id(&self) -> Option<RepresentativeId> {
        self.parliament_repo.load().leader_id().cloned()
    }

    pub fn parliament(&self) -> Parliament {
        self.parliament_repo.load()
    }

    pub fn consensus(&self) -> &Arc<Consensus> {
        &self.consensus
    }

    pub fn election(&self) -> &Arc<Election> {
        &self.election
    }
}
