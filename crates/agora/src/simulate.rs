//! A whole parliament running in one process over a [`LocalNetwork`]

use std::sync::Arc;
use std::time::Duration;

use agora_consensus_core::block::ProposedBlock;
use agora_consensus_core::mem::{MemLedger, MemParliamentRepository};
use agora_consensus_core::parliament::Parliament;
use agora_consensus_core::representative::{Representative, RepresentativeId};
use agora_node::Node;
use agora_node::event_bus::EventBus;
use agora_node::local_network::LocalNetwork;
use agora_util_error::WhateverResult;
use snafu::{OptionExt as _, ResultExt as _};
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tracing::info;

use crate::opts::SimulateOpts;

const LOG_TARGET: &str = "agora::simulate";
const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub(crate) async fn run(opts: SimulateOpts) -> WhateverResult<()> {
    let ids: Vec<RepresentativeId> = (0..opts.nodes)
        .map(|i| RepresentativeId::new(format!("node{i}")))
        .collect();

    let mut parliament = Parliament::new();
    for id in &ids {
        parliament.add_representative(Representative::new(id.clone()));
    }

    let network = LocalNetwork::new();
    let events = EventBus::new();
    let mut inbound_tasks = JoinSet::new();
    let mut nodes = vec![];

    for id in &ids {
        let (endpoint, inbox) = network.connect(id.clone());
        let node = Node::builder()
            .our_id(id.clone())
            .parliament_repo(Arc::new(MemParliamentRepository::new(parliament.clone())))
            .deliver(Arc::new(endpoint))
            .publish(Arc::new(events.clone()))
            .ledger(Arc::new(MemLedger::new()))
            .election_config(opts.election_config())
            .build();

        inbound_tasks.spawn(node.clone().run_inbound(inbox));
        nodes.push(node);
    }

    info!(target: LOG_TARGET, nodes = nodes.len(), "Starting elections");
    for node in &nodes {
        node.start_election();
    }

    let leader = timeout(opts.wait(), wait_for_agreed_leader(&nodes))
        .await
        .whatever_context("No leader agreed on in time")?;
    let leader_node = nodes
        .iter()
        .find(|node| node.our_id() == &leader)
        .whatever_context("Leader is not one of the nodes")?;
    info!(target: LOG_TARGET, %leader, "Leader agreed on");

    for i in 0..opts.blocks {
        let block = ProposedBlock::from_body(format!("block {i}").into_bytes());
        let state_id = leader_node
            .propose_block(block.clone())
            .await
            .whatever_context("Failed to propose a block")?;

        for node in &nodes {
            timeout(
                opts.wait(),
                node.consensus()
                    .round_rx()
                    .wait_for(|status| status.last_committed.as_ref() == Some(&state_id)),
            )
            .await
            .whatever_context("Block not confirmed in time")?
            .whatever_context("Consensus gone")?;
        }

        info!(
            target: LOG_TARGET,
            %state_id,
            block = %block.seal_short(),
            "Block confirmed by every node"
        );
    }

    for id in &ids {
        network.disconnect(id);
    }
    while inbound_tasks.join_next().await.is_some() {}

    Ok(())
}

/// Wait until every node recognizes the same leader
async fn wait_for_agreed_leader(nodes: &[Arc<Node>]) -> RepresentativeId {
    loop {
        let mut leaders = nodes.iter().map(|node| node.leader_id());
        if let Some(Some(first)) = leaders.next() {
            if leaders.all(|leader| leader.as_ref() == Some(&first)) {
                return first;
            }
        }
        sleep(POLL_INTERVAL).await;
    }
}
