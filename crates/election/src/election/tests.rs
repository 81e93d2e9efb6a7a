use std::sync::{Arc, Mutex};
use std::time::Duration;

use agora_consensus_core::bincode::decode_whole;
use agora_consensus_core::effects::{Deliver, DeliverCommand, Event, Publish};
use agora_consensus_core::mem::MemParliamentRepository;
use agora_consensus_core::msg::{Protocol, RequestVoteMsg, UpdateLeaderMsg, VoteMsg};
use agora_consensus_core::parliament::{Parliament, ParliamentRepository as _};
use agora_consensus_core::representative::{Representative, RepresentativeId};
use agora_util_error::BoxedErrorResult;
use assert_matches::assert_matches;
use tokio::time::Instant;

use super::{Election, ElectionError};
use crate::config::ElectionConfig;
use crate::service::ElectionState;

#[derive(Default)]
struct RecordingDeliver {
    sent: Mutex<Vec<DeliverCommand>>,
}

impl RecordingDeliver {
    fn sent(&self, protocol: Protocol) -> Vec<DeliverCommand> {
        self.sent
            .lock()
            .expect("Locking failed")
            .iter()
            .filter(|cmd| cmd.protocol == protocol)
            .cloned()
            .collect()
    }
}

impl Deliver for RecordingDeliver {
    fn deliver(&self, cmd: DeliverCommand) -> BoxedErrorResult<()> {
        self.sent.lock().expect("Locking failed").push(cmd);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPublish {
    events: Mutex<Vec<Event>>,
}

impl Publish for RecordingPublish {
    fn publish(&self, event: &Event) -> BoxedErrorResult<()> {
        self.events.lock().expect("Locking failed").push(event.clone());
        Ok(())
    }
}

struct Fixture {
    election: Arc<Election>,
    parliament_repo: Arc<MemParliamentRepository>,
    deliver: Arc<RecordingDeliver>,
    publish: Arc<RecordingPublish>,
}

/// `user0` (us) to `user{n-1}`, no leader yet
fn setup(n: usize) -> Fixture {
    let mut parliament = Parliament::new();
    for i in 0..n {
        parliament.add_representative(Representative::new(format!("user{i}").as_str()));
    }

    let parliament_repo = Arc::new(MemParliamentRepository::new(parliament));
    let deliver = Arc::new(RecordingDeliver::default());
    let publish = Arc::new(RecordingPublish::default());

    let election = Election::builder()
        .our_id("user0")
        .parliament_repo(parliament_repo.clone())
        .deliver(deliver.clone())
        .publish(publish.clone())
        .build();

    Fixture {
        election: Arc::new(election),
        parliament_repo,
        deliver,
        publish,
    }
}

fn leader(fixture: &Fixture) -> Option<RepresentativeId> {
    fixture.parliament_repo.load().leader_id().cloned()
}

/// Feed a vote of member `voter` in `term`, returning whether it made us
/// the leader
fn vote_from(fixture: &Fixture, voter: &str, term: u64) -> bool {
    fixture
        .election
        .decide_to_be_leader(&voter.into(), term)
        .expect("vote from a member")
}

#[test_log::test]
fn leader_only_with_vote_from_everybody_else() {
    let fixture = setup(5);
    fixture.election.init_raft();

    fixture.election.handle_raft_timeout();
    assert_eq!(fixture.election.state(), ElectionState::Candidate);
    let term = fixture.election.term();
    assert_eq!(term, 1);

    let requests = fixture.deliver.sent(Protocol::RequestVote);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].recipients.len(), 4);
    let msg: RequestVoteMsg = decode_whole(&requests[0].body).expect("valid encoding");
    assert_eq!(msg.term, term);

    for (vote, voter) in ["user1", "user2", "user3"].into_iter().enumerate() {
        assert!(!vote_from(&fixture, voter, term));
        assert_eq!(fixture.election.vote_count(), vote + 1);
        assert_eq!(fixture.election.state(), ElectionState::Candidate);
        assert!(fixture.deliver.sent(Protocol::UpdateLeader).is_empty());
    }

    assert!(vote_from(&fixture, "user4", term));
    assert_eq!(fixture.election.state(), ElectionState::Leader);
    assert!(!fixture.election.is_raft_running());
    assert_eq!(leader(&fixture), Some("user0".into()));

    let updates = fixture.deliver.sent(Protocol::UpdateLeader);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].recipients.len(), 4);
    let msg: UpdateLeaderMsg = decode_whole(&updates[0].body).expect("valid encoding");
    assert_eq!(msg.representative, Representative::new("user0"));

    assert_eq!(
        *fixture.publish.events.lock().expect("Locking failed"),
        vec![Event::LeaderUpdated {
            leader: "user0".into()
        }]
    );

    // Late votes change nothing
    assert!(!vote_from(&fixture, "user1", term));
    assert_eq!(fixture.deliver.sent(Protocol::UpdateLeader).len(), 1);
}

#[test_log::test]
fn votes_outside_of_candidacy_are_dropped() {
    let fixture = setup(3);
    fixture.election.init_raft();

    assert!(!vote_from(&fixture, "user1", 0));
    assert_eq!(fixture.election.vote_count(), 0);
    assert_eq!(fixture.election.state(), ElectionState::Ticking);

    fixture.election.handle_raft_timeout();
    let term = fixture.election.term();

    // Vote from an earlier candidacy
    assert!(!vote_from(&fixture, "user1", term - 1));
    assert_eq!(fixture.election.vote_count(), 0);
}

#[test_log::test]
fn candidacy_times_out_back_to_ticking() {
    let fixture = setup(3);
    fixture.election.init_raft();

    fixture.election.handle_raft_timeout();
    vote_from(&fixture, "user1", 1);
    assert_eq!(fixture.election.state(), ElectionState::Candidate);

    fixture.election.handle_raft_timeout();
    let service = fixture.election.service();
    assert_eq!(service.state(), ElectionState::Ticking);
    assert_eq!(service.vote_count(), 0);
    assert!(!service.voted());
    assert!(0 < service.left_time());
    assert_eq!(service.term(), 1);

    fixture.election.handle_raft_timeout();
    assert_eq!(fixture.election.state(), ElectionState::Candidate);
    assert_eq!(fixture.election.term(), 2);
    assert_eq!(fixture.deliver.sent(Protocol::RequestVote).len(), 2);
}

#[test_log::test]
fn vote_once_per_term() {
    let fixture = setup(4);
    fixture.election.init_raft();

    assert_matches!(
        fixture.election.vote(&"stranger".into(), 1),
        Err(ElectionError::NotFound { .. })
    );

    fixture
        .election
        .vote(&"user1".into(), 1)
        .expect("first vote in term");
    let service = fixture.election.service();
    assert!(service.voted());
    assert_eq!(service.candidate(), Some(&Representative::new("user1")));

    let votes = fixture.deliver.sent(Protocol::VoteLeader);
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].recipients, vec![RepresentativeId::from("user1")]);
    let msg: VoteMsg = decode_whole(&votes[0].body).expect("valid encoding");
    assert_eq!(msg.term, 1);

    assert_matches!(
        fixture.election.vote(&"user2".into(), 1),
        Err(ElectionError::AlreadyVoted { term: 1 })
    );

    fixture
        .election
        .vote(&"user2".into(), 2)
        .expect("new term");
    assert_eq!(
        fixture.election.candidate(),
        Some(Representative::new("user2"))
    );

    assert_matches!(
        fixture.election.vote(&"user3".into(), 1),
        Err(ElectionError::StaleTerm {
            term: 1,
            current: 2
        })
    );
    assert_eq!(fixture.deliver.sent(Protocol::VoteLeader).len(), 2);
}

#[test_log::test]
fn candidate_yields_to_newer_term_only() {
    let fixture = setup(3);
    fixture.election.init_raft();
    fixture.election.handle_raft_timeout();
    assert_eq!(fixture.election.term(), 1);

    // Voted for ourselves in term 1
    assert_matches!(
        fixture.election.vote(&"user1".into(), 1),
        Err(ElectionError::AlreadyVoted { .. })
    );
    assert_eq!(fixture.election.state(), ElectionState::Candidate);

    fixture
        .election
        .vote(&"user1".into(), 2)
        .expect("newer term");
    assert_eq!(fixture.election.state(), ElectionState::Ticking);
    assert!(!vote_from(&fixture, "user2", 1));
}

#[test_log::test]
fn leader_announcement() {
    let fixture = setup(3);
    fixture.election.init_raft();
    fixture.election.handle_raft_timeout();

    assert_matches!(
        fixture
            .election
            .update_leader(&"stranger".into(), Representative::new("stranger")),
        Err(ElectionError::NotFound { .. })
    );
    assert_matches!(
        fixture
            .election
            .update_leader(&"user1".into(), Representative::new("user2")),
        Err(ElectionError::LeaderMismatch { .. })
    );
    assert_eq!(leader(&fixture), None);
    assert!(fixture.election.is_raft_running());

    fixture
        .election
        .update_leader(&"user2".into(), Representative::new("user2"))
        .expect("valid announcement");

    assert_eq!(leader(&fixture), Some("user2".into()));
    assert_eq!(fixture.election.state(), ElectionState::Ticking);
    assert!(!fixture.election.is_raft_running());
    assert_eq!(
        *fixture.publish.events.lock().expect("Locking failed"),
        vec![Event::LeaderUpdated {
            leader: "user2".into()
        }]
    );
}

#[test_log::test(tokio::test(start_paused = true))]
async fn lone_node_elects_itself() {
    let fixture = setup(1);
    let start = Instant::now();

    fixture.election.elect_leader_with_raft().await;

    assert_eq!(fixture.election.state(), ElectionState::Leader);
    assert_eq!(leader(&fixture), Some("user0".into()));
    assert!(start.elapsed() < ElectionConfig::default().timeout_max * 2);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn unanswered_candidacy_ends_at_hard_timeout() {
    let fixture = setup(2);
    let start = Instant::now();

    fixture.election.elect_leader_with_raft().await;

    assert!(ElectionConfig::default().hard_timeout <= start.elapsed());
    assert_ne!(fixture.election.state(), ElectionState::Leader);
    assert_eq!(leader(&fixture), None);
    assert!(!fixture.deliver.sent(Protocol::RequestVote).is_empty());
}

#[test_log::test(tokio::test(start_paused = true))]
async fn end_raft_stops_loop() {
    let fixture = setup(3);
    fixture.election.init_raft();

    let task = tokio::spawn({
        let election = fixture.election.clone();
        async move { election.run_raft().await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    fixture.election.end_raft();
    task.await.expect("no panic");

    // Stop requested before the loop started
    fixture.election.init_raft();
    fixture.election.end_raft();
    let start = Instant::now();
    fixture.election.run_raft().await;
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[test_log::test]
fn repeated_vote_counts_once() {
    let fixture = setup(3);
    fixture.election.init_raft();
    fixture.election.handle_raft_timeout();
    let term = fixture.election.term();

    assert!(!vote_from(&fixture, "user1", term));
    assert!(!vote_from(&fixture, "user1", term));
    assert_eq!(fixture.election.vote_count(), 1);
    assert_eq!(fixture.election.state(), ElectionState::Candidate);
    assert_eq!(leader(&fixture), None);

    // Our own vote is not one of the others
    assert!(!vote_from(&fixture, "user0", term));
    assert_eq!(fixture.election.vote_count(), 1);

    assert!(vote_from(&fixture, "user2", term));
    assert_eq!(leader(&fixture), Some("user0".into()));
}

#[test_log::test]
fn votes_from_outsiders_are_rejected() {
    let fixture = setup(3);
    fixture.election.init_raft();
    fixture.election.handle_raft_timeout();
    let term = fixture.election.term();

    for outsider in ["mallory", "eve"] {
        assert_matches!(
            fixture.election.decide_to_be_leader(&outsider.into(), term),
            Err(ElectionError::NotFound { .. })
        );
    }
    assert_eq!(fixture.election.vote_count(), 0);
    assert_eq!(fixture.election.state(), ElectionState::Candidate);
    assert_eq!(leader(&fixture), None);
}
