use super::{ElectionService, ElectionState};
use crate::config::ElectionConfig;

#[test]
fn countdown_reaches_zero_once() {
    let config = ElectionConfig::default();
    let mut service = ElectionService::new("user0".into());
    service.init_left_time(&config);

    let start = service.left_time();
    assert!(0 < start);

    for _ in 1..start {
        assert!(!service.count_down_left_time_by(1));
    }
    assert!(service.count_down_left_time_by(1));
    assert_eq!(service.left_time(), 0);
    assert!(!service.count_down_left_time_by(1));
}

#[test]
fn candidacy_starts_new_term() {
    let config = ElectionConfig::default();
    let mut service = ElectionService::new("user0".into());
    service.init_left_time(&config);
    assert!(service.add_voter("user1".into()));
    assert!(!service.add_voter("user1".into()));
    assert_eq!(service.vote_count(), 1);

    service.become_candidate(&config);

    assert_eq!(service.state(), ElectionState::Candidate);
    assert_eq!(service.term(), 1);
    assert_eq!(service.vote_count(), 0);
    assert!(service.voted());
    assert_eq!(
        service.candidate().map(|c| c.id.clone()),
        Some("user0".into())
    );
    assert!(0 < service.left_time());
}

#[test]
fn newer_term_clears_vote() {
    let mut service = ElectionService::new("user0".into());
    service.set_voted(true);

    service.observe_term(0);
    assert!(service.voted());

    service.observe_term(3);
    assert!(!service.voted());
    assert_eq!(service.term(), 3);

    service.observe_term(2);
    assert_eq!(service.term(), 3);
}

#[test]
fn init_keeps_term() {
    let config = ElectionConfig::default();
    let mut service = ElectionService::new("user0".into());
    service.become_candidate(&config);

    service.init_left_time(&config);

    assert_eq!(service.state(), ElectionState::Ticking);
    assert_eq!(service.term(), 1);
    assert!(!service.voted());
    assert_eq!(service.candidate(), None);
}
