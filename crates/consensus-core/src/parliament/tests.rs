use assert_matches::assert_matches;

use super::{NotFoundError, Parliament};
use crate::representative::{Representative, RepresentativeId};

fn parliament_of(n: usize) -> Parliament {
    let mut parliament = Parliament::new();
    for i in 0..n {
        parliament.add_representative(Representative::new(format!("user{i}")));
    }
    parliament
}

#[test]
fn empty_parliament_has_no_leader() {
    let parliament = Parliament::new();

    assert!(!parliament.has_leader());
    assert_eq!(parliament.leader_id(), None);
    assert_eq!(parliament.num_participants().total(), 0);
}

#[test]
fn add_representative_is_noop_on_duplicate_id() {
    let mut parliament = Parliament::new();

    assert!(parliament.add_representative(Representative::new("user0")));
    assert!(!parliament.add_representative(Representative::new("user0")));
    assert_eq!(parliament.get_representatives().len(), 1);
}

#[test]
fn set_leader_moves_leader_out_of_members() {
    let mut parliament = parliament_of(5);
    parliament.set_leader("user0");

    assert!(parliament.has_leader());
    assert!(parliament.is_leader(&"user0".into()));
    assert_eq!(parliament.get_representatives().len(), 4);
    assert!(
        parliament
            .get_representatives()
            .iter()
            .all(|r| r.id != RepresentativeId::from("user0"))
    );
    assert_eq!(parliament.num_participants().total(), 5);

    // Re-electing demotes the previous leader back to a member
    parliament.set_leader("user3");
    assert!(parliament.is_leader(&"user3".into()));
    assert_eq!(parliament.get_representatives().len(), 4);
    assert!(parliament.contains(&"user0".into()));

    // Leader can not be added again as a member
    assert!(!parliament.add_representative(Representative::new("user3")));
}

#[test]
fn find_representative_by_id() {
    let mut parliament = parliament_of(3);
    parliament.set_leader("user1");

    assert_eq!(
        parliament.find_representative_by_id(&"user1".into()),
        Ok(Representative::new("user1"))
    );
    assert_eq!(
        parliament.find_representative_by_id(&"user2".into()),
        Ok(Representative::new("user2"))
    );
    assert_matches!(
        parliament.find_representative_by_id(&"nobody".into()),
        Err(NotFoundError { id }) if id == RepresentativeId::from("nobody")
    );
}

#[test]
fn removing_leader_clears_it() {
    let mut parliament = parliament_of(3);
    parliament.set_leader("user0");

    assert_eq!(
        parliament.remove_representative(&"user2".into()),
        Some(Representative::new("user2"))
    );
    assert!(parliament.has_leader());

    assert_eq!(
        parliament.remove_representative(&"user0".into()),
        Some(Representative::new("user0"))
    );
    assert!(!parliament.has_leader());
    assert_eq!(parliament.remove_representative(&"user0".into()), None);
    assert_eq!(parliament.num_participants().total(), 1);
}

#[test]
fn recipients_exclude_self() {
    let mut parliament = parliament_of(4);
    parliament.set_leader("user0");

    let recipients = parliament.recipients_except(&"user2".into());
    assert_eq!(recipients.len(), 3);
    assert!(!recipients.contains(&"user2".into()));
    assert!(recipients.contains(&"user0".into()));
}
