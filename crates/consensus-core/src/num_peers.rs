use core::fmt;

use derive_more::From;

/// Size of a group of representatives and the quorum math derived from it
#[derive(Debug, Clone, Copy, From, PartialEq, Eq, PartialOrd, Ord)]
pub struct NumPeers(usize);

impl fmt::Display for NumPeers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl NumPeers {
    /// Total number of peers
    pub fn total(self) -> usize {
        self.0
    }

    /// Max number of faulty nodes
    pub fn max_faulty(self) -> usize {
        self.total().saturating_sub(1) / 3
    }

    /// Number of distinct votes required to advance a stage
    ///
    /// `n - f` is never less than a strict majority of `n`.
    pub fn threshold(self) -> usize {
        self.total() - self.max_faulty()
    }

    /// Number of peers other than ourselves
    pub fn others(self) -> usize {
        self.total().saturating_sub(1)
    }
}

pub trait ToNumPeers {
    fn to_num_peers(&self) -> NumPeers;
}

impl<T> ToNumPeers for [T] {
    fn to_num_peers(&self) -> NumPeers {
        NumPeers::from(self.len())
    }
}

impl<T> ToNumPeers for Vec<T> {
    fn to_num_peers(&self) -> NumPeers {
        self.as_slice().to_num_peers()
    }
}

#[test]
fn num_peers_sanity() {
    for (n, f, t) in [
        (1, 0, 1),
        (2, 0, 2),
        (3, 0, 3),
        (4, 1, 3),
        (5, 1, 4),
        (7, 2, 5),
    ] {
        let num = NumPeers::from(n);
        assert_eq!(n, num.total());
        assert_eq!(f, num.max_faulty());
        assert_eq!(t, num.threshold());
        assert!(n / 2 < num.threshold());
    }
}
