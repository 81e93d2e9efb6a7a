use core::fmt;

use bincode::{Decode, Encode};
use derive_more::{Display, From};

/// Identifier of a single consensus round
///
/// Two messages belong to the same round iff their `StateId`s are equal.
#[derive(Encode, Decode, From, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(String);

impl StateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random id for a round started locally
    pub fn generate() -> Self {
        let bytes: [u8; 10] = rand::random();
        Self(data_encoding::BASE32_DNSCURVE.encode(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StateId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[test]
fn generated_ids_differ() {
    let a = StateId::generate();
    let b = StateId::generate();

    assert_eq!(a.as_str().len(), 16);
    assert_ne!(a, b);
}
