use core::fmt;

use bincode::{Decode, Encode};
use derive_more::{Display, From};

/// Opaque identity of a representative (its connection id)
#[derive(Encode, Decode, From, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepresentativeId(String);

impl RepresentativeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RepresentativeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Debug for RepresentativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One addressable member of the parliament
///
/// Immutable once created, two representatives are equal iff their ids are.
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Representative {
    pub id: RepresentativeId,
}

impl Representative {
    pub fn new(id: impl Into<RepresentativeId>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for Representative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}
