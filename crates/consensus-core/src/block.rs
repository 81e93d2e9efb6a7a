use core::fmt;

use bincode::{Decode, Encode};

/// A block put to a vote in a consensus round
///
/// Content is opaque to the consensus, `seal` identifies the block and is
/// what prevotes refer to.
#[derive(Encode, Decode, Clone, Debug, Default, PartialEq, Eq)]
pub struct ProposedBlock {
    pub seal: Vec<u8>,
    pub body: Vec<u8>,
}

impl ProposedBlock {
    pub fn new(seal: impl Into<Vec<u8>>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            seal: seal.into(),
            body: body.into(),
        }
    }

    /// Create a block sealed with the blake3 hash of its `body`
    pub fn from_body(body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self {
            seal: blake3::hash(&body).as_bytes().to_vec(),
            body,
        }
    }

    /// A block can enter a round only with both seal and body set
    pub fn is_valid(&self) -> bool {
        !self.seal.is_empty() && !self.body.is_empty()
    }

    pub fn seal_short(&self) -> BlockSealShort<'_> {
        BlockSealShort(&self.seal)
    }
}

pub struct BlockSealShort<'a>(&'a [u8]);

impl fmt::Display for BlockSealShort<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<empty>");
        }
        let prefix = &self.0[..self.0.len().min(4)];
        f.write_fmt(format_args!(
            "{}",
            data_encoding::HEXLOWER.encode_display(prefix)
        ))?;
        if prefix.len() < self.0.len() {
            f.write_str("…")?;
        }
        Ok(())
    }
}
