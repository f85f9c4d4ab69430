//! Proposal numbering
//!
//! A proposal number packs a round counter above the proposer identity, so
//! numbers from one proposer grow with its round and two proposers can never
//! produce the same number.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity of an agent (acceptor, proposer or learner).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct NodeId(pub u32);

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Totally ordered proposal number.
///
/// The round occupies the upper 32 bits and the proposer identity the lower
/// 32 bits, so ordering is by round first and identity second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ProposalNumber(u64);

impl ProposalNumber {
    /// Sentinel meaning "no proposal".
    pub const NONE: Self = Self(0);

    const NODE_BITS: u32 = u32::BITS;

    /// Number for `node` at `round`. Never [`NONE`](Self::NONE) for `round >= 1`.
    #[must_use]
    pub const fn new(round: u32, node: NodeId) -> Self {
        Self(((round as u64) << Self::NODE_BITS) | node.0 as u64)
    }

    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub const fn round(self) -> u32 {
        (self.0 >> Self::NODE_BITS) as u32
    }

    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub const fn node(self) -> NodeId {
        NodeId(self.0 as u32)
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProposalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("none");
        }
        write!(f, "{}.{}", self.round(), self.node())
    }
}
