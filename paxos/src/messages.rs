//! Paxos protocol messages

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{NodeId, ProposalNumber};

/// Values that can be agreed on.
pub trait Value: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T: Clone + fmt::Debug + Send + Sync + 'static> Value for T {}

/// A numbered value: what an acceptor accepts and what a learner decides.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Proposal<V> {
    pub n: ProposalNumber,
    pub value: V,
}

impl<V> Proposal<V> {
    pub fn new(n: ProposalNumber, value: V) -> Self {
        Self { n, value }
    }
}

/// Message kinds, without their fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Prepare,
    Promise,
    Propose,
    Accept,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Prepare => "prepare",
            Self::Promise => "promise",
            Self::Propose => "propose",
            Self::Accept => "accept",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Payload<V> {
    /// Phase 1a: proposer asks for a promise at `n`.
    Prepare { n: ProposalNumber },
    /// Phase 1b: acceptor promised `n` and discloses what it already accepted.
    Promise {
        n: ProposalNumber,
        accepted: Option<Proposal<V>>,
    },
    /// Phase 2a: proposer asks acceptors to accept `value` at `n`.
    Propose { n: ProposalNumber, value: V },
    /// Phase 2b: acceptor tells a learner it accepted `value` at `n`.
    Accept { n: ProposalNumber, value: V },
}

/// An addressed protocol message.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Message<V> {
    pub from: NodeId,
    pub to: NodeId,
    pub payload: Payload<V>,
}

impl<V> Message<V> {
    pub fn prepare(from: NodeId, to: NodeId, n: ProposalNumber) -> Self {
        Self {
            from,
            to,
            payload: Payload::Prepare { n },
        }
    }

    pub fn promise(
        from: NodeId,
        to: NodeId,
        n: ProposalNumber,
        accepted: Option<Proposal<V>>,
    ) -> Self {
        Self {
            from,
            to,
            payload: Payload::Promise { n, accepted },
        }
    }

    pub fn propose(from: NodeId, to: NodeId, n: ProposalNumber, value: V) -> Self {
        Self {
            from,
            to,
            payload: Payload::Propose { n, value },
        }
    }

    pub fn accept(from: NodeId, to: NodeId, n: ProposalNumber, value: V) -> Self {
        Self {
            from,
            to,
            payload: Payload::Accept { n, value },
        }
    }

    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self.payload {
            Payload::Prepare { .. } => MessageKind::Prepare,
            Payload::Promise { .. } => MessageKind::Promise,
            Payload::Propose { .. } => MessageKind::Propose,
            Payload::Accept { .. } => MessageKind::Accept,
        }
    }

    #[must_use]
    pub fn n(&self) -> ProposalNumber {
        match self.payload {
            Payload::Prepare { n }
            | Payload::Promise { n, .. }
            | Payload::Propose { n, .. }
            | Payload::Accept { n, .. } => n,
        }
    }

    /// Number of the previously accepted proposal disclosed by a promise,
    /// [`ProposalNumber::NONE`] for every other case.
    #[must_use]
    pub fn prev_n(&self) -> ProposalNumber {
        match &self.payload {
            Payload::Promise {
                accepted: Some(p), ..
            } => p.n,
            _ => ProposalNumber::NONE,
        }
    }

    /// The value carried by the message, if its kind has one.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        match &self.payload {
            Payload::Prepare { .. } | Payload::Promise { accepted: None, .. } => None,
            Payload::Promise {
                accepted: Some(p), ..
            } => Some(&p.value),
            Payload::Propose { value, .. } | Payload::Accept { value, .. } => Some(value),
        }
    }
}
