//! Pure proposer state machine - no I/O, no async
//!
//! Tracks the current proposal number, the candidate value and the latest
//! promise from each targeted acceptor. The runtime decides when to call
//! [`ProposerCore::prepare`] (start or timeout) and when to move to phase 2.

use std::collections::BTreeMap;

use crate::core::quorum::majority;
use crate::messages::{Message, Proposal};
use crate::numbering::{NodeId, ProposalNumber};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProposerCore<V> {
    node: NodeId,
    round: u32,
    /// Current proposal number, `NONE` before the first prepare
    number: ProposalNumber,
    /// Value being proposed (or adopted from a disclosed proposal)
    value: V,
    /// Number of the disclosure `value` was adopted from
    value_n: ProposalNumber,
    /// Target acceptors, sorted
    acceptors: Vec<NodeId>,
    /// Number of the latest promise received from each target
    promises: BTreeMap<NodeId, ProposalNumber>,
    quorum: usize,
}

/// Result of handling a Promise
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromiseResult {
    /// Recorded; `adopted` tells whether the candidate value changed
    Recorded { adopted: bool },
    /// Not newer than the last promise from this acceptor
    Stale,
    /// Sender is not one of the targeted acceptors
    Unknown,
}

impl<V: Clone> ProposerCore<V> {
    pub fn new(node: NodeId, value: V, acceptors: impl IntoIterator<Item = NodeId>) -> Self {
        let promises: BTreeMap<_, _> = acceptors
            .into_iter()
            .map(|id| (id, ProposalNumber::NONE))
            .collect();
        let acceptors: Vec<_> = promises.keys().copied().collect();
        Self {
            node,
            round: 0,
            number: ProposalNumber::NONE,
            value,
            value_n: ProposalNumber::NONE,
            quorum: majority(acceptors.len()),
            acceptors,
            promises,
        }
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub fn number(&self) -> ProposalNumber {
        self.number
    }

    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    #[must_use]
    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Start a new phase 1 attempt.
    ///
    /// Bumps the round, recomputes the proposal number and returns Prepare
    /// messages for a majority-sized subset of the targets. The subset
    /// rotates with the round (offset by this proposer's identity), so a
    /// retry after a timeout tries a different set of acceptors.
    pub fn prepare(&mut self) -> Vec<Message<V>> {
        self.round += 1;
        self.number = ProposalNumber::new(self.round, self.node);
        self.subset()
            .map(|to| Message::prepare(self.node, to, self.number))
            .collect()
    }

    fn subset(&self) -> impl Iterator<Item = NodeId> + '_ {
        let len = self.acceptors.len();
        let offset = if len == 0 {
            0
        } else {
            (self.round as usize + self.node.0 as usize) % len
        };
        self.acceptors
            .iter()
            .cycle()
            .skip(offset)
            .take(self.quorum.min(len))
            .copied()
    }

    /// Handle a Promise from `from`.
    ///
    /// Only a promise newer than the last one from the same acceptor is
    /// recorded. If it discloses an accepted proposal numbered above every
    /// disclosure seen so far, its value replaces the candidate value.
    pub fn receive_promise(
        &mut self,
        from: NodeId,
        n: ProposalNumber,
        accepted: Option<Proposal<V>>,
    ) -> PromiseResult {
        let Some(last) = self.promises.get_mut(&from) else {
            return PromiseResult::Unknown;
        };
        if n <= *last {
            return PromiseResult::Stale;
        }
        *last = n;

        let adopted = match accepted {
            Some(prev) if !prev.n.is_none() && prev.n > self.value_n => {
                self.value_n = prev.n;
                self.value = prev.value;
                true
            }
            _ => false,
        };
        PromiseResult::Recorded { adopted }
    }

    /// Acceptors whose latest promise is for the current number.
    pub fn promised(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.promises
            .iter()
            .filter(|(_, n)| !self.number.is_none() && **n == self.number)
            .map(|(id, _)| *id)
    }

    #[must_use]
    pub fn majority_reached(&self) -> bool {
        self.promised().count() >= self.quorum
    }

    /// Phase 2: Propose messages for the acceptors that promised the current
    /// number (a majority-sized subset). Empty until a majority promised.
    #[must_use]
    pub fn propose(&self) -> Vec<Message<V>> {
        if !self.majority_reached() {
            return Vec::new();
        }
        self.promised()
            .take(self.quorum)
            .map(|to| Message::propose(self.node, to, self.number, self.value.clone()))
            .collect()
    }
}
