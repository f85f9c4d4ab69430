//! Pure learner state machine - quorum detection over Accept notifications

use std::collections::BTreeMap;

use crate::core::quorum::majority;
use crate::messages::Proposal;
use crate::numbering::{NodeId, ProposalNumber};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LearnerCore<V> {
    /// Latest Accept reported by each tracked acceptor
    accepts: BTreeMap<NodeId, Option<Proposal<V>>>,
    quorum: usize,
}

impl<V: Clone> LearnerCore<V> {
    pub fn new(acceptors: impl IntoIterator<Item = NodeId>) -> Self {
        let accepts: BTreeMap<_, _> = acceptors.into_iter().map(|id| (id, None)).collect();
        Self {
            quorum: majority(accepts.len()),
            accepts,
        }
    }

    #[must_use]
    pub fn quorum(&self) -> usize {
        self.quorum
    }

    #[must_use]
    pub fn tracks(&self, acceptor: NodeId) -> bool {
        self.accepts.contains_key(&acceptor)
    }

    /// Latest Accept recorded for `acceptor`.
    #[must_use]
    pub fn accepted_by(&self, acceptor: NodeId) -> Option<&Proposal<V>> {
        self.accepts.get(&acceptor).and_then(Option::as_ref)
    }

    /// Record an Accept from `from`.
    ///
    /// Returns `true` if the stored entry changed. Repeated, stale and
    /// untracked Accepts leave the state as it was.
    pub fn receive_accept(&mut self, from: NodeId, n: ProposalNumber, value: V) -> bool {
        let Some(entry) = self.accepts.get_mut(&from) else {
            return false;
        };
        let last = entry.as_ref().map_or(ProposalNumber::NONE, |p| p.n);
        if n <= last {
            return false;
        }
        *entry = Some(Proposal::new(n, value));
        true
    }

    /// The proposal accepted by a majority of tracked acceptors, if any.
    #[must_use]
    pub fn chosen(&self) -> Option<&Proposal<V>> {
        let mut counts: BTreeMap<ProposalNumber, (usize, &Proposal<V>)> = BTreeMap::new();
        for proposal in self.accepts.values().flatten() {
            let entry = counts.entry(proposal.n).or_insert((0, proposal));
            entry.0 += 1;
        }
        counts
            .into_values()
            .find(|(count, _)| *count >= self.quorum)
            .map(|(_, proposal)| proposal)
    }
}
