//! Pure acceptor state machine - no I/O, no async, no synchronization
//!
//! The acceptor is the safety anchor of Paxos. It tracks:
//! - The highest proposal number it has promised not to undercut
//! - The highest-numbered proposal it has accepted, if any
//!
//! Both only ever grow, and the accepted number never exceeds the promise.

use error_stack::Report;

use crate::error::ProtocolViolation;
use crate::messages::Proposal;
use crate::numbering::ProposalNumber;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AcceptorCore<V> {
    promised: ProposalNumber,
    accepted: Option<Proposal<V>>,
}

/// Result of handling a Prepare request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrepareResult<V> {
    /// Promised `n`; carries the previously accepted proposal to disclose
    Promised {
        n: ProposalNumber,
        accepted: Option<Proposal<V>>,
    },
    /// Not above the current promise - no reply is sent
    Stale { promised: ProposalNumber },
}

/// Result of handling a Propose request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProposeResult<V> {
    /// Accepted; learners must be notified of this proposal
    Accepted(Proposal<V>),
    /// Below the current promise - dropped
    Stale { promised: ProposalNumber },
}

impl<V> Default for AcceptorCore<V> {
    fn default() -> Self {
        Self {
            promised: ProposalNumber::NONE,
            accepted: None,
        }
    }
}

impl<V: Clone> AcceptorCore<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn promised(&self) -> ProposalNumber {
        self.promised
    }

    #[must_use]
    pub fn accepted(&self) -> Option<&Proposal<V>> {
        self.accepted.as_ref()
    }

    /// Number of the accepted proposal, [`ProposalNumber::NONE`] if nothing
    /// was accepted yet.
    #[must_use]
    pub fn accepted_n(&self) -> ProposalNumber {
        self.accepted.as_ref().map_or(ProposalNumber::NONE, |p| p.n)
    }

    /// Handle a Prepare request.
    ///
    /// Promises `n` only if it is strictly above every earlier promise. A
    /// successful promise discloses the accepted proposal, so a later
    /// proposer cannot pick a conflicting value.
    pub fn prepare(&mut self, n: ProposalNumber) -> PrepareResult<V> {
        if n <= self.promised {
            return PrepareResult::Stale {
                promised: self.promised,
            };
        }
        self.promised = n;
        PrepareResult::Promised {
            n,
            accepted: self.accepted.clone(),
        }
    }

    /// Handle a Propose request.
    ///
    /// Accepts only at exactly the promised number.
    ///
    /// # Errors
    ///
    /// A proposal above the promise means a proposer skipped phase 1 with
    /// this acceptor. That is reported as a [`ProtocolViolation`] and the
    /// state is left untouched.
    pub fn propose(
        &mut self,
        n: ProposalNumber,
        value: V,
    ) -> Result<ProposeResult<V>, Report<ProtocolViolation>> {
        if n < self.promised {
            return Ok(ProposeResult::Stale {
                promised: self.promised,
            });
        }
        if n > self.promised {
            return Err(Report::new(ProtocolViolation)
                .attach(format!("propose {n} above promised {}", self.promised)));
        }
        let proposal = Proposal::new(n, value);
        self.accepted = Some(proposal.clone());
        Ok(ProposeResult::Accepted(proposal))
    }
}
