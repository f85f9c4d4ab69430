//! Acceptor runtime

use std::convert::Infallible;

use error_stack::{Report, ResultExt};
use futures::future::join_all;
use tracing::{debug, instrument, trace, warn};

use crate::config::AcceptorConfig;
use crate::core::{AcceptorCore, PrepareResult, ProposeResult};
use crate::error::{AcceptorError, ProtocolViolation};
use crate::messages::{Message, Payload, Value};
use crate::network::Network;
use crate::numbering::{NodeId, ProposalNumber};

/// Acceptor role: answers prepares with promises, accepts proposals at the
/// promised number and notifies every registered learner of what it accepted.
pub struct Acceptor<V, N> {
    id: NodeId,
    network: N,
    learners: Vec<NodeId>,
    core: AcceptorCore<V>,
    config: AcceptorConfig,
}

impl<V: Value, N: Network<V>> Acceptor<V, N> {
    pub fn new(id: NodeId, network: N, learners: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            id,
            network,
            learners: learners.into_iter().collect(),
            core: AcceptorCore::new(),
            config: AcceptorConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AcceptorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> &AcceptorCore<V> {
        &self.core
    }

    /// Handle `Prepare{n}` from `from`. Returns the Promise to send back, or
    /// `None` if `n` is not above the current promise.
    pub fn receive_prepare(&mut self, from: NodeId, n: ProposalNumber) -> Option<Message<V>> {
        match self.core.prepare(n) {
            PrepareResult::Promised { n, accepted } => {
                debug!(%n, %from, prev_n = %self.core.accepted_n(), "promised");
                Some(Message::promise(self.id, from, n, accepted))
            }
            PrepareResult::Stale { promised } => {
                trace!(%n, %promised, %from, "ignored stale prepare");
                None
            }
        }
    }

    /// Handle `Propose{n, value}` from `from`. Returns the Accept
    /// notifications for the learners, empty if the proposal was stale.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolViolation`] if `n` is above the promised number.
    pub fn receive_propose(
        &mut self,
        from: NodeId,
        n: ProposalNumber,
        value: V,
    ) -> Result<Vec<Message<V>>, Report<ProtocolViolation>> {
        let result = self
            .core
            .propose(n, value)
            .attach(format!("acceptor: {}", self.id))
            .attach(format!("proposer: {from}"))?;
        match result {
            ProposeResult::Accepted(proposal) => {
                debug!(%n, %from, value = ?proposal.value, "accepted");
                Ok(self
                    .learners
                    .iter()
                    .map(|&to| Message::accept(self.id, to, proposal.n, proposal.value.clone()))
                    .collect())
            }
            ProposeResult::Stale { promised } => {
                trace!(%n, %promised, %from, "ignored stale proposal");
                Ok(Vec::new())
            }
        }
    }

    /// Dispatch one inbound message and return the messages to send.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolViolation`] for Promise/Accept messages (acceptors
    /// never receive those) and for proposals above the promise.
    pub fn handle(
        &mut self,
        message: Message<V>,
    ) -> Result<Vec<Message<V>>, Report<ProtocolViolation>> {
        let Message { from, payload, .. } = message;
        match payload {
            Payload::Prepare { n } => Ok(self.receive_prepare(from, n).into_iter().collect()),
            Payload::Propose { n, value } => self.receive_propose(from, n, value),
            other => Err(Report::new(ProtocolViolation)
                .attach(format!("acceptor {}: unexpected message from {from}", self.id))
                .attach(format!("{other:?}"))),
        }
    }

    /// Serve prepares and proposals until a protocol violation occurs.
    ///
    /// Replies that cannot be delivered (e.g. a learner that already decided
    /// and went away) are logged and dropped.
    ///
    /// # Errors
    ///
    /// Returns [`AcceptorError`] wrapping the [`ProtocolViolation`] that
    /// stopped the acceptor.
    #[instrument(skip_all, name = "acceptor", fields(id = %self.id))]
    pub async fn run(mut self) -> Result<Infallible, Report<AcceptorError>> {
        debug!(learners = ?self.learners, "acceptor started");
        loop {
            let Some(message) = self.network.recv(self.config.liveness_timeout).await else {
                trace!(promised = %self.core.promised(), "idle");
                continue;
            };

            let outbound = self.handle(message).change_context(AcceptorError)?;

            let network = &self.network;
            let results = join_all(outbound.into_iter().map(|m| network.send(m))).await;
            for err in results.into_iter().filter_map(Result::err) {
                warn!(error = ?err, "dropping undeliverable message");
            }
        }
    }
}
