//! Learner runtime - waits for a quorum of matching Accept notifications

use error_stack::{Report, ResultExt};
use tracing::{debug, instrument, trace, warn};

use crate::config::LearnerConfig;
use crate::core::LearnerCore;
use crate::error::{LearnerError, ProtocolViolation};
use crate::messages::{Message, Payload, Proposal, Value};
use crate::network::Network;
use crate::numbering::NodeId;

pub struct Learner<V, N> {
    id: NodeId,
    network: N,
    core: LearnerCore<V>,
    config: LearnerConfig,
}

impl<V: Value, N: Network<V>> Learner<V, N> {
    pub fn new(id: NodeId, network: N, acceptors: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            id,
            network,
            core: LearnerCore::new(acceptors),
            config: LearnerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: LearnerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> &LearnerCore<V> {
        &self.core
    }

    /// Record one inbound message. Returns the decided proposal once a
    /// majority of tracked acceptors accepted the same number.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolViolation`] for anything but an Accept.
    pub fn receive(
        &mut self,
        message: Message<V>,
    ) -> Result<Option<&Proposal<V>>, Report<ProtocolViolation>> {
        let Message { from, payload, .. } = message;
        let Payload::Accept { n, value } = payload else {
            return Err(Report::new(ProtocolViolation)
                .attach(format!("learner {}: expected an accept", self.id))
                .attach(format!("sender: {from}")));
        };

        if self.core.receive_accept(from, n, value) {
            trace!(%n, %from, "recorded accept");
        } else if self.core.tracks(from) {
            trace!(%n, %from, "ignored stale accept");
        } else {
            warn!(%n, %from, "accept from untracked acceptor");
        }
        Ok(self.core.chosen())
    }

    /// Wait until a value is chosen and return it.
    ///
    /// Consumes the learner: a decision is reported exactly once. There is no
    /// "not decided yet" outcome; without progress this keeps waiting.
    ///
    /// # Errors
    ///
    /// Returns [`LearnerError`] if a message other than an Accept arrives.
    #[instrument(skip_all, name = "learner", fields(id = %self.id))]
    pub async fn learn(mut self) -> Result<Proposal<V>, Report<LearnerError>> {
        debug!(quorum = self.core.quorum(), "learner started");
        loop {
            let Some(message) = self.network.recv(self.config.liveness_timeout).await else {
                trace!("idle");
                continue;
            };
            if let Some(chosen) = self.receive(message).change_context(LearnerError)? {
                debug!(n = %chosen.n, value = ?chosen.value, "learned the chosen value");
                return Ok(chosen.clone());
            }
        }
    }
}
