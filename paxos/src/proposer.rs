//! Proposer runtime
//!
//! Drives a value through the two Paxos phases:
//!
//! 1. Send `Prepare` to a majority-sized subset of the acceptors and collect
//!    promises. If no promise arrives within the retry window, start over with
//!    a higher round. Promises that disclose an accepted proposal may replace
//!    the candidate value.
//! 2. Once a majority promised the current number, send `Propose` to exactly
//!    those acceptors and stop. Accept confirmations go to the learners, not
//!    back to the proposer.

use error_stack::Report;
use futures::future::join_all;
use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, instrument, trace, warn};

use crate::config::ProposerConfig;
use crate::core::{PromiseResult, ProposerCore};
use crate::error::{ProposerError, ProtocolViolation};
use crate::messages::{Message, Payload, Proposal, Value};
use crate::network::Network;
use crate::numbering::NodeId;

pub struct Proposer<V, N, R: Rng = StdRng> {
    network: N,
    core: ProposerCore<V>,
    config: ProposerConfig<R>,
}

impl<V: Value, N: Network<V>> Proposer<V, N> {
    pub fn new(
        id: NodeId,
        value: V,
        network: N,
        acceptors: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        Self {
            network,
            core: ProposerCore::new(id, value, acceptors),
            config: ProposerConfig::default(),
        }
    }
}

impl<V: Value, N: Network<V>, R: Rng + Send> Proposer<V, N, R> {
    #[must_use]
    pub fn with_config<R2: Rng>(self, config: ProposerConfig<R2>) -> Proposer<V, N, R2> {
        Proposer {
            network: self.network,
            core: self.core,
            config,
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.core.node()
    }

    #[must_use]
    pub fn state(&self) -> &ProposerCore<V> {
        &self.core
    }

    /// Send every message. An acceptor that cannot be reached is logged and
    /// skipped; only a majority has to answer.
    async fn send_all(&self, messages: Vec<Message<V>>) {
        let results = join_all(messages.into_iter().map(|m| self.network.send(m))).await;
        for err in results.into_iter().filter_map(Result::err) {
            warn!(error = ?err, "skipping unreachable acceptor");
        }
    }

    /// Run both phases. Returns the proposal sent to the acceptors in phase 2.
    ///
    /// The proposal is not confirmed: if some of the Propose messages are
    /// lost the value may never be chosen. Learners report what actually won.
    ///
    /// # Errors
    ///
    /// Returns [`ProposerError`] if a message other than a Promise arrives
    /// during phase 1 ([`ProtocolViolation`]). Failed sends are not errors:
    /// an unanswered prepare ends in a timeout and a new round.
    #[instrument(skip_all, name = "proposer", fields(id = %self.core.node()))]
    pub async fn run(mut self) -> Result<Proposal<V>, Report<ProposerError>> {
        debug!(value = ?self.core.value(), quorum = self.core.quorum(), "proposer started");

        let mut retry = true;
        while !self.core.majority_reached() {
            if retry {
                let prepares = self.core.prepare();
                debug!(n = %self.core.number(), targets = prepares.len(), "preparing");
                self.send_all(prepares).await;
            }

            let timeout = self.config.next_timeout();
            let Some(message) = self.network.recv(timeout).await else {
                debug!(n = %self.core.number(), ?timeout, "no promise in time, retrying");
                retry = true;
                continue;
            };
            retry = false;

            let Message { from, payload, .. } = message;
            let (n, accepted) = match payload {
                Payload::Promise { n, accepted } => (n, accepted),
                other => {
                    return Err(Report::new(ProtocolViolation)
                        .attach(format!("unexpected message from {from} during phase 1"))
                        .attach(format!("{other:?}"))
                        .change_context(ProposerError));
                }
            };

            match self.core.receive_promise(from, n, accepted) {
                PromiseResult::Recorded { adopted: true } => {
                    debug!(%n, %from, value = ?self.core.value(), "adopted disclosed value");
                }
                PromiseResult::Recorded { adopted: false } => {
                    trace!(%n, %from, "recorded promise");
                }
                PromiseResult::Stale => trace!(%n, %from, "ignored stale promise"),
                PromiseResult::Unknown => warn!(%n, %from, "promise from untargeted acceptor"),
            }
        }

        let n = self.core.number();
        debug!(%n, quorum = self.core.quorum(), "majority promised");

        let proposals = self.core.propose();
        debug!(%n, value = ?self.core.value(), targets = proposals.len(), "proposing");
        self.send_all(proposals).await;

        Ok(Proposal::new(n, self.core.value().clone()))
    }
}
