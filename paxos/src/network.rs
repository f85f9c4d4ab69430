//! Mailbox network
//!
//! Roles only talk to each other through [`Network`]. [`MemoryNetwork`] is an
//! in-process implementation: one bounded queue per agent identity. Any
//! transport that satisfies the trait (e.g. an RPC client with its own retry
//! logic) can replace it without touching the roles.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use error_stack::Report;
use tokio::sync::mpsc;
use tracing::trace;

use crate::config::NetworkConfig;
use crate::error::NetworkError;
use crate::messages::{Message, Value};
use crate::numbering::NodeId;

/// Transport seen by a single agent.
///
/// Messages from one sender to one recipient arrive in send order. Delivery
/// across different senders may interleave arbitrarily.
pub trait Network<V: Value>: Send + Sync {
    /// Enqueue `message` for `message.to`, waiting while its queue is full.
    fn send(
        &self,
        message: Message<V>,
    ) -> impl Future<Output = Result<(), Report<NetworkError>>> + Send;

    /// Wait for the next message addressed to this agent. `None` means the
    /// timeout elapsed first.
    fn recv(&mut self, timeout: Duration) -> impl Future<Output = Option<Message<V>>> + Send;
}

type Senders<V> = Arc<BTreeMap<NodeId, mpsc::Sender<Message<V>>>>;

/// In-memory network with a bounded inbound queue per agent.
pub struct MemoryNetwork<V> {
    senders: Senders<V>,
    inboxes: Mutex<BTreeMap<NodeId, mpsc::Receiver<Message<V>>>>,
}

impl<V: Value> MemoryNetwork<V> {
    /// Create queues for every agent with the default capacity.
    pub fn new(agents: impl IntoIterator<Item = NodeId>) -> Self {
        Self::with_config(agents, &NetworkConfig::default())
    }

    pub fn with_config(agents: impl IntoIterator<Item = NodeId>, config: &NetworkConfig) -> Self {
        let mut senders = BTreeMap::new();
        let mut inboxes = BTreeMap::new();
        for id in agents {
            let (tx, rx) = mpsc::channel(config.capacity.max(1));
            senders.insert(id, tx);
            inboxes.insert(id, rx);
        }
        Self {
            senders: Arc::new(senders),
            inboxes: Mutex::new(inboxes),
        }
    }

    /// Hand out the mailbox owned by `id`. Each mailbox can be taken once.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownRecipient`] if `id` has no queue and
    /// [`NetworkError::MailboxTaken`] if it was already handed out.
    pub fn mailbox(&self, id: NodeId) -> Result<Mailbox<V>, Report<NetworkError>> {
        if !self.senders.contains_key(&id) {
            return Err(Report::new(NetworkError::UnknownRecipient(id)));
        }
        let inbox = self
            .inboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .ok_or_else(|| Report::new(NetworkError::MailboxTaken(id)))?;
        Ok(Mailbox {
            id,
            senders: Arc::clone(&self.senders),
            inbox,
        })
    }

    /// Total number of messages sitting undelivered in all queues.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.senders
            .iter()
            .map(|(id, tx)| {
                let queued = tx.max_capacity() - tx.capacity();
                trace!(%id, queued, "queue depth");
                queued
            })
            .sum()
    }
}

/// One agent's view of a [`MemoryNetwork`]: its own inbox plus the ability to
/// send to every registered agent.
pub struct Mailbox<V> {
    id: NodeId,
    senders: Senders<V>,
    inbox: mpsc::Receiver<Message<V>>,
}

impl<V> Mailbox<V> {
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl<V: Value> Network<V> for Mailbox<V> {
    async fn send(&self, message: Message<V>) -> Result<(), Report<NetworkError>> {
        let to = message.to;
        let Some(tx) = self.senders.get(&to) else {
            let report = Report::new(NetworkError::UnknownRecipient(to));
            return Err(report.attach(format!("sender: {}", self.id)));
        };
        trace!(?message, "send");
        if tx.send(message).await.is_err() {
            let report = Report::new(NetworkError::Disconnected(to));
            return Err(report.attach(format!("sender: {}", self.id)));
        }
        Ok(())
    }

    async fn recv(&mut self, timeout: Duration) -> Option<Message<V>> {
        match tokio::time::timeout(timeout, self.inbox.recv()).await {
            Ok(Some(message)) => {
                trace!(?message, "recv");
                Some(message)
            }
            // our own sender lives in `senders`, so the queue never closes
            Ok(None) | Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProposalNumber;
    use crate::error::NetworkError::{Disconnected, MailboxTaken, UnknownRecipient};

    fn prepare(from: u32, to: u32, round: u32) -> Message<String> {
        let n = ProposalNumber::new(round, NodeId(from));
        Message::prepare(NodeId(from), NodeId(to), n)
    }

    #[tokio::test]
    async fn fifo_per_sender() {
        let network = MemoryNetwork::new([NodeId(1), NodeId(2)]);
        let sender = network.mailbox(NodeId(1)).unwrap();
        let mut receiver = network.mailbox(NodeId(2)).unwrap();
        assert_eq!(sender.id(), NodeId(1));
        assert_eq!(receiver.id(), NodeId(2));

        for round in 1..=5 {
            sender.send(prepare(1, 2, round)).await.unwrap();
        }
        assert_eq!(network.pending(), 5);

        for round in 1..=5 {
            let msg = receiver.recv(Duration::from_secs(1)).await.unwrap();
            assert_eq!(msg.n().round(), round);
        }
        assert_eq!(network.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn recv_times_out() {
        let network = MemoryNetwork::<String>::new([NodeId(1)]);
        let mut mailbox = network.mailbox(NodeId(1)).unwrap();
        assert!(mailbox.recv(Duration::from_secs(1)).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn send_waits_while_queue_full() {
        let config = NetworkConfig { capacity: 1 };
        let network = MemoryNetwork::with_config([NodeId(1), NodeId(2)], &config);
        let sender = network.mailbox(NodeId(1)).unwrap();
        let mut receiver = network.mailbox(NodeId(2)).unwrap();

        sender.send(prepare(1, 2, 1)).await.unwrap();
        let second = sender.send(prepare(1, 2, 2));
        let blocked = tokio::time::timeout(Duration::from_secs(1), second).await;
        assert!(blocked.is_err(), "second send must wait for a free slot");

        let msg = receiver.recv(Duration::from_secs(1)).await.unwrap();
        assert_eq!(msg.n().round(), 1);
        sender.send(prepare(1, 2, 3)).await.unwrap();
        let msg = receiver.recv(Duration::from_secs(1)).await.unwrap();
        assert_eq!(msg.n().round(), 3);
    }

    #[tokio::test]
    async fn addressing_errors() {
        let network = MemoryNetwork::<String>::new([NodeId(1), NodeId(2)]);
        let sender = network.mailbox(NodeId(1)).unwrap();

        let err = network.mailbox(NodeId(1)).err().unwrap();
        assert_eq!(*err.current_context(), MailboxTaken(NodeId(1)));

        let err = network.mailbox(NodeId(9)).err().unwrap();
        assert_eq!(*err.current_context(), UnknownRecipient(NodeId(9)));

        let err = sender.send(prepare(1, 9, 1)).await.unwrap_err();
        assert_eq!(*err.current_context(), UnknownRecipient(NodeId(9)));

        drop(network.mailbox(NodeId(2)).unwrap());
        let err = sender.send(prepare(1, 2, 1)).await.unwrap_err();
        assert_eq!(*err.current_context(), Disconnected(NodeId(2)));
    }
}
