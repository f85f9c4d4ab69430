//! Single-decree Paxos
//!
//! Proposers, acceptors and learners agree on exactly one value. Every role
//! runs as its own task and talks to the others only through a [`Network`];
//! [`MemoryNetwork`] provides bounded in-process mailboxes.
//!
//! # Architecture
//!
//! - **Proposers**: Pick a proposal number, collect promises from a majority
//!   of acceptors, then propose either their own value or the highest
//!   previously accepted one they were told about
//! - **Acceptors**: Promise to ignore lower numbers, accept proposals at the
//!   promised number and tell every learner about it
//! - **Learners**: Report a value once a majority of acceptors accepted it
//!   under the same number
//!
//! The protocol logic itself lives in [`core`] as plain state machines with
//! no I/O, so it can be driven by the async runtime or a model checker.
//!
//! # Quick Start
//!
//! ```no_run
//! use basic_paxos::{Acceptor, Learner, MemoryNetwork, NodeId, Proposer};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let acceptors = [1, 2, 3].map(NodeId);
//! let learner_id = NodeId(2001);
//! let proposer_id = NodeId(1001);
//!
//! let network = MemoryNetwork::new(acceptors.into_iter().chain([learner_id, proposer_id]));
//! for id in acceptors {
//!     let acceptor = Acceptor::new(id, network.mailbox(id)?, [learner_id]);
//!     tokio::spawn(acceptor.run());
//! }
//!
//! let learner = Learner::new(learner_id, network.mailbox(learner_id)?, acceptors);
//! let learner = tokio::spawn(learner.learn());
//!
//! let mailbox = network.mailbox(proposer_id)?;
//! Proposer::new(proposer_id, "hello world".to_owned(), mailbox, acceptors)
//!     .run()
//!     .await?;
//!
//! let chosen = learner.await??;
//! assert_eq!(chosen.value, "hello world");
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]

pub mod acceptor;
pub mod config;
pub mod core;
pub mod error;
pub mod learner;
mod messages;
pub mod network;
mod numbering;
pub mod proposer;

pub use acceptor::Acceptor;
pub use config::{AcceptorConfig, LearnerConfig, NetworkConfig, ProposerConfig, RetryConfig};
pub use error::{AcceptorError, LearnerError, NetworkError, ProposerError, ProtocolViolation};
pub use learner::Learner;
pub use messages::{Message, MessageKind, Payload, Proposal, Value};
pub use network::{Mailbox, MemoryNetwork, Network};
pub use numbering::{NodeId, ProposalNumber};
pub use proposer::Proposer;
