//! Pure state machine core for Paxos - no I/O, no async
//!
//! This module contains the state transition logic shared between:
//! - The async role runtimes ([`crate::acceptor`], [`crate::proposer`], [`crate::learner`])
//! - The Stateright model checker tests
//!
//! Keeping the transitions here means the model checker verifies the exact
//! same code the runtimes execute.
//!
//! # Modules
//!
//! - [`acceptor`]: Acceptor state machine (`AcceptorCore`)
//! - [`proposer`]: Proposer state machine (`ProposerCore`)
//! - [`learner`]: Quorum detection (`LearnerCore`)

pub mod acceptor;
pub mod learner;
pub mod proposer;
mod quorum;

pub use acceptor::{AcceptorCore, PrepareResult, ProposeResult};
pub use learner::LearnerCore;
pub use proposer::{PromiseResult, ProposerCore};
pub use quorum::majority;
