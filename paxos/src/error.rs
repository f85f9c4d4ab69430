//! Error contexts used with `error_stack`.

use std::fmt;

use crate::NodeId;

/// A peer broke protocol discipline: a message of the wrong kind for the
/// receiving role, or a proposal above the number the acceptor promised.
///
/// Fatal for the role that observes it.
#[derive(Debug, Default)]
pub struct ProtocolViolation;

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("protocol violation")
    }
}

impl std::error::Error for ProtocolViolation {}

/// Mailbox network failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// No mailbox is registered for the recipient.
    UnknownRecipient(NodeId),
    /// The recipient's mailbox was dropped.
    Disconnected(NodeId),
    /// The mailbox for this identity was already handed out.
    MailboxTaken(NodeId),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRecipient(id) => write!(f, "unknown recipient {id}"),
            Self::Disconnected(id) => write!(f, "recipient {id} disconnected"),
            Self::MailboxTaken(id) => write!(f, "mailbox for {id} already taken"),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Error marker for a failed acceptor task.
#[derive(Debug, Default)]
pub struct AcceptorError;

impl fmt::Display for AcceptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("acceptor failed")
    }
}

impl std::error::Error for AcceptorError {}

/// Error marker for a failed proposer run.
#[derive(Debug, Default)]
pub struct ProposerError;

impl fmt::Display for ProposerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("proposer failed")
    }
}

impl std::error::Error for ProposerError {}

/// Error marker for a failed learner.
#[derive(Debug, Default)]
pub struct LearnerError;

impl fmt::Display for LearnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("learner failed")
    }
}

impl std::error::Error for LearnerError {}
