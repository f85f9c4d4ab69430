//! Quorum size shared by proposer and learner

/// Smallest number of acceptors that forms a majority of `num_acceptors`.
#[must_use]
pub fn majority(num_acceptors: usize) -> usize {
    num_acceptors / 2 + 1
}
