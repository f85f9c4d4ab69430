//! Role and network configuration

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default number of slots in each agent's inbound queue.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 1024;

/// Acceptors and learners wake up this often when idle.
pub const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// In-memory network configuration
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Capacity of each agent's inbound queue. Senders wait when it is full.
    pub capacity: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AcceptorConfig {
    /// How long a receive waits before the loop logs an idle tick.
    pub liveness_timeout: Duration,
}

impl Default for AcceptorConfig {
    fn default() -> Self {
        Self {
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LearnerConfig {
    /// How long a receive waits before the loop logs an idle tick.
    pub liveness_timeout: Duration,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT,
        }
    }
}

/// How long a proposer waits for a promise before starting a new round.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub timeout: Duration,
    /// Scale each wait by a random factor in 50%..150% so that dueling
    /// proposers stop retrying in lockstep.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Wait window for the next promise.
    #[must_use]
    pub fn duration(&self, rng: &mut impl Rng) -> Duration {
        if !self.jitter {
            return self.timeout;
        }
        let jitter_factor = rng.random_range(0.5..1.5);
        self.timeout.mul_f64(jitter_factor)
    }
}

/// Proposer configuration with RNG for jitter
pub struct ProposerConfig<R: Rng = StdRng> {
    pub retry: RetryConfig,
    /// RNG for jitter (seeded for deterministic tests)
    pub rng: R,
}

impl<R: Rng> ProposerConfig<R> {
    pub fn new(retry: RetryConfig, rng: R) -> Self {
        Self { retry, rng }
    }

    pub(crate) fn next_timeout(&mut self) -> Duration {
        self.retry.duration(&mut self.rng)
    }
}

impl ProposerConfig<StdRng> {
    /// Create a proposer config with a seeded RNG for deterministic behavior
    #[must_use]
    pub fn with_seed(retry: RetryConfig, seed: u64) -> Self {
        Self {
            retry,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ProposerConfig<StdRng> {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            rng: StdRng::from_os_rng(),
        }
    }
}
