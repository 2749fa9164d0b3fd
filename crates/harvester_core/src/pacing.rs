use std::thread;
use std::time::Duration;

use harvest_logging::harvest_trace;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Called by the session between two fresh fetches. Cache hits never reach it.
pub trait RateLimiter: Send + Sync {
    fn wait(&self);
}

/// How long to pause between two fresh fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelayPolicy {
    None,
    Fixed { ms: u64 },
    /// Uniformly random pause in `[min_ms, max_ms]`.
    Uniform { min_ms: u64, max_ms: u64 },
}

impl Default for DelayPolicy {
    fn default() -> Self {
        DelayPolicy::Uniform {
            min_ms: 3_000,
            max_ms: 5_000,
        }
    }
}

impl DelayPolicy {
    pub fn next_delay(&self) -> Duration {
        match *self {
            DelayPolicy::None => Duration::ZERO,
            DelayPolicy::Fixed { ms } => Duration::from_millis(ms),
            DelayPolicy::Uniform { min_ms, max_ms } => {
                let (low, high) = (min_ms.min(max_ms), min_ms.max(max_ms));
                Duration::from_millis(rand::thread_rng().gen_range(low..=high))
            }
        }
    }
}

/// Blocking [`RateLimiter`] that sleeps the calling thread according to a [`DelayPolicy`].
#[derive(Debug, Clone, Default)]
pub struct Pacer {
    policy: DelayPolicy,
}

impl Pacer {
    pub fn new(policy: DelayPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DelayPolicy {
        self.policy
    }
}

impl RateLimiter for Pacer {
    fn wait(&self) {
        let delay = self.policy.next_delay();
        if delay.is_zero() {
            return;
        }
        harvest_trace!("Pausing {} ms before next fetch", delay.as_millis());
        thread::sleep(delay);
    }
}
