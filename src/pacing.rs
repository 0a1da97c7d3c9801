//! Request pacing between item saves and after fetch errors
//!
//! The platform tolerates slow, steady clients. The pacer sleeps a
//! uniformly random duration between consecutive item saves and a fixed,
//! longer duration after a fetch error.

use crate::config::HarvestConfig;
use rand::Rng;
use std::time::Duration;

/// Shared pacing policy for all running tasks
///
/// Cheap to clone; holds only the three configured durations. Each task
/// runner calls [`pause`](RequestPacer::pause) after every item it
/// processes and [`backoff`](RequestPacer::backoff) after every failed
/// fetch.
#[derive(Clone, Debug)]
pub struct RequestPacer {
    min_delay: Duration,
    max_delay: Duration,
    error_backoff: Duration,
}

impl RequestPacer {
    /// Create a pacer from the harvest configuration
    ///
    /// If `max_delay < min_delay` the bounds are swapped rather than
    /// panicking inside `gen_range`.
    #[must_use]
    pub fn new(config: &HarvestConfig) -> Self {
        let (min_delay, max_delay) = if config.max_delay < config.min_delay {
            (config.max_delay, config.min_delay)
        } else {
            (config.min_delay, config.max_delay)
        };
        Self {
            min_delay,
            max_delay,
            error_backoff: config.error_backoff,
        }
    }

    /// Draw the next inter-item delay without sleeping
    ///
    /// Uniformly distributed over `[min_delay, max_delay]`.
    pub fn next_delay(&self) -> Duration {
        if self.min_delay == self.max_delay {
            return self.min_delay;
        }
        let mut rng = rand::thread_rng();
        rng.gen_range(self.min_delay..=self.max_delay)
    }

    /// Sleep the uniform inter-item delay
    pub async fn pause(&self) {
        tokio::time::sleep(self.next_delay()).await;
    }

    /// Sleep the fixed post-error backoff
    pub async fn backoff(&self) {
        tokio::time::sleep(self.error_backoff).await;
    }

    /// The configured post-error backoff duration
    pub fn error_backoff(&self) -> Duration {
        self.error_backoff
    }
}
