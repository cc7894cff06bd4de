use std::time::Duration;

/// Configuration for query behavior.
///
/// Controls how long data is considered fresh, how long an unobserved entry
/// is retained, and how failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// How long data is considered fresh after a successful fetch.
    ///
    /// Mounting a query whose data is fresh serves the cache without
    /// refetching. Once stale, mounting serves the cache and refetches in the
    /// background.
    pub stale_time: Duration,

    /// How long an entry with no observers is retained before eviction.
    pub gc_time: Duration,

    /// Number of additional producer calls after a failure before the entry
    /// is marked as failed.
    pub retry: u32,

    /// Delay before the first retry. Each following retry doubles it.
    pub retry_delay: Duration,

    /// Upper bound for the retry delay.
    pub max_retry_delay: Duration,

    /// Whether regaining terminal focus refetches stale observed queries.
    pub refetch_on_window_focus: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,             // immediately stale
            gc_time: Duration::from_secs(5 * 60),   // 5 minutes
            retry: 3,
            retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(30),
            refetch_on_window_focus: true,
        }
    }
}

impl QueryConfig {
    /// Creates a configuration with the given stale and gc times and default
    /// retry behavior.
    #[must_use]
    pub fn new(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            stale_time,
            gc_time,
            ..Self::default()
        }
    }

    /// Sets the retry bound.
    #[must_use]
    pub const fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the base and maximum retry delay.
    #[must_use]
    pub const fn with_retry_delay(mut self, base: Duration, max: Duration) -> Self {
        self.retry_delay = base;
        self.max_retry_delay = max;
        self
    }

    /// Enables or disables refetching when the terminal regains focus.
    #[must_use]
    pub const fn with_refetch_on_window_focus(mut self, enabled: bool) -> Self {
        self.refetch_on_window_focus = enabled;
        self
    }

    /// Backoff before retry number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_delay
            .saturating_mul(factor)
            .min(self.max_retry_delay)
    }
}
