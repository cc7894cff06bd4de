use std::time::Duration;

use tokio::time::Instant;

use super::query::{QueryError, QueryResult};

/// Lifecycle status of a cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    /// Nothing has been fetched yet.
    #[default]
    Idle,
    /// A fetch is in flight. Previous data, if any, is still served.
    Loading,
    /// The last fetch succeeded.
    Success,
    /// The last fetch failed after exhausting its retries.
    Error,
}

/// What a fetch task should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    /// Call the producer again after the given delay.
    After(Duration),
    /// Retries are exhausted; the entry is now in [`QueryStatus::Error`].
    GiveUp,
}

/// The state of one cache key.
///
/// Every transition is a plain method so the state machine can be driven
/// without a runtime; [`QueryClient`](super::QueryClient) wraps it in a
/// lock and broadcasts a [`QueryResult`] after each change.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<QueryError>,
    pub fetched_at: Option<Instant>,
    /// Retries issued by the current (or last) fetch.
    pub retry_count: u32,
    observers: usize,
    gc_epoch: u64,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
            retry_count: 0,
            observers: 0,
            gc_epoch: 0,
        }
    }
}

impl<T> CacheEntry<T> {
    /// Creates an idle entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a fetch is in flight.
    pub fn is_fetching(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Checks if the data is older than `stale_time`. Entries without data
    /// are always stale.
    pub fn is_stale(&self, stale_time: Duration, now: Instant) -> bool {
        self.fetched_at
            .is_none_or(|fetched_at| now.saturating_duration_since(fetched_at) >= stale_time)
    }

    /// Whether a newly mounted observer should trigger a fetch.
    ///
    /// Idle entries always fetch; successful entries only once stale. Failed
    /// entries wait for an explicit refetch.
    pub fn needs_fetch_on_mount(&self, stale_time: Duration, now: Instant) -> bool {
        match self.status {
            QueryStatus::Idle => true,
            QueryStatus::Success => self.is_stale(stale_time, now),
            QueryStatus::Loading | QueryStatus::Error => false,
        }
    }

    /// Moves the entry into `Loading`, keeping any previous data.
    ///
    /// Returns `false` if a fetch is already in flight; the caller must then
    /// attach to that fetch instead of starting another.
    pub fn begin_fetch(&mut self) -> bool {
        if self.is_fetching() {
            return false;
        }
        self.status = QueryStatus::Loading;
        self.retry_count = 0;
        true
    }

    /// Records a successful fetch.
    pub fn resolve(&mut self, data: T, now: Instant) {
        self.status = QueryStatus::Success;
        self.data = Some(data);
        self.error = None;
        self.fetched_at = Some(now);
    }

    /// Records a failed attempt and decides whether to retry.
    ///
    /// While retries remain the entry stays in `Loading` and the error is
    /// not surfaced. Once `retry` retries have been spent the entry moves to
    /// `Error`; previous data is kept.
    pub fn record_failure(
        &mut self,
        error: QueryError,
        retry: u32,
        backoff: impl Fn(u32) -> Duration,
    ) -> Retry {
        if self.retry_count < retry {
            self.retry_count += 1;
            Retry::After(backoff(self.retry_count))
        } else {
            self.status = QueryStatus::Error;
            self.error = Some(error);
            Retry::GiveUp
        }
    }

    /// Registers a new observer and cancels any pending eviction.
    pub fn attach(&mut self) {
        self.observers += 1;
        self.gc_epoch = self.gc_epoch.wrapping_add(1);
    }

    /// Unregisters an observer. Returns the gc epoch to schedule an
    /// eviction with if this was the last one.
    pub fn detach(&mut self) -> Option<u64> {
        self.observers = self.observers.saturating_sub(1);
        (self.observers == 0).then_some(self.gc_epoch)
    }

    /// Epoch to schedule an eviction with if nobody observes the entry.
    pub fn unobserved_epoch(&self) -> Option<u64> {
        (self.observers == 0).then_some(self.gc_epoch)
    }

    /// Number of mounted observers.
    pub const fn observers(&self) -> usize {
        self.observers
    }

    /// Checks if an eviction scheduled at `epoch` may remove this entry.
    pub fn should_gc(&self, epoch: u64) -> bool {
        self.observers == 0 && !self.is_fetching() && self.gc_epoch == epoch
    }
}

impl<T: Clone> CacheEntry<T> {
    /// Projection handed to observers.
    pub fn snapshot(&self) -> QueryResult<T> {
        QueryResult {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            retry_count: self.retry_count,
        }
    }
}
