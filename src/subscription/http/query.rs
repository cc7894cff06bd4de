//! Cached queries with deduplication, retry and timed eviction.
//!
//! This module provides the [`Query`] subscription and the [`QueryClient`]
//! that owns the cache behind it, similar to SWR or TanStack Query.
//!
//! # Design Pattern: Subscription-based State Management
//!
//! A query is a **subscription**: mounting it registers an observer on the
//! cache entry for its key and yields the entry's projection every time it
//! changes.
//!
//! 1. If fresh data is cached, it is emitted immediately and nothing is fetched
//! 2. If the entry is new or stale, a fetch starts; stale data keeps being
//!    served while it runs
//! 3. Observers mounting while a fetch is in flight attach to it
//! 4. Failures are retried with exponential backoff before being surfaced
//! 5. When the last observer unmounts, the entry is evicted after `gc_time`
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally::subscription::Subscription;
//! use tally::subscription::http::{Query, QueryClient};
//!
//! let client = Arc::new(QueryClient::new());
//!
//! let posts = Subscription::new(Query::new(
//!     &"posts-data",
//!     || Box::pin(fetch_posts()),
//!     client.clone(),
//! ))
//! .map(Message::Posts);
//!
//! // later, from `update`:
//! client.refetch(&"posts-data")
//! ```

use std::any::Any;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use dashmap::DashMap;
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::Command;
use crate::subscription::{SubscriptionId, SubscriptionSource};

use super::cache::{CacheEntry, QueryStatus, Retry};
use super::config::QueryConfig;

/// Error type for query operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The response arrived but its body could not be used.
    #[error("Fetch failed: {0}")]
    FetchError(String),

    /// The request never produced a response.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The server answered with a non-success status.
    #[error("Request failed with status code {0}")]
    Status(u16),
}

/// An asynchronous zero-argument producer for a query's data.
pub type Fetcher<V> = Arc<dyn Fn() -> BoxFuture<'static, Result<V, QueryError>> + Send + Sync>;

/// What an observer sees of a cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    /// Lifecycle status of the entry.
    pub status: QueryStatus,
    /// Data from the most recent successful fetch.
    pub data: Option<T>,
    /// The error that ended the most recent fetch, once retries ran out.
    pub error: Option<QueryError>,
    /// Retries issued by the current or last fetch.
    pub retry_count: u32,
}

impl<T> QueryResult<T> {
    /// The projection of an entry nobody has fetched yet.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            retry_count: 0,
        }
    }

    /// Returns the last successfully fetched data, if any.
    pub const fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Returns the surfaced error, if any.
    pub const fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    /// `true` while the first fetch is in flight and there is nothing to show.
    pub const fn is_loading(&self) -> bool {
        matches!(self.status, QueryStatus::Loading) && self.data.is_none()
    }

    /// `true` while any fetch is in flight, including background refetches.
    pub const fn is_fetching(&self) -> bool {
        matches!(self.status, QueryStatus::Loading)
    }

    /// `true` once a fetch has failed after exhausting its retries.
    pub const fn is_error(&self) -> bool {
        matches!(self.status, QueryStatus::Error)
    }

    /// `true` if the last fetch succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self.status, QueryStatus::Success)
    }
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self::idle()
    }
}

/// A client owning the query cache.
///
/// Cloning is cheap and every clone shares the same cache.
///
/// ```rust
/// use std::time::Duration;
/// use tally::subscription::http::{QueryClient, QueryConfig};
///
/// let config = QueryConfig::new(
///     Duration::from_secs(5 * 60),  // stale_time
///     Duration::from_secs(10 * 60), // gc_time
/// );
///
/// let client = QueryClient::with_config(config);
/// assert!(client.is_empty());
/// ```
#[derive(Clone)]
pub struct QueryClient {
    cache: Arc<DashMap<String, Arc<dyn ErasedCell>>>,
    config: QueryConfig,
}

impl QueryClient {
    /// Creates a new query client with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(QueryConfig::default())
    }

    /// Creates a new query client with the given configuration.
    #[must_use]
    pub fn with_config(config: QueryConfig) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Gets the query configuration.
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Returns `true` if an entry exists for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    /// Number of mounted observers for `key`.
    pub fn observer_count(&self, key: &str) -> usize {
        self.slot(key).map_or(0, |cell| cell.observers())
    }

    /// Returns the cached data for `key`, if any and of type `V`.
    pub fn query_data<V: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<V> {
        let cell = self.slot(key)?.into_any().downcast::<QueryCell<V>>().ok()?;
        let entry = cell.entry.lock();
        entry.data.clone()
    }

    /// Refetches `key` as a side effect, attaching to an in-flight fetch if
    /// there is one.
    ///
    /// Unknown keys are ignored. The command produces no messages; observers
    /// see the refetch through their subscription.
    pub fn refetch<Msg>(&self, key: &impl ToString) -> Command<Msg>
    where
        Msg: Send + 'static,
    {
        let client = self.clone();
        let key = key.to_string();
        silent(async move {
            client.refetch_key(&key);
        })
    }

    /// Tells the client the terminal regained focus.
    ///
    /// With `refetch_on_window_focus` enabled, every observed entry whose data
    /// is stale is refetched; otherwise this does nothing.
    pub fn window_focused<Msg>(&self) -> Command<Msg>
    where
        Msg: Send + 'static,
    {
        if !self.config.refetch_on_window_focus {
            return Command::none();
        }

        let client = self.clone();
        silent(async move {
            let cells: Vec<_> = client.cache.iter().map(|r| r.value().clone()).collect();
            for cell in cells {
                cell.refetch_if_stale(&client);
            }
        })
    }

    fn refetch_key(&self, key: &str) -> bool {
        let Some(cell) = self.slot(key) else {
            tracing::debug!(key, "refetch requested for unknown query");
            return false;
        };
        cell.refetch(self);
        true
    }

    fn slot(&self, key: &str) -> Option<Arc<dyn ErasedCell>> {
        self.cache.get(key).map(|r| r.value().clone())
    }

    /// Looks up the typed cell for `key`, creating it if needed.
    fn cell<V: Clone + Send + Sync + 'static>(&self, key: &str) -> Arc<QueryCell<V>> {
        let mut slot = self
            .cache
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(QueryCell::<V>::new(key)) as Arc<dyn ErasedCell>);

        if let Ok(cell) = slot.value().clone().into_any().downcast::<QueryCell<V>>() {
            return cell;
        }

        tracing::warn!(key, "query key reused with a different data type, replacing entry");
        let cell = Arc::new(QueryCell::<V>::new(key));
        *slot = cell.clone() as Arc<dyn ErasedCell>;
        cell
    }

    /// Registers an observer on `key` and starts a fetch if the entry needs one.
    fn mount<V: Clone + Send + Sync + 'static>(&self, key: &str, fetcher: Fetcher<V>) -> Observer<V> {
        let cell = self.cell::<V>(key);
        *cell.fetcher.lock() = Some(fetcher);

        let should_fetch = {
            let mut entry = cell.entry.lock();
            entry.attach();
            entry.needs_fetch_on_mount(self.config.stale_time, Instant::now())
        };
        tracing::trace!(key, should_fetch, "query mounted");

        if should_fetch {
            self.start_fetch(&cell);
        }

        Observer {
            rx: cell.tx.subscribe(),
            guard: ObserverGuard {
                client: self.clone(),
                cell,
            },
        }
    }

    /// Starts a fetch for `cell` unless one is already in flight.
    fn start_fetch<V: Clone + Send + Sync + 'static>(&self, cell: &Arc<QueryCell<V>>) {
        let Some(fetcher) = cell.fetcher.lock().clone() else {
            return;
        };

        {
            let mut entry = cell.entry.lock();
            if !entry.begin_fetch() {
                tracing::trace!(key = %cell.key, "fetch already in flight");
                return;
            }
            cell.publish(&entry);
        }

        tracing::debug!(key = %cell.key, "fetch started");
        let client = self.clone();
        let cell = cell.clone();
        tokio::spawn(async move { client.run_fetch(cell, fetcher).await });
    }

    async fn run_fetch<V: Clone + Send + Sync + 'static>(
        self,
        cell: Arc<QueryCell<V>>,
        fetcher: Fetcher<V>,
    ) {
        loop {
            let outcome = fetcher().await;

            let delay = {
                let mut entry = cell.entry.lock();
                let delay = match outcome {
                    Ok(data) => {
                        entry.resolve(data, Instant::now());
                        tracing::debug!(key = %cell.key, "fetch succeeded");
                        None
                    }
                    Err(error) => {
                        let config = self.config;
                        match entry.record_failure(error.clone(), config.retry, |attempt| {
                            config.backoff(attempt)
                        }) {
                            Retry::After(delay) => {
                                tracing::warn!(
                                    key = %cell.key,
                                    attempt = entry.retry_count,
                                    ?delay,
                                    %error,
                                    "fetch failed, retrying"
                                );
                                Some(delay)
                            }
                            Retry::GiveUp => {
                                tracing::error!(key = %cell.key, %error, "fetch failed");
                                None
                            }
                        }
                    }
                };
                cell.publish(&entry);

                if delay.is_none() {
                    if let Some(epoch) = entry.unobserved_epoch() {
                        self.schedule_gc(&cell, epoch);
                    }
                }
                delay
            };

            match delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => break,
            }
        }
    }

    /// Evicts `cell` after `gc_time` unless it was re-mounted or is fetching.
    fn schedule_gc<V: Clone + Send + Sync + 'static>(&self, cell: &Arc<QueryCell<V>>, epoch: u64) {
        // Observers can be dropped while the runtime shuts down.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let cache = Arc::clone(&self.cache);
        let gc_time = self.config.gc_time;
        let cell = Arc::clone(cell);

        handle.spawn(async move {
            tokio::time::sleep(gc_time).await;

            let removed = cache.remove_if(&cell.key, |_, slot| {
                std::ptr::addr_eq(Arc::as_ptr(slot), Arc::as_ptr(&cell))
                    && cell.entry.lock().should_gc(epoch)
            });
            if removed.is_some() {
                tracing::debug!(key = %cell.key, "query evicted");
            }
        });
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("entries", &self.cache.len())
            .field("config", &self.config)
            .finish()
    }
}

/// A command that runs `future` for its side effect and yields nothing.
fn silent<Msg: Send + 'static>(future: impl Future<Output = ()> + Send + 'static) -> Command<Msg> {
    Command {
        stream: Some(
            stream::once(future)
                .filter_map(|()| async { None })
                .boxed(),
        ),
    }
}

/// The cache-side state for one key.
struct QueryCell<V> {
    key: String,
    entry: Mutex<CacheEntry<V>>,
    fetcher: Mutex<Option<Fetcher<V>>>,
    tx: watch::Sender<QueryResult<V>>,
}

impl<V: Clone> QueryCell<V> {
    fn new(key: &str) -> Self {
        let (tx, _) = watch::channel(QueryResult::idle());
        Self {
            key: key.to_string(),
            entry: Mutex::new(CacheEntry::new()),
            fetcher: Mutex::new(None),
            tx,
        }
    }

    fn publish(&self, entry: &CacheEntry<V>) {
        self.tx.send_replace(entry.snapshot());
    }
}

/// Type-erased access to a [`QueryCell`] so the cache can hold cells of
/// different data types.
trait ErasedCell: Send + Sync {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    fn observers(&self) -> usize;
    fn refetch(self: Arc<Self>, client: &QueryClient);
    fn refetch_if_stale(self: Arc<Self>, client: &QueryClient);
}

impl<V: Clone + Send + Sync + 'static> ErasedCell for QueryCell<V> {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn observers(&self) -> usize {
        self.entry.lock().observers()
    }

    fn refetch(self: Arc<Self>, client: &QueryClient) {
        client.start_fetch(&self);
    }

    fn refetch_if_stale(self: Arc<Self>, client: &QueryClient) {
        let stale = {
            let entry = self.entry.lock();
            entry.observers() > 0 && entry.is_stale(client.config.stale_time, Instant::now())
        };
        if stale {
            client.start_fetch(&self);
        }
    }
}

/// A mounted observer of one cache entry.
struct Observer<V: Clone + Send + Sync + 'static> {
    rx: watch::Receiver<QueryResult<V>>,
    // Held for its `Drop`.
    #[allow(dead_code)]
    guard: ObserverGuard<V>,
}

impl<V: Clone + Send + Sync + 'static> Observer<V> {
    fn current(&mut self) -> QueryResult<V> {
        self.rx.borrow_and_update().clone()
    }

    async fn changed(&mut self) -> Option<QueryResult<V>> {
        self.rx.changed().await.ok()?;
        Some(self.current())
    }
}

/// Unregisters the observer when the subscription stream is dropped.
struct ObserverGuard<V: Clone + Send + Sync + 'static> {
    client: QueryClient,
    cell: Arc<QueryCell<V>>,
}

impl<V: Clone + Send + Sync + 'static> Drop for ObserverGuard<V> {
    fn drop(&mut self) {
        let epoch = self.cell.entry.lock().detach();
        tracing::trace!(key = %self.cell.key, "query unmounted");
        if let Some(epoch) = epoch {
            self.client.schedule_gc(&self.cell, epoch);
        }
    }
}

/// A query subscription that observes a cache entry and fetches it on demand.
///
/// The subscription id is derived from the key and the data type, so two
/// `Query`s with the same key mounted from different parts of an app share
/// one cache entry and one in-flight fetch.
pub struct Query<V> {
    key: String,
    fetcher: Fetcher<V>,
    client: Arc<QueryClient>,
}

impl<V> Query<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new query with the given key, producer, and client.
    ///
    /// # Arguments
    ///
    /// * `key` - Identifies the cache entry
    /// * `fetcher` - Produces the data; called once per attempt
    /// * `client` - The query client owning the cache
    pub fn new<F>(key: &impl ToString, fetcher: F, client: Arc<QueryClient>) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<V, QueryError>> + Send + Sync + 'static,
    {
        Self::from_fetcher(key, Arc::new(fetcher), client)
    }

    /// Creates a new query from an already shared producer.
    pub fn from_fetcher(key: &impl ToString, fetcher: Fetcher<V>, client: Arc<QueryClient>) -> Self {
        Self {
            key: key.to_string(),
            fetcher,
            client,
        }
    }
}

impl<V> SubscriptionSource for Query<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Output = QueryResult<V>;

    fn stream(&self) -> BoxStream<'static, Self::Output> {
        let initial = State::Initial {
            key: self.key.clone(),
            fetcher: self.fetcher.clone(),
            client: self.client.clone(),
        };

        stream::unfold(initial, |state| async move {
            match state {
                State::Initial {
                    key,
                    fetcher,
                    client,
                } => {
                    let mut observer = client.mount(&key, fetcher);
                    let result = observer.current();
                    Some((result, State::Watching(observer)))
                }
                State::Watching(mut observer) => {
                    let result = observer.changed().await?;
                    Some((result, State::Watching(observer)))
                }
            }
        })
        .boxed()
    }

    fn id(&self) -> SubscriptionId {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        SubscriptionId::of::<Self>(hasher.finish())
    }
}

impl<V> Hash for Query<V> {
    fn hash<H>(&self, hasher: &mut H)
    where
        H: std::hash::Hasher,
    {
        self.key.hash(hasher);
    }
}

/// Internal state machine for the Query subscription stream.
enum State<V: Clone + Send + Sync + 'static> {
    Initial {
        key: String,
        fetcher: Fetcher<V>,
        client: Arc<QueryClient>,
    },
    Watching(Observer<V>),
}
