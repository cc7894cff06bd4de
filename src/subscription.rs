//! Subscriptions: long-lived event sources feeding the application.
//!
//! A [`Subscription`] wraps a [`SubscriptionSource`] and is returned from
//! `Application::subscriptions`. After every update the runtime diffs the
//! returned list against the running set by [`SubscriptionId`]: new ids
//! are started, ids that disappeared are cancelled, and unchanged ids keep
//! running untouched. For the posts query this diff is what mounts and
//! unmounts an observer of the shared cache entry.

pub mod http;
pub mod terminal;
pub mod time;

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Identity of a subscription, derived from its source type and a hash of
/// its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    type_id: TypeId,
    hash: u64,
}

impl SubscriptionId {
    /// Creates an id scoped to the source type `T`.
    #[must_use]
    pub fn of<T: 'static>(hash: u64) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            hash,
        }
    }
}

/// A source of events that can be turned into a subscription.
pub trait SubscriptionSource: Send + Sync + 'static {
    /// The type of item the source produces.
    type Output: Send + 'static;

    /// Creates a fresh stream of events.
    ///
    /// Called each time the subscription is started.
    fn stream(&self) -> BoxStream<'static, Self::Output>;

    /// Identity used to decide whether two subscriptions are the same.
    fn id(&self) -> SubscriptionId;
}

/// A running-or-requested event source producing application messages.
pub struct Subscription<Msg> {
    pub(crate) id: SubscriptionId,
    pub(crate) spawn: Arc<dyn Fn() -> BoxStream<'static, Msg> + Send + Sync>,
}

impl<Msg: Send + 'static> Subscription<Msg> {
    /// Wraps a subscription source.
    pub fn new<S>(source: S) -> Self
    where
        S: SubscriptionSource<Output = Msg>,
    {
        let id = source.id();
        let source = Arc::new(source);
        Self {
            id,
            spawn: Arc::new(move || source.stream()),
        }
    }

    /// Converts every item this subscription produces.
    ///
    /// The id is preserved, so mapping does not restart a running
    /// subscription.
    pub fn map<T, F>(self, f: F) -> Subscription<T>
    where
        T: Send + 'static,
        F: Fn(Msg) -> T + Send + Sync + 'static,
    {
        let spawn = self.spawn;
        let f = Arc::new(f);
        Subscription {
            id: self.id,
            spawn: Arc::new(move || {
                let f = f.clone();
                spawn().map(move |msg| f(msg)).boxed()
            }),
        }
    }

    /// Returns the identity of this subscription.
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }
}

/// Handle for a running subscription task.
struct Handle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl Handle {
    const fn new(token: CancellationToken, join: JoinHandle<()>) -> Self {
        Self { token, join }
    }

    /// Signals the task to stop. The task drops its stream on the next poll.
    fn cancel(self) {
        self.token.cancel();
        drop(self.join);
    }
}

/// Keeps the set of running subscriptions in line with what the
/// application asks for.
pub(crate) struct SubscriptionManager<Msg> {
    running: HashMap<SubscriptionId, Handle>,
    tx: mpsc::UnboundedSender<Msg>,
}

impl<Msg: Send + 'static> SubscriptionManager<Msg> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self {
            running: HashMap::new(),
            tx,
        }
    }

    /// Starts subscriptions that are new and cancels those no longer requested.
    pub(crate) fn update(&mut self, subscriptions: Vec<Subscription<Msg>>) {
        let mut requested: HashMap<SubscriptionId, Subscription<Msg>> = subscriptions
            .into_iter()
            .map(|subscription| (subscription.id, subscription))
            .collect();

        let stale: Vec<SubscriptionId> = self
            .running
            .keys()
            .filter(|id| !requested.contains_key(id))
            .copied()
            .collect();

        for id in stale {
            if let Some(handle) = self.running.remove(&id) {
                tracing::trace!(?id, "cancelling subscription");
                handle.cancel();
            }
        }

        requested.retain(|id, _| !self.running.contains_key(id));

        for (id, subscription) in requested {
            tracing::trace!(?id, "starting subscription");
            let handle = self.start(subscription);
            self.running.insert(id, handle);
        }
    }

    fn start(&self, subscription: Subscription<Msg>) -> Handle {
        let token = CancellationToken::new();
        let child = token.clone();
        let tx = self.tx.clone();
        let mut stream = (subscription.spawn)();

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = child.cancelled() => break,
                    item = stream.next() => match item {
                        Some(msg) => {
                            if tx.send(msg).is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });

        Handle::new(token, join)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.running.len()
    }

    /// Cancels every running subscription.
    pub(crate) fn shutdown(&mut self) {
        for (_, handle) in self.running.drain() {
            handle.cancel();
        }
    }
}
