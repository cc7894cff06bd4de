//! Timer subscription for periodic events.
//!
//! The app uses a [`Timer`] to animate the posts loading spinner; it is only
//! subscribed while the loading panel is on screen.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Duration;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::time::{MissedTickBehavior, interval};
use tokio_stream::wrappers::IntervalStream;

use super::{SubscriptionId, SubscriptionSource};

/// Messages produced by the [`Timer`] subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// A timer tick has occurred.
    Tick,
}

/// A timer subscription that emits [`Message::Tick`] at a fixed interval.
///
/// Missed ticks are skipped rather than replayed, and the first tick arrives
/// one interval after the subscription starts.
///
/// ```
/// use tally::subscription::{Subscription, time::Timer};
///
/// enum AppMessage {
///     SpinnerTick,
/// }
///
/// let spinner = Subscription::new(Timer::new(100)).map(|_| AppMessage::SpinnerTick);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timer {
    interval_ms: u64,
}

impl Timer {
    /// Create a new timer ticking every `interval_ms` milliseconds.
    #[must_use]
    pub const fn new(interval_ms: u64) -> Self {
        Self { interval_ms }
    }
}

impl SubscriptionSource for Timer {
    type Output = Message;

    fn stream(&self) -> BoxStream<'static, Message> {
        let mut interval = interval(Duration::from_millis(self.interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        IntervalStream::new(interval)
            .skip(1) // the first tick of a tokio interval fires immediately
            .map(|_| Message::Tick)
            .boxed()
    }

    fn id(&self) -> SubscriptionId {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        SubscriptionId::of::<Self>(hasher.finish())
    }
}
