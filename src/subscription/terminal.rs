use std::hash::{DefaultHasher, Hash, Hasher};
use std::io;

use crossterm::event::{Event, EventStream};
use futures::{StreamExt, stream::BoxStream};

use super::{SubscriptionId, SubscriptionSource};

/// Terminal input events (keys, focus changes, resizes) from crossterm's
/// `EventStream`.
///
/// Read errors are forwarded as `Err` items and end the stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TerminalEvents;

impl TerminalEvents {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SubscriptionSource for TerminalEvents {
    type Output = io::Result<Event>;

    fn stream(&self) -> BoxStream<'static, Self::Output> {
        futures::stream::unfold(Some(EventStream::new()), |state| async move {
            let mut events = state?;
            match events.next().await {
                Some(Ok(event)) => Some((Ok(event), Some(events))),
                // Report the error once, then stop.
                Some(Err(e)) => Some((Err(e), None)),
                None => None,
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

impl Hash for TerminalEvents {
    fn hash<H: Hasher>(&self, state: &mut H) {
        "terminal".hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events_id_consistency() {
        assert_eq!(TerminalEvents::new().id(), TerminalEvents::new().id());
    }

    #[test]
    fn test_terminal_events_distinct_from_timer() {
        let timer = crate::subscription::time::Timer::new(0);
        assert_ne!(TerminalEvents::new().id(), timer.id());
    }
}
