//! Shake broadcast channel.
//!
//! Delivery is at-most-once and best-effort. The channel retains only the
//! newest event: a subscriber that falls behind skips straight to it, and an
//! event published while nobody is subscribed is dropped.

use tokio::sync::broadcast;
use tracing::debug;

/// Zero-payload shake signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShakeEvent;

/// Single-producer, multi-subscriber channel for [`ShakeEvent`]s.
///
/// Cheap to clone; all clones publish to the same subscribers.
#[derive(Debug, Clone)]
pub struct ShakeBus {
    tx: broadcast::Sender<ShakeEvent>,
}

impl Default for ShakeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ShakeBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShakeSubscription {
        ShakeSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Publish one shake. Returns how many subscribers it reached.
    pub fn publish(&self) -> usize {
        match self.tx.send(ShakeEvent) {
            Ok(n) => n,
            Err(_) => {
                debug!("shake dropped, no subscribers");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Live sequence of shake signals.
#[derive(Debug)]
pub struct ShakeSubscription {
    rx: broadcast::Receiver<ShakeEvent>,
}

impl ShakeSubscription {
    /// Wait for the next shake. `None` once every [`ShakeBus`] clone is gone.
    pub async fn next(&mut self) -> Option<ShakeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "subscriber lagged, collecting latest shake");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`next`](Self::next).
    pub fn try_next(&mut self) -> Option<ShakeEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let bus = ShakeBus::new();
        assert_eq!(bus.publish(), 0);
        let mut late = bus.subscribe();
        assert!(late.try_next().is_none());
    }

    #[test]
    fn every_subscriber_sees_the_event() {
        let bus = ShakeBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.publish(), 2);
        assert_eq!(a.try_next(), Some(ShakeEvent));
        assert_eq!(b.try_next(), Some(ShakeEvent));
        assert!(a.try_next().is_none());
    }

    #[test]
    fn slow_subscriber_collects_only_latest() {
        let bus = ShakeBus::new();
        let mut slow = bus.subscribe();
        bus.publish();
        bus.publish();
        bus.publish();
        assert_eq!(slow.try_next(), Some(ShakeEvent));
        assert!(slow.try_next().is_none());
    }

    #[tokio::test]
    async fn next_ends_when_bus_dropped() {
        let bus = ShakeBus::new();
        let mut sub = bus.subscribe();
        drop(bus);
        assert_eq!(sub.next().await, None);
    }
}
