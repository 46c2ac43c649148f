//! # Event Bus
//!
//! Topic-keyed publish/subscribe with per-subscriber filter predicates.
//!
//! Every subscriber owns a bounded `tokio::sync::broadcast` channel with a
//! single receiver. Sending never waits: when a subscriber's buffer is full the
//! channel overwrites that subscriber's oldest event and the receiver observes
//! the gap as `Lagged`. The registry lock is only held long enough to snapshot
//! a topic's subscriber list; fan-out happens without it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use futures::Stream;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Per-subscriber buffer size when none is configured.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

pub type SubscriptionId = u64;

type Filter<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

struct Subscriber<E> {
    id: SubscriptionId,
    filter: Filter<E>,
    sender: broadcast::Sender<E>,
    active: AtomicBool,
}

struct Registry<E> {
    topics: HashMap<String, Vec<Arc<Subscriber<E>>>>,
    shut_down: bool,
}

struct Inner<E> {
    registry: RwLock<Registry<E>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl<E> Inner<E> {
    fn read(&self) -> RwLockReadGuard<'_, Registry<E>> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry<E>> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deregister a subscriber. Returns false if it was already gone.
    fn remove(&self, id: SubscriptionId) -> bool {
        let mut registry = self.write();
        let mut removed = false;
        registry.topics.retain(|_, subscribers| {
            if let Some(pos) = subscribers.iter().position(|s| s.id == id) {
                subscribers.remove(pos).active.store(false, Ordering::Release);
                removed = true;
            }
            !subscribers.is_empty()
        });
        removed
    }
}

/// Process-wide broker. Cloning is cheap and shares the same registry.
pub struct EventBus<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Clone + Send + 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send + 'static> EventBus<E> {
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_SUBSCRIBER_BUFFER)
    }

    /// `buffer` is the number of undelivered events each subscriber may hold
    /// before its oldest ones are dropped.
    pub fn with_buffer(buffer: usize) -> Self {
        if buffer == 0 {
            warn!("Subscriber buffer of 0 requested, using 1");
        }
        Self {
            inner: Arc::new(Inner {
                registry: RwLock::new(Registry {
                    topics: HashMap::new(),
                    shut_down: false,
                }),
                next_id: AtomicU64::new(1),
                buffer: buffer.max(1),
            }),
        }
    }

    pub fn buffer(&self) -> usize {
        self.inner.buffer
    }

    /// Register interest in `topic`. Only events published after this call and
    /// accepted by `filter` are delivered.
    pub fn subscribe<F>(&self, topic: &str, filter: F) -> Subscription<E>
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = broadcast::channel(self.inner.buffer);

        let mut registry = self.inner.write();
        if registry.shut_down {
            // Sender is never registered, so the subscription ends immediately.
            debug!(topic, id, "Subscribe after shutdown");
        } else {
            registry
                .topics
                .entry(topic.to_string())
                .or_default()
                .push(Arc::new(Subscriber {
                    id,
                    filter: Arc::new(filter),
                    sender,
                    active: AtomicBool::new(true),
                }));
            debug!(topic, id, "Subscription registered");
        }
        drop(registry);

        Subscription {
            id,
            topic: topic.to_string(),
            receiver,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `event` to every matching subscriber on `topic`.
    /// Returns the number of subscribers the event was handed to.
    pub fn publish(&self, topic: &str, event: E) -> usize {
        let subscribers: Vec<Arc<Subscriber<E>>> = match self.inner.read().topics.get(topic) {
            Some(subscribers) => subscribers.clone(),
            None => {
                debug!(topic, "Event published with no subscribers");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for subscriber in &subscribers {
            if !subscriber.active.load(Ordering::Acquire) || !(subscriber.filter)(&event) {
                continue;
            }
            match subscriber.sender.send(event.clone()) {
                Ok(_) => delivered += 1,
                Err(_) => closed.push(subscriber.id),
            }
        }

        for id in closed {
            if self.inner.remove(id) {
                debug!(topic, id, "Dropped subscriber with closed connection");
            }
        }

        debug!(
            topic,
            delivered,
            subscribers = subscribers.len(),
            "Event published"
        );
        delivered
    }

    /// Deregister a subscriber. Safe to call repeatedly and from any thread.
    pub fn cancel(&self, id: SubscriptionId) -> bool {
        let removed = self.inner.remove(id);
        if removed {
            debug!(id, "Subscription cancelled");
        }
        removed
    }

    /// Cancel every live subscription. Their streams end once drained.
    pub fn shutdown(&self) {
        let mut registry = self.inner.write();
        registry.shut_down = true;
        let mut cancelled = 0;
        for (_, subscribers) in registry.topics.drain() {
            for subscriber in subscribers {
                subscriber.active.store(false, Ordering::Release);
                cancelled += 1;
            }
        }
        debug!(cancelled, "Event bus shut down");
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.read().topics.get(topic).map_or(0, Vec::len)
    }
}

/// Handle to one live subscription. Dropping it cancels the subscription.
pub struct Subscription<E> {
    id: SubscriptionId,
    topic: String,
    receiver: broadcast::Receiver<E>,
    bus: Weak<Inner<E>>,
}

impl<E> Subscription<E> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn cancel(&self) {
        if let Some(inner) = self.bus.upgrade() {
            inner.remove(self.id);
        }
    }
}

impl<E: Clone + Send + 'static> Subscription<E> {
    /// Wait for the next delivered event. `None` once cancelled or shut down.
    pub async fn recv(&mut self) -> Option<E> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        topic = %self.topic,
                        id = self.id,
                        skipped,
                        "Subscriber buffer full, oldest events dropped"
                    );
                }
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<E> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(topic = %self.topic, id = self.id, skipped, "Subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }

    /// Lazy stream of delivered events; the subscription lives as long as the stream.
    pub fn into_stream(self) -> impl Stream<Item = E> + Send + 'static {
        async_stream::stream! {
            let mut subscription = self;
            while let Some(event) = subscription.recv().await {
                yield event;
            }
        }
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            if inner.remove(self.id) {
                debug!(topic = %self.topic, id = self.id, "Subscription dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::time::timeout;

    const TOPIC: &str = "numbers";

    #[tokio::test]
    async fn publish_without_subscribers_delivers_nothing() {
        let bus = EventBus::<u32>::new();
        assert_eq!(bus.publish(TOPIC, 1), 0);
    }

    #[tokio::test]
    async fn filter_decides_delivery() {
        let bus = EventBus::<u32>::new();
        let mut evens = bus.subscribe(TOPIC, |n| n % 2 == 0);
        let mut odds = bus.subscribe(TOPIC, |n| n % 2 == 1);

        assert_eq!(bus.publish(TOPIC, 4), 1);

        let got = timeout(Duration::from_millis(100), evens.recv())
            .await
            .expect("timeout")
            .expect("event");
        assert_eq!(got, 4);
        assert_eq!(odds.try_recv(), None);
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let bus = EventBus::<u32>::new();
        let mut other = bus.subscribe("other", |_| true);
        bus.publish(TOPIC, 7);
        assert_eq!(other.try_recv(), None);
    }

    #[tokio::test]
    async fn no_backlog_replay() {
        let bus = EventBus::<u32>::new();
        let _early = bus.subscribe(TOPIC, |_| true);
        bus.publish(TOPIC, 1);

        let mut late = bus.subscribe(TOPIC, |_| true);
        assert_eq!(late.try_recv(), None);

        bus.publish(TOPIC, 2);
        assert_eq!(late.try_recv(), Some(2));
    }

    #[tokio::test]
    async fn delivery_is_fifo_per_subscriber() {
        let bus = EventBus::<u32>::new();
        let mut sub = bus.subscribe(TOPIC, |_| true);
        for n in 0..10 {
            bus.publish(TOPIC, n);
        }
        let mut seen = Vec::new();
        while let Some(n) = sub.try_recv() {
            seen.push(n);
        }
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn zero_buffer_is_raised_to_one() {
        let bus: EventBus<u32> = EventBus::with_buffer(0);
        assert_eq!(bus.buffer(), 1);
    }

    #[tokio::test]
    async fn slow_subscriber_loses_oldest_without_affecting_others() {
        let bus = EventBus::<u32>::with_buffer(2);
        let mut slow = bus.subscribe(TOPIC, |_| true);
        let mut fast = bus.subscribe(TOPIC, |_| true);

        let mut fast_seen = Vec::new();
        for n in 1..=5 {
            assert_eq!(bus.publish(TOPIC, n), 2);
            fast_seen.push(fast.try_recv().expect("fast subscriber keeps up"));
        }

        assert_eq!(fast_seen, vec![1, 2, 3, 4, 5]);
        assert_eq!(slow.recv().await, Some(4));
        assert_eq!(slow.recv().await, Some(5));
        assert_eq!(slow.try_recv(), None);
    }

    #[tokio::test]
    async fn dropping_subscription_deregisters() {
        let bus = EventBus::<u32>::new();
        {
            let _a = bus.subscribe(TOPIC, |_| true);
            let _b = bus.subscribe(TOPIC, |_| true);
            assert_eq!(bus.subscriber_count(TOPIC), 2);
        }
        assert_eq!(bus.subscriber_count(TOPIC), 0);
        assert_eq!(bus.publish(TOPIC, 1), 0);
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_ends_stream() {
        let bus = EventBus::<u32>::new();
        let mut sub = bus.subscribe(TOPIC, |_| true);

        assert!(bus.cancel(sub.id()));
        assert!(!bus.cancel(sub.id()));
        sub.cancel();

        assert_eq!(bus.publish(TOPIC, 1), 0);
        let ended = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout");
        assert_eq!(ended, None);
    }

    #[tokio::test]
    async fn shutdown_ends_all_streams() {
        let bus = EventBus::<u32>::new();
        let a = bus.subscribe(TOPIC, |_| true).into_stream();
        let b = bus.subscribe("other", |_| true).into_stream();

        bus.shutdown();

        let a: Vec<u32> = timeout(Duration::from_millis(100), a.collect())
            .await
            .expect("timeout");
        let b: Vec<u32> = timeout(Duration::from_millis(100), b.collect())
            .await
            .expect("timeout");
        assert!(a.is_empty() && b.is_empty());

        let mut late = bus.subscribe(TOPIC, |_| true);
        assert_eq!(bus.subscriber_count(TOPIC), 0);
        assert_eq!(late.recv().await, None);
    }

    #[tokio::test]
    async fn stream_yields_events_across_tasks() {
        let bus = EventBus::<u32>::new();
        let stream = bus.subscribe(TOPIC, |n| *n > 10).into_stream();

        let publisher = bus.clone();
        tokio::spawn(async move {
            for n in [5, 11, 3, 12] {
                publisher.publish(TOPIC, n);
            }
        });

        let got: Vec<u32> = timeout(Duration::from_secs(1), stream.take(2).collect())
            .await
            .expect("timeout");
        assert_eq!(got, vec![11, 12]);
    }
}
