//! In-process publish/subscribe event bus.
//!
//! Delivery is synchronous and follows subscription order within a topic.
//! A handler that returns an error or panics is logged and counted, and the
//! remaining subscribers still receive the event. Nothing is persisted; the
//! campaign log is the durable record of a simulation.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use tracing::warn;
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::event::{BusEvent, EventPayload, Topic};

/// What a handler returns.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Handler = Arc<dyn Fn(&BusEvent) -> HandlerResult + Send + Sync>;

/// Identifies a subscription so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Outcome of delivering one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryReport {
    /// Handlers that completed successfully.
    pub delivered: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

struct Subscriber {
    id: SubscriptionId,
    topic: Topic,
    handler: Handler,
}

struct BusInner {
    subscribers: RwLock<Vec<Subscriber>>,
    next_subscription: AtomicU64,
    sequence: AtomicU64,
    clock: SharedClock,
}

impl BusInner {
    fn publish(&self, topic: Topic, payload: EventPayload) -> DeliveryReport {
        // Handlers run outside the lock so they may publish or subscribe.
        let handlers: Vec<(SubscriptionId, Handler)> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.topic == topic)
            .map(|s| (s.id, Arc::clone(&s.handler)))
            .collect();

        let event = BusEvent {
            event_id: Uuid::new_v4(),
            topic,
            sequence_number: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            occurred_at: self.clock.now(),
            payload,
        };

        let mut report = DeliveryReport::default();
        for (id, handler) in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(error)) => {
                    warn!(topic = %event.topic, subscription = id.0, %error, "event handler failed");
                    report.failed += 1;
                }
                Err(_) => {
                    warn!(topic = %event.topic, subscription = id.0, "event handler panicked");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

/// The owning side of the bus.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("EventBus")
            .field("subscribers", &subscribers)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Creates an empty bus that timestamps events with `clock`.
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: RwLock::new(Vec::new()),
                next_subscription: AtomicU64::new(1),
                sequence: AtomicU64::new(0),
                clock,
            }),
        }
    }

    /// Registers `handler` for events on `topic`.
    pub fn subscribe<F>(&self, topic: impl Into<Topic>, handler: F) -> SubscriptionId
    where
        F: Fn(&BusEvent) -> HandlerResult + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscriber {
                id,
                topic: topic.into(),
                handler: Arc::new(handler),
            });
        id
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    /// Delivers `payload` to every subscriber of `topic`, in subscription
    /// order.
    pub fn publish(&self, topic: impl Into<Topic>, payload: EventPayload) -> DeliveryReport {
        self.inner.publish(topic.into(), payload)
    }

    /// Returns a non-owning, publish-only handle for agents.
    #[must_use]
    pub fn handle(&self) -> BusHandle {
        BusHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// A non-owning, publish-only reference to an [`EventBus`].
#[derive(Clone, Default)]
pub struct BusHandle {
    inner: Weak<BusInner>,
}

impl fmt::Debug for BusHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusHandle")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl BusHandle {
    /// A handle that is not attached to any bus.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Returns `true` while the bus is alive.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Publishes through the bus if it still exists; otherwise does nothing
    /// and returns `None`.
    pub fn publish(&self, topic: impl Into<Topic>, payload: EventPayload) -> Option<DeliveryReport> {
        self.inner
            .upgrade()
            .map(|inner| inner.publish(topic.into(), payload))
    }
}
