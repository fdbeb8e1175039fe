//! Publish/subscribe with explicit ordering between subscribers.

use super::event::{EventKind, LifecycleEvent};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Subscriber ordering. Higher runs first; equal priorities run in
/// subscription order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventPriority(pub i16);

impl EventPriority {
    pub const FIRST: Self = Self(i16::MAX);
    pub const EARLY: Self = Self(16_384);
    pub const NORMAL: Self = Self(0);
    pub const LATE: Self = Self(-16_384);
    /// Runs after every other subscriber has seen the event.
    pub const LAST: Self = Self(i16::MIN);
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &LifecycleEvent);
}

struct Subscription {
    priority: EventPriority,
    handler: Arc<dyn EventHandler>,
}

#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<EventKind, Vec<Subscription>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        kind: EventKind,
        priority: EventPriority,
        handler: Arc<dyn EventHandler>,
    ) {
        let mut subscribers = self.subscribers.write();
        let list = subscribers.entry(kind).or_default();
        let at = list.partition_point(|s| s.priority >= priority);
        list.insert(at, Subscription { priority, handler });
    }

    /// Deliver `event` to every subscriber of its kind, highest priority first.
    pub async fn publish(&self, event: LifecycleEvent) {
        let kind = event.kind();
        let handlers: Vec<Arc<dyn EventHandler>> = self
            .subscribers
            .read()
            .get(&kind)
            .map(|list| list.iter().map(|s| Arc::clone(&s.handler)).collect())
            .unwrap_or_default();

        trace!(kind = %kind, subscribers = handlers.len(), "Publishing lifecycle event");
        for handler in handlers {
            handler.handle(&event).await;
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.read().get(&kind).map_or(0, Vec::len)
    }
}
