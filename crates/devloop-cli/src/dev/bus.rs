//! In-process publish/subscribe channel for change notifications.
//!
//! Each subscriber (one per open SSE connection) owns a bounded queue. Publishing
//! uses `try_send`, so a subscriber that stops reading only loses its own
//! messages and never stalls the watch loop or other subscribers.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::Stream;

/// Messages buffered per subscriber before new ones are dropped for it.
pub const SUBSCRIBER_BUFFER: usize = 16;

/// Identifier handed out by [`EventBus::subscribe`].
pub type SubscriptionId = u64;

/// A published event: a topic plus an opaque payload.
///
/// Cheap to clone, so fan-out does not copy the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: Arc<str>,
    pub payload: Arc<[u8]>,
}

#[derive(Default)]
struct Registry {
    subscribers: HashMap<SubscriptionId, mpsc::Sender<Message>>,
    closed: bool,
}

#[derive(Default)]
struct Inner {
    registry: RwLock<Registry>,
    next_id: AtomicU64,
}

impl Inner {
    fn remove(&self, id: SubscriptionId) -> bool {
        self.registry.write().subscribers.remove(&id).is_some()
    }
}

/// Broadcast channel shared by the watch pipeline (publisher) and the SSE
/// handlers (subscribers).
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    ///
    /// After [`close`](Self::close) the returned subscription is already
    /// finished and yields nothing.
    pub fn subscribe(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);

        {
            let mut registry = self.inner.registry.write();
            if !registry.closed {
                registry.subscribers.insert(id, tx);
            }
        }

        tracing::debug!(id, "subscriber registered");
        Subscription {
            id,
            rx,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deregister a subscriber. Returns whether it was still registered;
    /// calling it twice is harmless.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.remove(id)
    }

    /// Deliver a message to every current subscriber without waiting.
    ///
    /// Returns how many subscribers accepted it. Subscribers whose queue is full
    /// miss this message; subscribers whose receiver is gone are removed.
    pub fn publish(&self, topic: &str, payload: impl Into<Arc<[u8]>>) -> usize {
        let message = Message {
            topic: Arc::from(topic),
            payload: payload.into(),
        };

        let mut delivered = 0;
        let mut gone = Vec::new();
        {
            let registry = self.inner.registry.read();
            if registry.closed {
                return 0;
            }
            for (id, tx) in &registry.subscribers {
                match tx.try_send(message.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(id, "subscriber is not keeping up, dropping message");
                    }
                    Err(TrySendError::Closed(_)) => gone.push(*id),
                }
            }
        }

        for id in gone {
            self.inner.remove(id);
        }
        delivered
    }

    /// Close every subscription and turn further publishes into no-ops.
    pub fn close(&self) {
        let mut registry = self.inner.registry.write();
        registry.closed = true;
        registry.subscribers.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.registry.read().closed
    }

    /// Get number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.read().subscribers.len()
    }
}

/// One subscriber's end of the bus. Dropping it unsubscribes.
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::Receiver<Message>,
    bus: Weak<Inner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next message; `None` once the bus is closed or this
    /// subscription was removed.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}

impl Stream for Subscription {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            inner.remove(self.id);
            tracing::debug!(id = self.id, "subscriber removed");
        }
    }
}
