use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::mpsc;

use crate::{types::ObjectId, Pose};

type Subscribers<T> = Vec<(u64, mpsc::UnboundedSender<T>)>;

struct StreamInner<T> {
    next_id: u64,
    subscribers: Subscribers<T>,
}

/// Typed publish/subscribe stream. Each `Subscription` receives every event
/// published after it was created, and unsubscribes when dropped.
pub struct EventStream<T: Clone> {
    inner: Arc<Mutex<StreamInner<T>>>,
}

impl<T: Clone> EventStream<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StreamInner {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, sender));

        Subscription {
            id,
            receiver,
            stream: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `event` to every live subscription. Returns how many received it.
    pub fn publish(&self, event: T) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .subscribers
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
        inner.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .len()
    }
}

impl<T: Clone> Default for EventStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for EventStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Scoped handle on an `EventStream`
pub struct Subscription<T> {
    id: u64,
    receiver: mpsc::UnboundedReceiver<T>,
    stream: Weak<Mutex<StreamInner<T>>>,
}

impl<T> Subscription<T> {
    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Wait for the next event. Returns `None` once the stream is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Every event queued so far
    pub fn drain(&mut self) -> Vec<T> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.upgrade() {
            let mut inner = stream.lock().unwrap_or_else(PoisonError::into_inner);
            inner.subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEventKind {
    Hover,
    Select,
    Move,
    Unselect,
    Cancel,
}

/// A grab interaction with a shared object, raised by the input layer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub object: ObjectId,
    /// Identifies the hand or controller
    pub pointer: u32,
    /// Pose of the grab point
    pub pose: Pose,
}
