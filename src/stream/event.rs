//! Delegate callbacks as per-kind streams
//!
//! The host object carries at most one delegate registration no matter how
//! many callback-kind streams are alive. [`EventHub`] is that registration:
//! a dispatch table keyed by callback kind, reference-counted by its
//! subscriber list. The manager installs it when the first subscriber of any
//! kind attaches and removes it when the last one detaches; individual
//! disposals never disturb sibling streams.
//!
//! No buffering or coalescing happens here beyond each subscriber's own
//! queue: events are fanned out in the order the host raised them.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_channel::mpsc::{UnboundedReceiver, UnboundedSender};
use futures_util::Stream;

use crate::manager::{EventKind, ManagerEvent, ManagerInner};

struct EventSubscriber {
    token: u64,
    kind: EventKind,
    tx: UnboundedSender<ManagerEvent>,
}

/// The single shared delegate registration, demultiplexing by callback kind.
#[derive(Default)]
pub(crate) struct EventHub {
    subscribers: Vec<EventSubscriber>,
}

impl EventHub {
    pub(crate) fn add(&mut self, token: u64, kind: EventKind, tx: UnboundedSender<ManagerEvent>) {
        self.subscribers.push(EventSubscriber { token, kind, tx });
    }

    pub(crate) fn remove(&mut self, token: u64) {
        self.subscribers.retain(|sub| sub.token != token);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Fans an event out to every subscriber of its kind, pruning
    /// subscribers whose receiving stream is gone.
    pub(crate) fn dispatch(&mut self, event: ManagerEvent) {
        let kind = event.kind();
        self.subscribers
            .retain(|sub| sub.kind != kind || sub.tx.unbounded_send(event.clone()).is_ok());
    }
}

/// Detaches the subscriber when the stream is dropped; the manager tears the
/// shared registration down once no subscriber of any kind remains.
struct EventSubscriberGuard {
    inner: Arc<ManagerInner>,
    token: u64,
}

impl Drop for EventSubscriberGuard {
    fn drop(&mut self) {
        self.inner.remove_event_subscriber(self.token);
    }
}

/// Stream of one callback kind's payloads.
///
/// Emits exactly the payload the host delivered, once per callback
/// invocation, in invocation order.
pub struct EventStream<T> {
    rx: UnboundedReceiver<ManagerEvent>,
    project: fn(ManagerEvent) -> Option<T>,
    _guard: EventSubscriberGuard,
}

impl<T> EventStream<T> {
    pub(crate) fn new(
        inner: &Arc<ManagerInner>,
        kind: EventKind,
        project: fn(ManagerEvent) -> Option<T>,
    ) -> Self {
        let (token, rx) = inner.subscribe_events(kind);
        EventStream {
            rx,
            project,
            _guard: EventSubscriberGuard {
                inner: Arc::clone(inner),
                token,
            },
        }
    }
}

impl<T> Stream for EventStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match Pin::new(&mut this.rx).poll_next(cx) {
                Poll::Ready(Some(event)) => {
                    // The hub already filters by kind; the projection only
                    // extracts the payload.
                    if let Some(item) = (this.project)(event) {
                        return Poll::Ready(Some(item));
                    }
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
