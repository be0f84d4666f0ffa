//! Capability queries as single-value streams
//!
//! A capability check is a zero-argument synchronous function, but the public
//! surface treats it like any other continuously-observed source. The shape
//! is "compute once, emit, then stay open until dropped": dropping the stream
//! is its completion.
//!
//! [`query`] is the raw combinator: every stream it returns re-invokes the
//! query. [`SharedQuery`] is the sharing decorator applied at the public
//! surface: concurrent subscribers reuse one execution, and the cached result
//! is discarded once the last subscriber is gone so a later subscription
//! observes a fresh answer.

use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures_util::Stream;

use crate::lock;

/// Wraps a synchronous query as a stream that computes and emits one value
/// on first poll, then idles until dropped.
///
/// Each call produces an independent stream; the query runs once per stream.
pub fn query<V>(query: impl Fn() -> V + Send + Sync + 'static) -> QueryStream<V> {
    QueryStream {
        query: Some(Box::new(query)),
    }
}

/// Single-value stream over a capability query. See [`query`].
pub struct QueryStream<V> {
    query: Option<Box<dyn Fn() -> V + Send + Sync>>,
}

impl<V> Stream for QueryStream<V> {
    type Item = V;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // After the single emission the stream never wakes again; it stays
        // open until the consumer drops it.
        match self.get_mut().query.take() {
            Some(query) => Poll::Ready(Some(query())),
            None => Poll::Pending,
        }
    }
}

struct ShareState<V> {
    active: usize,
    value: Option<V>,
}

/// A capability query shared by concurrent subscribers.
///
/// Subscribers are reference-counted. The query executes once per sharing
/// window: the first demanding subscriber computes, later concurrent
/// subscribers receive the identical cached value, and the cache clears when
/// the count returns to zero.
pub struct SharedQuery<V> {
    query: Box<dyn Fn() -> V + Send + Sync>,
    state: Mutex<ShareState<V>>,
}

impl<V: Clone> SharedQuery<V> {
    pub fn new(query: impl Fn() -> V + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(SharedQuery {
            query: Box::new(query),
            state: Mutex::new(ShareState {
                active: 0,
                value: None,
            }),
        })
    }

    /// Attaches a subscriber to the shared execution.
    pub fn subscribe(self: &Arc<Self>) -> SharedQueryStream<V> {
        lock(&self.state).active += 1;
        SharedQueryStream {
            shared: Arc::clone(self),
            emitted: false,
        }
    }
}

/// One subscriber's view of a [`SharedQuery`]: a single emission, then open
/// until dropped.
pub struct SharedQueryStream<V> {
    shared: Arc<SharedQuery<V>>,
    emitted: bool,
}

impl<V: Clone> Stream for SharedQueryStream<V> {
    type Item = V;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.emitted {
            return Poll::Pending;
        }

        let mut state = lock(&this.shared.state);
        let value = state
            .value
            .get_or_insert_with(|| (this.shared.query)())
            .clone();
        this.emitted = true;
        Poll::Ready(Some(value))
    }
}

impl<V> Drop for SharedQueryStream<V> {
    fn drop(&mut self) {
        let mut state = lock(&self.shared.state);
        state.active -= 1;
        if state.active == 0 {
            // End of the sharing window; the next subscriber re-queries.
            state.value = None;
        }
    }
}
