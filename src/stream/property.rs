//! Property observation as a stream
//!
//! Bridges the host's observed properties: subscribing registers an observer
//! with the manager, replays the current value, and emits on every change
//! until the stream is dropped. Dropping deregisters the observer exactly
//! once.

use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_channel::mpsc::UnboundedReceiver;
use futures_util::Stream;

use crate::Result;
use crate::manager::{FromPropertyValue, ManagerInner, PropertyKey, PropertyValue};

/// Deregisters the observer when the stream is dropped.
struct PropertyObserverGuard {
    inner: Arc<ManagerInner>,
    key: PropertyKey,
    token: u64,
}

impl Drop for PropertyObserverGuard {
    fn drop(&mut self) {
        self.inner.remove_property_observer(self.key, self.token);
    }
}

/// Stream of a single observed property, converted to `T`.
///
/// Raw values that fail [`FromPropertyValue`] conversion (including the
/// absent value) are withheld: the stream skips them without signalling.
/// Emission order matches the order the host recorded the changes.
pub struct PropertyStream<T> {
    rx: UnboundedReceiver<PropertyValue>,
    _guard: PropertyObserverGuard,
    _value: PhantomData<fn() -> T>,
}

impl<T: FromPropertyValue> PropertyStream<T> {
    pub(crate) fn new(inner: &Arc<ManagerInner>, key: PropertyKey) -> Result<Self> {
        let (token, rx) = inner.observe_property(key)?;
        Ok(PropertyStream {
            rx,
            _guard: PropertyObserverGuard {
                inner: Arc::clone(inner),
                key,
                token,
            },
            _value: PhantomData,
        })
    }
}

impl<T: FromPropertyValue> Stream for PropertyStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match Pin::new(&mut this.rx).poll_next(cx) {
                Poll::Ready(Some(value)) => {
                    if let Some(converted) = T::from_property(value) {
                        return Poll::Ready(Some(converted));
                    }
                    // value withheld; keep draining
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::poll;
    use futures_util::StreamExt;

    use crate::capability::StaticCapabilities;
    use crate::manager::{LocationManager, PropertyKey, PropertyValue};
    use crate::types::{Coordinate, Location};

    #[tokio::test]
    async fn test_current_value_replayed_at_subscription() {
        let manager = LocationManager::new(StaticCapabilities::default());
        manager.update_property(PropertyKey::DistanceFilter, 25.0);

        let mut filter = manager.distance_filter().unwrap();
        assert_eq!(filter.next().await, Some(25.0));
        assert!(poll!(filter.next()).is_pending());
    }

    #[tokio::test]
    async fn test_changes_in_order_with_mismatches_withheld() {
        let manager = LocationManager::new(StaticCapabilities::default());
        let mut filter = manager.distance_filter().unwrap();

        // Initial value is absent and therefore withheld.
        manager.update_property(PropertyKey::DistanceFilter, 10.0);
        // A wrong-typed value from the host is skipped, not an error.
        manager.update_property(PropertyKey::DistanceFilter, PropertyValue::Bool(true));
        manager.update_property(PropertyKey::DistanceFilter, 20.0);

        assert_eq!(filter.next().await, Some(10.0));
        assert_eq!(filter.next().await, Some(20.0));
        assert!(poll!(filter.next()).is_pending());
    }

    #[tokio::test]
    async fn test_absent_location_is_withheld() {
        let manager = LocationManager::new(StaticCapabilities::default());
        let mut observed = manager.observe::<Location>(PropertyKey::Location).unwrap();

        let fix = Location::new(Coordinate {
            latitude: 48.2,
            longitude: 16.4,
        });
        manager.update_property(PropertyKey::Location, fix.clone());
        manager.update_property(PropertyKey::Location, PropertyValue::Absent);

        assert_eq!(observed.next().await, Some(fix));
        assert!(poll!(observed.next()).is_pending());
    }

    #[tokio::test]
    async fn test_drop_deregisters_observer() {
        let manager = LocationManager::new(StaticCapabilities::default());
        let filter = manager.distance_filter().unwrap();
        assert_eq!(
            manager
                .inner
                .property_observer_count(PropertyKey::DistanceFilter),
            1
        );

        drop(filter);
        assert_eq!(
            manager
                .inner
                .property_observer_count(PropertyKey::DistanceFilter),
            0
        );
    }

    #[tokio::test]
    async fn test_independent_subscriptions_each_replay() {
        let manager = LocationManager::new(StaticCapabilities::default());
        manager.update_property(PropertyKey::HeadingFilter, 2.0);

        let mut first = manager.heading_filter().unwrap();
        let mut second = manager.heading_filter().unwrap();
        assert_eq!(first.next().await, Some(2.0));
        assert_eq!(second.next().await, Some(2.0));

        manager.update_property(PropertyKey::HeadingFilter, 4.0);
        assert_eq!(first.next().await, Some(4.0));
        assert_eq!(second.next().await, Some(4.0));
    }
}
