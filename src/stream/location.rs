//! Merged current-location stream
//!
//! The host reports the current location through two independent channels:
//! the observed `location` property and the location-updates callback. The
//! runtime drives them asynchronously and not necessarily together, so a
//! consumer watching only one channel can miss fixes. This stream merges
//! both.
//!
//! Merge semantics: a value surfaces whenever either source emits. Each
//! source's own order is preserved; there is no ordering guarantee across
//! sources and no deduplication. A fix the runtime reports through both
//! channels appears twice, intentionally: the property side carries
//! "last known" semantics, the callback side "fresh update".

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;

use crate::Result;
use crate::manager::{EventKind, ManagerEvent, ManagerInner, PropertyKey};
use crate::stream::event::EventStream;
use crate::stream::property::PropertyStream;
use crate::types::Location;

/// The unified "current location" signal.
///
/// Absent values on the property side are filtered out before the merge:
/// presence, not absence, is meaningful here. Callback batches contribute
/// their most recent fix; empty batches contribute nothing.
pub struct LocationStream {
    property: PropertyStream<Location>,
    updates: EventStream<Vec<Location>>,
    property_done: bool,
    updates_done: bool,
    updates_first: bool,
}

impl LocationStream {
    pub(crate) fn new(inner: &Arc<ManagerInner>) -> Result<Self> {
        let property = PropertyStream::new(inner, PropertyKey::Location)?;
        let updates = EventStream::new(inner, EventKind::Locations, |event| match event {
            ManagerEvent::LocationsUpdated(batch) => Some(batch),
            _ => None,
        });
        Ok(LocationStream {
            property,
            updates,
            property_done: false,
            updates_done: false,
            updates_first: false,
        })
    }

    fn poll_property(&mut self, cx: &mut Context<'_>) -> Poll<Option<Location>> {
        if self.property_done {
            return Poll::Ready(None);
        }
        match Pin::new(&mut self.property).poll_next(cx) {
            Poll::Ready(Some(location)) => Poll::Ready(Some(location)),
            Poll::Ready(None) => {
                self.property_done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn poll_updates(&mut self, cx: &mut Context<'_>) -> Poll<Option<Location>> {
        if self.updates_done {
            return Poll::Ready(None);
        }
        loop {
            match Pin::new(&mut self.updates).poll_next(cx) {
                Poll::Ready(Some(batch)) => {
                    // Most recent fix is last in the batch.
                    if let Some(latest) = batch.into_iter().last() {
                        return Poll::Ready(Some(latest));
                    }
                }
                Poll::Ready(None) => {
                    self.updates_done = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Stream for LocationStream {
    type Item = Location;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        // Alternate which source drains first so neither starves the other.
        this.updates_first = !this.updates_first;

        if this.updates_first {
            if let Poll::Ready(Some(location)) = this.poll_updates(cx) {
                return Poll::Ready(Some(location));
            }
            if let Poll::Ready(Some(location)) = this.poll_property(cx) {
                return Poll::Ready(Some(location));
            }
        } else {
            if let Poll::Ready(Some(location)) = this.poll_property(cx) {
                return Poll::Ready(Some(location));
            }
            if let Poll::Ready(Some(location)) = this.poll_updates(cx) {
                return Poll::Ready(Some(location));
            }
        }

        if this.property_done && this.updates_done {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::poll;
    use futures_util::StreamExt;

    use crate::capability::StaticCapabilities;
    use crate::manager::{LocationManager, ManagerEvent, PropertyKey, PropertyValue};
    use crate::types::{Coordinate, Location};

    fn fix(latitude: f64) -> Location {
        Location::new(Coordinate {
            latitude,
            longitude: 0.0,
        })
    }

    #[tokio::test]
    async fn test_both_channels_reach_the_consumer() {
        let manager = LocationManager::new(StaticCapabilities::default());
        let mut locations = manager.location().unwrap();

        let from_property = fix(10.0);
        let from_callback = fix(20.0);
        manager.update_property(PropertyKey::Location, from_property.clone());
        manager.dispatch_event(ManagerEvent::LocationsUpdated(vec![from_callback.clone()]));

        let mut received = vec![
            locations.next().await.unwrap(),
            locations.next().await.unwrap(),
        ];
        assert!(poll!(locations.next()).is_pending());

        received.sort_by(|a, b| a.coordinate.latitude.total_cmp(&b.coordinate.latitude));
        assert_eq!(received, vec![from_property, from_callback]);
    }

    #[tokio::test]
    async fn test_exactly_n_plus_m_values() {
        let manager = LocationManager::new(StaticCapabilities::default());
        let mut locations = manager.location().unwrap();

        // N = 2 property emissions after filtering the absent one.
        manager.update_property(PropertyKey::Location, fix(1.0));
        manager.update_property(PropertyKey::Location, PropertyValue::Absent);
        manager.update_property(PropertyKey::Location, fix(2.0));
        // M = 2 callback batches; the empty one contributes nothing.
        manager.dispatch_event(ManagerEvent::LocationsUpdated(vec![fix(3.0), fix(4.0)]));
        manager.dispatch_event(ManagerEvent::LocationsUpdated(vec![]));
        manager.dispatch_event(ManagerEvent::LocationsUpdated(vec![fix(5.0)]));

        let mut received = Vec::new();
        for _ in 0..4 {
            received.push(locations.next().await.unwrap());
        }
        assert!(poll!(locations.next()).is_pending());

        let mut latitudes: Vec<f64> = received
            .iter()
            .map(|location| location.coordinate.latitude)
            .collect();
        latitudes.sort_by(f64::total_cmp);
        // Batches contribute only their most recent fix (4.0, not 3.0).
        assert_eq!(latitudes, vec![1.0, 2.0, 4.0, 5.0]);
    }

    #[tokio::test]
    async fn test_batch_contributes_latest_fix() {
        let manager = LocationManager::new(StaticCapabilities::default());
        let mut locations = manager.location().unwrap();

        manager.dispatch_event(ManagerEvent::LocationsUpdated(vec![
            fix(1.0),
            fix(2.0),
            fix(3.0),
        ]));
        assert_eq!(
            locations.next().await.unwrap().coordinate.latitude,
            3.0
        );
        assert!(poll!(locations.next()).is_pending());
    }

    #[tokio::test]
    async fn test_duplicate_fix_on_both_channels_is_not_deduplicated() {
        let manager = LocationManager::new(StaticCapabilities::default());
        let mut locations = manager.location().unwrap();

        let same = fix(7.0);
        manager.update_property(PropertyKey::Location, same.clone());
        manager.dispatch_event(ManagerEvent::LocationsUpdated(vec![same.clone()]));

        assert_eq!(locations.next().await, Some(same.clone()));
        assert_eq!(locations.next().await, Some(same));
        assert!(poll!(locations.next()).is_pending());
    }

    #[tokio::test]
    async fn test_source_order_preserved_within_each_channel() {
        let manager = LocationManager::new(StaticCapabilities::default());
        let mut locations = manager.location().unwrap();

        manager.update_property(PropertyKey::Location, fix(1.0));
        manager.update_property(PropertyKey::Location, fix(2.0));

        assert_eq!(locations.next().await.unwrap().coordinate.latitude, 1.0);
        assert_eq!(locations.next().await.unwrap().coordinate.latitude, 2.0);
    }
}
