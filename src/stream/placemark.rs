//! Placemark derivation by reverse geocoding
//!
//! Subscribes to a location source and issues one asynchronous lookup per
//! received fix. Lookups run concurrently and results surface in completion
//! order; there is no reordering buffer. A lookup that resolves to nothing
//! produces no value, so the derived stream emits at most one placemark per
//! source location.
//!
//! Dropping the stream drops the source subscription and every in-flight
//! lookup, so a result completing after disposal can never be delivered.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;

use crate::geocode::Geocoder;
use crate::types::{Location, Placemark};

/// Stream of placemarks derived from a location stream. See the module docs
/// for the concurrency and disposal semantics.
pub struct PlacemarkStream<S, G> {
    source: S,
    geocoder: G,
    lookups: FuturesUnordered<BoxFuture<'static, Option<Placemark>>>,
    source_done: bool,
}

impl<S, G> PlacemarkStream<S, G>
where
    S: Stream<Item = Location> + Unpin,
    G: Geocoder,
{
    pub fn new(source: S, geocoder: G) -> Self {
        PlacemarkStream {
            source,
            geocoder,
            lookups: FuturesUnordered::new(),
            source_done: false,
        }
    }
}

impl<S, G> Stream for PlacemarkStream<S, G>
where
    S: Stream<Item = Location> + Unpin,
    G: Geocoder + Unpin,
{
    type Item = Placemark;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        // Start a lookup for every location the source has produced.
        while !this.source_done {
            match Pin::new(&mut this.source).poll_next(cx) {
                Poll::Ready(Some(location)) => {
                    this.lookups.push(this.geocoder.reverse_geocode(location));
                }
                Poll::Ready(None) => this.source_done = true,
                Poll::Pending => break,
            }
        }

        loop {
            match Pin::new(&mut this.lookups).poll_next(cx) {
                Poll::Ready(Some(Some(placemark))) => return Poll::Ready(Some(placemark)),
                // Unresolved lookup: no output for this input.
                Poll::Ready(Some(None)) => continue,
                Poll::Ready(None) => {
                    return if this.source_done {
                        Poll::Ready(None)
                    } else {
                        Poll::Pending
                    };
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::channel::oneshot;
    use futures::poll;
    use futures_util::{StreamExt, stream};

    use super::PlacemarkStream;
    use crate::capability::StaticCapabilities;
    use crate::manager::{LocationManager, ManagerEvent};
    use crate::types::{Coordinate, Location, Placemark};

    fn fix(latitude: f64) -> Location {
        Location::new(Coordinate {
            latitude,
            longitude: 0.0,
        })
    }

    fn place(name: &str) -> Placemark {
        Placemark {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unresolved_lookups_leave_gaps() {
        // L1 resolves to P1, L2 resolves to nothing, L3 resolves to P3.
        let geocoder = |location: Location| async move {
            match location.coordinate.latitude {
                1.0 => Some(place("P1")),
                3.0 => Some(place("P3")),
                _ => None,
            }
        };

        let source = stream::iter(vec![fix(1.0), fix(2.0), fix(3.0)]);
        let placemarks: Vec<Placemark> =
            PlacemarkStream::new(source, geocoder).collect().await;

        assert_eq!(placemarks, vec![place("P1"), place("P3")]);
    }

    #[tokio::test]
    async fn test_results_surface_in_completion_order() {
        let (first_tx, first_rx) = oneshot::channel::<Option<Placemark>>();
        let (second_tx, second_rx) = oneshot::channel::<Option<Placemark>>();

        // Hands each lookup the next pending receiver, in request order.
        let pending = Mutex::new(vec![second_rx, first_rx]);
        let geocoder = move |_location: Location| {
            let rx = pending.lock().unwrap().pop().expect("more lookups than receivers");
            async move { rx.await.unwrap_or(None) }
        };

        let source = stream::iter(vec![fix(1.0), fix(2.0)]);
        let mut placemarks = PlacemarkStream::new(source, geocoder);

        // Both lookups are in flight; nothing has completed yet.
        assert!(poll!(placemarks.next()).is_pending());

        second_tx.send(Some(place("P2"))).unwrap();
        assert_eq!(placemarks.next().await, Some(place("P2")));
        first_tx.send(Some(place("P1"))).unwrap();
        assert_eq!(placemarks.next().await, Some(place("P1")));
        assert_eq!(placemarks.next().await, None);
    }

    #[tokio::test]
    async fn test_disposal_discards_inflight_results() {
        let (tx, rx) = oneshot::channel::<Option<Placemark>>();
        let slot = Mutex::new(Some(rx));
        let geocoder = move |_location: Location| {
            let rx = slot.lock().unwrap().take().expect("single lookup");
            async move { rx.await.unwrap_or(None) }
        };

        let source = stream::iter(vec![fix(1.0)]);
        let mut placemarks = PlacemarkStream::new(source, geocoder);
        assert!(poll!(placemarks.next()).is_pending());

        drop(placemarks);
        // The lookup future is gone; its result has nowhere to land.
        assert!(tx.send(Some(place("late"))).is_err());
    }

    #[tokio::test]
    async fn test_derived_from_merged_location_stream() {
        let manager = LocationManager::new(StaticCapabilities::default());
        let geocoder = |location: Location| async move {
            Some(Placemark {
                name: Some(format!("lat {}", location.coordinate.latitude)),
                ..Default::default()
            })
        };
        let mut placemarks = manager.placemarks(geocoder).unwrap();

        manager.dispatch_event(ManagerEvent::LocationsUpdated(vec![fix(9.0)]));
        assert_eq!(placemarks.next().await, Some(place("lat 9")));
        assert!(poll!(placemarks.next()).is_pending());
    }

    #[tokio::test]
    async fn test_at_most_one_placemark_per_location() {
        let geocoder = |_location: Location| async { Some(place("only")) };
        let source = stream::iter(vec![fix(1.0), fix(2.0)]);
        let placemarks: Vec<Placemark> =
            PlacemarkStream::new(source, geocoder).collect().await;
        assert_eq!(placemarks.len(), 2);
    }
}
