//! Reverse-geocoding collaborator boundary
//!
//! The geocoding service is external; this module only fixes its shape. A
//! lookup resolves to at most one placemark, and a failed lookup is
//! indistinguishable from an empty one: both are `None`, never an error.

use core::future::Future;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::types::{Location, Placemark};

/// Asynchronous reverse-geocoding lookup.
///
/// Implemented for any async closure taking a [`Location`], which keeps test
/// doubles and simple adapters free of boilerplate:
///
/// ```
/// use location_streams::geocode::Geocoder;
/// use location_streams::types::{Location, Placemark};
///
/// let geocoder = |_location: Location| async { None::<Placemark> };
/// # fn assert_geocoder(_: &impl Geocoder) {}
/// # assert_geocoder(&geocoder);
/// ```
pub trait Geocoder: Send + Sync {
    /// Resolves a location to zero or one placemarks.
    fn reverse_geocode(&self, location: Location) -> BoxFuture<'static, Option<Placemark>>;
}

impl<F, Fut> Geocoder for F
where
    F: Fn(Location) -> Fut + Send + Sync,
    Fut: Future<Output = Option<Placemark>> + Send + 'static,
{
    fn reverse_geocode(&self, location: Location) -> BoxFuture<'static, Option<Placemark>> {
        (self)(location).boxed()
    }
}
