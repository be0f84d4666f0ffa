//! Stream adapters over the host object and the public stream surface
//!
//! Each submodule owns one bridging concern:
//!
//! - [`property`] turns property observation into streams
//! - [`event`] demultiplexes the shared delegate registration into
//!   per-callback-kind streams
//! - [`query`] wraps one-shot capability queries as single-value streams
//! - [`location`] merges the two current-location channels
//! - [`placemark`] derives reverse-geocoded placemarks from locations
//!
//! The [`LocationManager`] methods below are wiring only: one named stream
//! per underlying property, callback, and capability query, plus the two
//! derived streams.

use crate::Result;
use crate::geocode::Geocoder;
use crate::manager::{
    EventKind, FromPropertyValue, LocationManager, ManagerEvent, PropertyKey,
};
use crate::types::{
    ActivityType, AuthorizationStatus, DeviceOrientation, Heading, Location, LocationFailure,
    RangingUpdate, Region, RegionEvent,
};

/// Callback-kind streams demultiplexed from one delegate registration
pub mod event;

/// Merged current-location stream
pub mod location;

/// Reverse-geocoded placemark derivation
pub mod placemark;

/// Property-observation streams
pub mod property;

/// Capability-query streams, raw and shared
pub mod query;

use event::EventStream;
use location::LocationStream;
use placemark::PlacemarkStream;
use property::PropertyStream;
use query::SharedQueryStream;

impl LocationManager {
    /// Observes a property as a typed stream.
    ///
    /// The stream emits the property's current value at subscription time and
    /// every change thereafter. Values that do not convert to `T` (including
    /// an absent property) are withheld. Fails fast if the host was built
    /// without the requested property.
    pub fn observe<T: FromPropertyValue>(&self, key: PropertyKey) -> Result<PropertyStream<T>> {
        PropertyStream::new(&self.inner, key)
    }

    /// Stream of the `activityType` property.
    pub fn activity_type(&self) -> Result<PropertyStream<ActivityType>> {
        self.observe(PropertyKey::ActivityType)
    }

    /// Stream of the `distanceFilter` property, meters.
    pub fn distance_filter(&self) -> Result<PropertyStream<f64>> {
        self.observe(PropertyKey::DistanceFilter)
    }

    /// Stream of the `desiredAccuracy` property, meters.
    pub fn desired_accuracy(&self) -> Result<PropertyStream<f64>> {
        self.observe(PropertyKey::DesiredAccuracy)
    }

    /// Stream of the `pausesLocationUpdatesAutomatically` property.
    pub fn pauses_location_updates_automatically(&self) -> Result<PropertyStream<bool>> {
        self.observe(PropertyKey::PausesLocationUpdatesAutomatically)
    }

    /// Stream of the `allowsBackgroundLocationUpdates` property.
    pub fn allows_background_location_updates(&self) -> Result<PropertyStream<bool>> {
        self.observe(PropertyKey::AllowsBackgroundLocationUpdates)
    }

    /// Stream of the `showsBackgroundLocationIndicator` property.
    pub fn shows_background_location_indicator(&self) -> Result<PropertyStream<bool>> {
        self.observe(PropertyKey::ShowsBackgroundLocationIndicator)
    }

    /// Stream of the `headingFilter` property, degrees.
    pub fn heading_filter(&self) -> Result<PropertyStream<f64>> {
        self.observe(PropertyKey::HeadingFilter)
    }

    /// Stream of the `headingOrientation` property.
    pub fn heading_orientation(&self) -> Result<PropertyStream<DeviceOrientation>> {
        self.observe(PropertyKey::HeadingOrientation)
    }

    /// Stream of the `heading` property.
    pub fn heading(&self) -> Result<PropertyStream<Heading>> {
        self.observe(PropertyKey::Heading)
    }

    /// Stream of the `maximumRegionMonitoringDistance` property, meters.
    pub fn maximum_region_monitoring_distance(&self) -> Result<PropertyStream<f64>> {
        self.observe(PropertyKey::MaximumRegionMonitoringDistance)
    }

    /// Stream of the `monitoredRegions` property.
    pub fn monitored_regions(&self) -> Result<PropertyStream<Vec<Region>>> {
        self.observe(PropertyKey::MonitoredRegions)
    }

    /// Stream of the `rangedRegions` property.
    pub fn ranged_regions(&self) -> Result<PropertyStream<Vec<Region>>> {
        self.observe(PropertyKey::RangedRegions)
    }

    /// Stream of location-update callbacks, one batch per callback with the
    /// most recent fix last.
    pub fn location_updates(&self) -> EventStream<Vec<Location>> {
        EventStream::new(&self.inner, EventKind::Locations, |event| match event {
            ManagerEvent::LocationsUpdated(batch) => Some(batch),
            _ => None,
        })
    }

    /// Stream of heading-update callbacks.
    pub fn heading_updates(&self) -> EventStream<Heading> {
        EventStream::new(&self.inner, EventKind::Heading, |event| match event {
            ManagerEvent::HeadingUpdated(heading) => Some(heading),
            _ => None,
        })
    }

    /// Stream of authorization-change callbacks.
    pub fn authorization_updates(&self) -> EventStream<AuthorizationStatus> {
        EventStream::new(&self.inner, EventKind::Authorization, |event| match event {
            ManagerEvent::AuthorizationChanged(status) => Some(status),
            _ => None,
        })
    }

    /// Stream of region entry/exit callbacks.
    pub fn region_events(&self) -> EventStream<RegionEvent> {
        EventStream::new(&self.inner, EventKind::Region, |event| match event {
            ManagerEvent::RegionCrossed(crossing) => Some(crossing),
            _ => None,
        })
    }

    /// Stream of beacon-ranging callbacks.
    pub fn ranging_updates(&self) -> EventStream<RangingUpdate> {
        EventStream::new(&self.inner, EventKind::Ranging, |event| match event {
            ManagerEvent::BeaconsRanged(update) => Some(update),
            _ => None,
        })
    }

    /// Stream of acquisition failures.
    ///
    /// Failures arrive here as values; the location and heading streams keep
    /// running across them.
    pub fn failures(&self) -> EventStream<LocationFailure> {
        EventStream::new(&self.inner, EventKind::Failure, |event| match event {
            ManagerEvent::Failed(failure) => Some(failure),
            _ => None,
        })
    }

    /// Whether location services are enabled, as a shared single-value
    /// stream.
    ///
    /// Emits once and stays open until dropped. Concurrent subscribers share
    /// one query execution; once all are gone, the next subscriber re-queries.
    pub fn services_enabled(&self) -> SharedQueryStream<bool> {
        self.inner.shares().services_enabled.subscribe()
    }

    /// Current authorization status, as a shared single-value stream.
    pub fn authorization_status(&self) -> SharedQueryStream<AuthorizationStatus> {
        self.inner.shares().authorization_status.subscribe()
    }

    /// Whether deferred updates are available, as a shared single-value
    /// stream.
    pub fn deferred_updates_available(&self) -> SharedQueryStream<bool> {
        self.inner.shares().deferred_updates_available.subscribe()
    }

    /// Whether significant-change monitoring is available, as a shared
    /// single-value stream.
    pub fn significant_change_monitoring_available(&self) -> SharedQueryStream<bool> {
        self.inner
            .shares()
            .significant_change_monitoring_available
            .subscribe()
    }

    /// Whether a heading sensor is available, as a shared single-value
    /// stream.
    pub fn heading_available(&self) -> SharedQueryStream<bool> {
        self.inner.shares().heading_available.subscribe()
    }

    /// Whether beacon ranging is available, as a shared single-value stream.
    pub fn ranging_available(&self) -> SharedQueryStream<bool> {
        self.inner.shares().ranging_available.subscribe()
    }

    /// Merged current-location stream.
    ///
    /// Combines the location property with the location-update callbacks so
    /// a fix is never missed for arriving on the other channel. See
    /// [`LocationStream`] for the merge semantics.
    pub fn location(&self) -> Result<LocationStream> {
        LocationStream::new(&self.inner)
    }

    /// Reverse-geocoded placemarks for the merged location stream.
    ///
    /// Each location triggers one lookup; unresolved lookups produce no
    /// value. Results arrive in completion order.
    pub fn placemarks<G: Geocoder>(
        &self,
        geocoder: G,
    ) -> Result<PlacemarkStream<LocationStream, G>> {
        Ok(PlacemarkStream::new(self.location()?, geocoder))
    }
}
