//! Host-object handle standing in for the platform location runtime
//!
//! [`LocationManager`] is the boundary between the platform driver and the
//! stream adapters. The driver feeds it through two operations:
//! [`LocationManager::update_property`] for observed-property changes and
//! [`LocationManager::dispatch_event`] for delegate-style callbacks. The
//! stream modules register against the shared inner state and are fanned out
//! from here.
//!
//! Capability queries are injected at construction (see [`crate::capability`])
//! rather than read from an ambient global, so hosts and tests can substitute
//! their own sources.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace, warn};

use crate::capability::{CapabilityShares, CapabilitySource};
use crate::error::LocationStreamError;
use crate::lock;
use crate::stream::event::EventHub;
use crate::types::{
    ActivityType, AuthorizationStatus, DeviceOrientation, Heading, Location, LocationFailure,
    RangingUpdate, Region, RegionEvent,
};
use crate::Result;

/// Identifier of an observable property on the host object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    ActivityType,
    DistanceFilter,
    DesiredAccuracy,
    PausesLocationUpdatesAutomatically,
    AllowsBackgroundLocationUpdates,
    ShowsBackgroundLocationIndicator,
    Location,
    HeadingFilter,
    HeadingOrientation,
    Heading,
    MaximumRegionMonitoringDistance,
    MonitoredRegions,
    RangedRegions,
}

impl PropertyKey {
    /// Every property a standard host exposes for observation.
    pub const ALL: [PropertyKey; 13] = [
        PropertyKey::ActivityType,
        PropertyKey::DistanceFilter,
        PropertyKey::DesiredAccuracy,
        PropertyKey::PausesLocationUpdatesAutomatically,
        PropertyKey::AllowsBackgroundLocationUpdates,
        PropertyKey::ShowsBackgroundLocationIndicator,
        PropertyKey::Location,
        PropertyKey::HeadingFilter,
        PropertyKey::HeadingOrientation,
        PropertyKey::Heading,
        PropertyKey::MaximumRegionMonitoringDistance,
        PropertyKey::MonitoredRegions,
        PropertyKey::RangedRegions,
    ];
}

/// Dynamically-typed value of an observed property.
///
/// Observation streams convert these to their expected type; values that do
/// not convert are withheld, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// The property currently has no value
    Absent,
    Bool(bool),
    Number(f64),
    ActivityType(ActivityType),
    Orientation(DeviceOrientation),
    Location(Location),
    Heading(Heading),
    Regions(Vec<Region>),
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<ActivityType> for PropertyValue {
    fn from(value: ActivityType) -> Self {
        PropertyValue::ActivityType(value)
    }
}

impl From<DeviceOrientation> for PropertyValue {
    fn from(value: DeviceOrientation) -> Self {
        PropertyValue::Orientation(value)
    }
}

impl From<Location> for PropertyValue {
    fn from(value: Location) -> Self {
        PropertyValue::Location(value)
    }
}

impl From<Heading> for PropertyValue {
    fn from(value: Heading) -> Self {
        PropertyValue::Heading(value)
    }
}

impl From<Vec<Region>> for PropertyValue {
    fn from(value: Vec<Region>) -> Self {
        PropertyValue::Regions(value)
    }
}

/// Conversion from a raw property value to a stream's item type.
///
/// Returning `None` withholds the value from the stream.
pub trait FromPropertyValue: Sized {
    fn from_property(value: PropertyValue) -> Option<Self>;
}

impl FromPropertyValue for bool {
    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl FromPropertyValue for f64 {
    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl FromPropertyValue for ActivityType {
    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::ActivityType(activity) => Some(activity),
            _ => None,
        }
    }
}

impl FromPropertyValue for DeviceOrientation {
    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Orientation(orientation) => Some(orientation),
            _ => None,
        }
    }
}

impl FromPropertyValue for Location {
    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Location(location) => Some(location),
            _ => None,
        }
    }
}

impl FromPropertyValue for Heading {
    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Heading(heading) => Some(heading),
            _ => None,
        }
    }
}

impl FromPropertyValue for Vec<Region> {
    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Regions(regions) => Some(regions),
            _ => None,
        }
    }
}

/// A delegate-style callback raised by the location runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    /// Batch of fixes, most recent last
    LocationsUpdated(Vec<Location>),
    HeadingUpdated(Heading),
    AuthorizationChanged(AuthorizationStatus),
    RegionCrossed(RegionEvent),
    BeaconsRanged(RangingUpdate),
    /// Acquisition failure; delivered as a value, never a termination
    Failed(LocationFailure),
}

impl ManagerEvent {
    pub(crate) fn kind(&self) -> EventKind {
        match self {
            ManagerEvent::LocationsUpdated(_) => EventKind::Locations,
            ManagerEvent::HeadingUpdated(_) => EventKind::Heading,
            ManagerEvent::AuthorizationChanged(_) => EventKind::Authorization,
            ManagerEvent::RegionCrossed(_) => EventKind::Region,
            ManagerEvent::BeaconsRanged(_) => EventKind::Ranging,
            ManagerEvent::Failed(_) => EventKind::Failure,
        }
    }
}

/// Callback kind used to demultiplex the shared delegate registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum EventKind {
    Locations,
    Heading,
    Authorization,
    Region,
    Ranging,
    Failure,
}

struct PropertyObserver {
    token: u64,
    tx: UnboundedSender<PropertyValue>,
}

struct PropertyEntry {
    value: PropertyValue,
    observers: Vec<PropertyObserver>,
}

pub(crate) struct ManagerInner {
    properties: Mutex<HashMap<PropertyKey, PropertyEntry>>,
    /// At most one delegate registration, shared by every callback stream
    delegate: Mutex<Option<EventHub>>,
    shares: CapabilityShares,
    next_token: AtomicU64,
}

/// Handle to the host location object.
///
/// Cheap to clone; all clones share one property table, one delegate slot,
/// and one set of capability shares. The platform driver and the stream
/// consumers hold clones of the same handle.
#[derive(Clone)]
pub struct LocationManager {
    pub(crate) inner: Arc<ManagerInner>,
}

impl LocationManager {
    /// Creates a host handle exposing the full standard property set.
    ///
    /// # Arguments
    /// * `capabilities` - Source answering the synchronous capability queries
    pub fn new(capabilities: impl CapabilitySource + 'static) -> Self {
        Self::with_properties(capabilities, PropertyKey::ALL)
    }

    /// Creates a host handle exposing only the given observable properties.
    ///
    /// Observing a property outside this set fails at subscription time with
    /// [`LocationStreamError::UnsupportedProperty`].
    pub fn with_properties(
        capabilities: impl CapabilitySource + 'static,
        keys: impl IntoIterator<Item = PropertyKey>,
    ) -> Self {
        let capabilities: Arc<dyn CapabilitySource> = Arc::new(capabilities);
        let properties = keys
            .into_iter()
            .map(|key| {
                (
                    key,
                    PropertyEntry {
                        value: PropertyValue::Absent,
                        observers: Vec::new(),
                    },
                )
            })
            .collect();

        LocationManager {
            inner: Arc::new(ManagerInner {
                properties: Mutex::new(properties),
                delegate: Mutex::new(None),
                shares: CapabilityShares::new(&capabilities),
                next_token: AtomicU64::new(0),
            }),
        }
    }

    /// Records a property change and fans it out to active observers.
    ///
    /// Driver-side entry point. Updates to properties the host was built
    /// without are ignored.
    pub fn update_property(&self, key: PropertyKey, value: impl Into<PropertyValue>) {
        self.inner.update_property(key, value.into());
    }

    /// Delivers a delegate-style callback to the installed registration.
    ///
    /// Driver-side entry point. Events raised while no callback stream is
    /// active are dropped, matching a host with no delegate installed.
    pub fn dispatch_event(&self, event: ManagerEvent) {
        self.inner.dispatch_event(event);
    }
}

impl ManagerInner {
    fn next_token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers a property observer and replays the current value into its
    /// channel. The conversion on the stream side decides visibility.
    pub(crate) fn observe_property(
        &self,
        key: PropertyKey,
    ) -> Result<(u64, UnboundedReceiver<PropertyValue>)> {
        let mut table = lock(&self.properties);
        let entry = table
            .get_mut(&key)
            .ok_or(LocationStreamError::UnsupportedProperty(key))?;

        let token = self.next_token();
        let (tx, rx) = mpsc::unbounded();
        let _ = tx.unbounded_send(entry.value.clone());
        entry.observers.push(PropertyObserver { token, tx });
        debug!(?key, token, "property observer registered");
        Ok((token, rx))
    }

    /// Deregisters a property observer. Removing an unknown token is a no-op,
    /// so disposal stays idempotent.
    pub(crate) fn remove_property_observer(&self, key: PropertyKey, token: u64) {
        let mut table = lock(&self.properties);
        if let Some(entry) = table.get_mut(&key) {
            let before = entry.observers.len();
            entry.observers.retain(|observer| observer.token != token);
            if entry.observers.len() != before {
                debug!(?key, token, "property observer removed");
            }
        }
    }

    fn update_property(&self, key: PropertyKey, value: PropertyValue) {
        let mut table = lock(&self.properties);
        match table.get_mut(&key) {
            Some(entry) => {
                entry
                    .observers
                    .retain(|observer| observer.tx.unbounded_send(value.clone()).is_ok());
                entry.value = value;
            }
            None => warn!(?key, "update for unsupported property ignored"),
        }
    }

    /// Attaches a callback-kind subscriber, installing the shared delegate
    /// registration if this is the first active subscriber of any kind.
    pub(crate) fn subscribe_events(
        &self,
        kind: EventKind,
    ) -> (u64, UnboundedReceiver<ManagerEvent>) {
        let token = self.next_token();
        let (tx, rx) = mpsc::unbounded();
        let mut slot = lock(&self.delegate);
        let hub = slot.get_or_insert_with(|| {
            debug!("delegate registration installed");
            EventHub::default()
        });
        hub.add(token, kind, tx);
        trace!(?kind, token, "callback subscriber attached");
        (token, rx)
    }

    /// Detaches a callback-kind subscriber; tears the shared registration
    /// down when the last subscriber across all kinds is gone.
    pub(crate) fn remove_event_subscriber(&self, token: u64) {
        let mut slot = lock(&self.delegate);
        if let Some(hub) = slot.as_mut() {
            hub.remove(token);
            if hub.is_empty() {
                *slot = None;
                debug!("delegate registration removed");
            }
        }
    }

    fn dispatch_event(&self, event: ManagerEvent) {
        let mut slot = lock(&self.delegate);
        match slot.as_mut() {
            Some(hub) => hub.dispatch(event),
            None => trace!(kind = ?event.kind(), "event dropped; no delegate installed"),
        }
    }

    pub(crate) fn shares(&self) -> &CapabilityShares {
        &self.shares
    }

    #[cfg(test)]
    pub(crate) fn property_observer_count(&self, key: PropertyKey) -> usize {
        lock(&self.properties)
            .get(&key)
            .map(|entry| entry.observers.len())
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn event_subscriber_count(&self) -> usize {
        lock(&self.delegate)
            .as_ref()
            .map(EventHub::len)
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn delegate_installed(&self) -> bool {
        lock(&self.delegate).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::StaticCapabilities;

    #[test]
    fn test_unsupported_property_fails_fast() {
        let manager = LocationManager::with_properties(
            StaticCapabilities::default(),
            [PropertyKey::DistanceFilter],
        );

        let err = match manager.observe::<Heading>(PropertyKey::Heading) {
            Err(err) => err,
            Ok(_) => panic!("heading is not in the supported set"),
        };
        assert_eq!(
            err,
            LocationStreamError::UnsupportedProperty(PropertyKey::Heading)
        );

        // The merged location stream needs the location property.
        assert!(matches!(
            manager.location(),
            Err(LocationStreamError::UnsupportedProperty(
                PropertyKey::Location
            ))
        ));
    }

    #[test]
    fn test_update_of_unsupported_property_is_ignored() {
        let manager = LocationManager::with_properties(
            StaticCapabilities::default(),
            [PropertyKey::DistanceFilter],
        );
        manager.update_property(PropertyKey::HeadingFilter, 5.0);
        assert_eq!(
            manager
                .inner
                .property_observer_count(PropertyKey::HeadingFilter),
            0
        );
    }

    #[test]
    fn test_observer_removal_is_idempotent() {
        let manager = LocationManager::new(StaticCapabilities::default());
        let (token, _rx) = manager
            .inner
            .observe_property(PropertyKey::DistanceFilter)
            .unwrap();
        assert_eq!(
            manager
                .inner
                .property_observer_count(PropertyKey::DistanceFilter),
            1
        );

        manager
            .inner
            .remove_property_observer(PropertyKey::DistanceFilter, token);
        manager
            .inner
            .remove_property_observer(PropertyKey::DistanceFilter, token);
        assert_eq!(
            manager
                .inner
                .property_observer_count(PropertyKey::DistanceFilter),
            0
        );
    }
}
