//! Value types carried by the location streams
//!
//! These records mirror what the underlying location runtime reports. The
//! stream layer treats them as opaque payloads; only `Location` arrival order
//! matters to the merge logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use serde_with::skip_serializing_none;

/// Geographic coordinate in decimal degrees (WGS 84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// A single position fix as reported by the location runtime.
///
/// All accuracy and motion fields are optional; the runtime omits whatever it
/// could not determine for a given fix.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coordinate: Coordinate,
    /// Meters above sea level
    pub altitude: Option<f64>,
    /// Radius of 68% confidence, meters
    pub horizontal_accuracy: Option<f64>,
    pub vertical_accuracy: Option<f64>,
    /// Meters per second over ground
    pub speed: Option<f64>,
    /// Course over ground, degrees from true north
    pub course: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Location {
    /// Creates a fix at the given coordinate, timestamped now, with no
    /// accuracy or motion data.
    pub fn new(coordinate: Coordinate) -> Self {
        Location {
            coordinate,
            altitude: None,
            horizontal_accuracy: None,
            vertical_accuracy: None,
            speed: None,
            course: None,
            timestamp: Utc::now(),
        }
    }
}

/// A heading sample from the orientation sensor.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Degrees from magnetic north
    pub magnetic_heading: f64,
    /// Degrees from true north, when declination is known
    pub true_heading: Option<f64>,
    /// Maximum deviation in degrees; absent means the sample is unreliable
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Heading {
    pub fn new(magnetic_heading: f64) -> Self {
        Heading {
            magnetic_heading,
            true_heading: None,
            accuracy: None,
            timestamp: Utc::now(),
        }
    }
}

/// Authorization state granted to the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum AuthorizationStatus {
    #[default]
    NotDetermined = 0,
    Restricted = 1,
    Denied = 2,
    AuthorizedAlways = 3,
    AuthorizedWhenInUse = 4,
}

/// Physical device orientation used to reference heading samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum DeviceOrientation {
    Unknown = 0,
    Portrait = 1,
    PortraitUpsideDown = 2,
    LandscapeLeft = 3,
    LandscapeRight = 4,
    FaceUp = 5,
    FaceDown = 6,
}

/// Activity classification the runtime uses to tune fix delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ActivityType {
    Other = 1,
    AutomotiveNavigation = 2,
    Fitness = 3,
    OtherNavigation = 4,
    Airborne = 5,
}

bitflags::bitflags! {
    /// Which boundary crossings a monitored region reports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RegionNotify: u8 {
        /// Report when the device enters the region
        const ENTRY = 0x01;
        /// Report when the device exits the region
        const EXIT = 0x02;
    }
}

impl Serialize for RegionNotify {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for RegionNotify {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(RegionNotify::from_bits_truncate(bits))
    }
}

/// A circular geographic region registered for monitoring or ranging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub identifier: String,
    pub center: Coordinate,
    /// Radius in meters
    pub radius: f64,
    pub notify: RegionNotify,
}

/// A boundary crossing reported for a monitored region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegionEvent {
    Entered(Region),
    Exited(Region),
}

impl RegionEvent {
    /// The region the crossing was reported for.
    pub fn region(&self) -> &Region {
        match self {
            RegionEvent::Entered(region) | RegionEvent::Exited(region) => region,
        }
    }
}

/// A beacon sighting inside a ranged region.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beacon {
    pub identifier: String,
    /// Received signal strength, dBm
    pub rssi: Option<i32>,
    /// Estimated distance to the beacon, meters
    pub accuracy: Option<f64>,
}

/// One ranging pass over a region's visible beacons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangingUpdate {
    pub region: Region,
    pub beacons: Vec<Beacon>,
}

/// A data-acquisition failure reported by the runtime.
///
/// Delivered as an ordinary value on the failure stream; it never terminates
/// the location or heading streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFailure {
    pub code: i32,
    pub message: String,
}

/// A reverse-geocoded postal description of a location.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Placemark {
    pub name: Option<String>,
    pub thoroughfare: Option<String>,
    pub sub_thoroughfare: Option<String>,
    pub locality: Option<String>,
    pub administrative_area: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub iso_country_code: Option<String>,
    pub coordinate: Option<Coordinate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_status_repr() {
        let serialized = serde_json::to_string(&AuthorizationStatus::AuthorizedWhenInUse).unwrap();
        assert_eq!(serialized, "4");

        let deserialized: AuthorizationStatus = serde_json::from_str("0").unwrap();
        assert_eq!(deserialized, AuthorizationStatus::NotDetermined);
    }

    #[test]
    fn test_region_notify_flags() {
        let notify = RegionNotify::ENTRY | RegionNotify::EXIT;
        let serialized = serde_json::to_string(&notify).unwrap();
        assert_eq!(serialized, "3");

        let deserialized: RegionNotify = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, notify);
    }

    #[test]
    fn test_placemark_skips_absent_fields() {
        let placemark = Placemark {
            locality: Some("Berlin".into()),
            ..Default::default()
        };
        let serialized = serde_json::to_string(&placemark).unwrap();
        assert_eq!(serialized, r#"{"locality":"Berlin"}"#);
    }
}
