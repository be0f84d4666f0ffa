//! Feeds a `LocationManager` from a simulated driver task and consumes the
//! merged location stream alongside reverse-geocoded placemarks.
//!
//! Run with: `cargo run --example live_updates`

use std::time::Duration;

use futures::StreamExt;
use location_streams::capability::StaticCapabilities;
use location_streams::manager::{LocationManager, ManagerEvent, PropertyKey};
use location_streams::types::{AuthorizationStatus, Coordinate, Location, Placemark};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let manager = LocationManager::new(StaticCapabilities {
        services_enabled: true,
        authorization_status: AuthorizationStatus::AuthorizedWhenInUse,
        ..Default::default()
    });

    let mut enabled = manager.services_enabled();
    if let Some(enabled) = enabled.next().await {
        println!("location services enabled: {enabled}");
    }

    // Stand-in lookup: quantize the coordinate into a synthetic locality.
    let geocoder = |location: Location| async move {
        Some(Placemark {
            locality: Some(format!(
                "cell {:.1}/{:.1}",
                location.coordinate.latitude, location.coordinate.longitude
            )),
            ..Default::default()
        })
    };
    let mut locations = manager.location().expect("location property supported");
    let mut placemarks = manager
        .placemarks(geocoder)
        .expect("location property supported");

    // Simulated platform driver: alternates between the property channel and
    // the callback channel, the way a real runtime delivers fixes.
    let driver = manager.clone();
    tokio::spawn(async move {
        for i in 0..5u32 {
            let fix = Location::new(Coordinate {
                latitude: 52.5 + f64::from(i) * 0.01,
                longitude: 13.4,
            });
            if i % 2 == 0 {
                driver.update_property(PropertyKey::Location, fix);
            } else {
                driver.dispatch_event(ManagerEvent::LocationsUpdated(vec![fix]));
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    });

    // Five fixes reach each derived stream.
    for _ in 0..10 {
        tokio::select! {
            Some(fix) = locations.next() => {
                println!(
                    "fix: {:.4}, {:.4}",
                    fix.coordinate.latitude, fix.coordinate.longitude
                );
            }
            Some(place) = placemarks.next() => {
                println!("placemark: {}", place.locality.unwrap_or_default());
            }
        }
    }
}
