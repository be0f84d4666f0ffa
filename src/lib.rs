//! # location-streams
//!
//! Reactive stream adapters over an imperative location-services host.
//!
//! The underlying runtime reports position fixes, headings, authorization
//! changes, and region events through observed properties and delegate-style
//! callbacks. This crate bridges those sources into composable
//! [`futures_util::Stream`]s with replay, merge, sharing, and cleanup
//! semantics, so consumers subscribe to "location changed" the same way they
//! subscribe to any other event source.
//!
//! ## Overview
//!
//! - Property observation: [`manager::LocationManager::observe`] emits a
//!   property's current value at subscription time and on every change.
//! - Delegate callbacks: one shared registration multiplexes all callback
//!   kinds; each kind is exposed as its own stream.
//! - Capability queries: synchronous checks wrapped as single-value streams,
//!   shared across concurrent subscribers on the public surface.
//! - Derived streams: a merged current-location stream and a reverse-geocoded
//!   placemark stream.
//!
//! Dropping a stream is its disposal: it deregisters the underlying
//! observation exactly once and cancels in-flight work.
//!
//! ## Example
//!
//! ```no_run
//! use futures_util::StreamExt;
//! use location_streams::capability::StaticCapabilities;
//! use location_streams::manager::{LocationManager, ManagerEvent};
//! use location_streams::types::{Coordinate, Location};
//!
//! # async fn example() -> location_streams::Result<()> {
//! let manager = LocationManager::new(StaticCapabilities {
//!     services_enabled: true,
//!     ..Default::default()
//! });
//!
//! // Consumers subscribe to the merged location stream.
//! let mut locations = manager.location()?;
//!
//! // The platform driver feeds the same handle.
//! manager.dispatch_event(ManagerEvent::LocationsUpdated(vec![Location::new(
//!     Coordinate { latitude: 52.52, longitude: 13.405 },
//! )]));
//!
//! if let Some(fix) = locations.next().await {
//!     println!("current fix: {:?}", fix.coordinate);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::LocationStreamError;

/// Synchronous capability queries and their injection point
pub mod capability;

/// Error types used throughout the library
pub mod error;

/// Reverse-geocoding collaborator boundary
pub mod geocode;

/// Host-object handle fed by the platform location runtime
pub mod manager;

/// Stream adapters and the public stream surface
pub mod stream;

/// Value types carried by the streams
pub mod types;

/// Convenience type alias for Results with LocationStreamError
pub type Result<T> = core::result::Result<T, LocationStreamError>;

/// Locks a mutex, recovering the guard when a panicking holder poisoned it.
pub(crate) fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
