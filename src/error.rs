//! Error types for the location stream adapters
//!
//! Only programmer-error-class problems surface here. Transient runtime
//! conditions (a fix that could not be acquired, a geocode lookup that found
//! nothing) are delivered as values or withheld, never as errors.

use crate::manager::PropertyKey;

/// Main error type for the location stream adapters
///
/// Raised at subscription time; once a stream is running it never fails
/// with this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationStreamError {
    /// The host was built without support for observing this property
    ///
    /// Observation registration fails fast rather than handing out a stream
    /// that could never emit.
    UnsupportedProperty(PropertyKey),
}

impl core::fmt::Display for LocationStreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationStreamError::UnsupportedProperty(key) => {
                write!(f, "UnsupportedProperty: {:?}", key)
            }
        }
    }
}

impl core::error::Error for LocationStreamError {}
