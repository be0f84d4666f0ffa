//! Capability queries consumed from the location runtime
//!
//! The runtime answers a handful of synchronous, zero-argument questions
//! about the environment. The source is injected into the
//! [`LocationManager`](crate::manager::LocationManager) at construction so
//! hosts and tests can substitute their own answers instead of the adapter
//! reaching for an ambient global.

use std::sync::Arc;

use crate::stream::query::SharedQuery;
use crate::types::AuthorizationStatus;

/// Synchronous capability queries answered by the host environment.
///
/// The environment-gated queries default to `false`; a source only overrides
/// what its platform family actually provides.
pub trait CapabilitySource: Send + Sync {
    /// Whether location services are enabled device-wide
    fn services_enabled(&self) -> bool;

    /// Authorization granted to the host application
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Whether deferred location updates are available
    fn deferred_updates_available(&self) -> bool {
        false
    }

    /// Whether significant-change monitoring is available
    fn significant_change_monitoring_available(&self) -> bool {
        false
    }

    /// Whether a heading sensor is available
    fn heading_available(&self) -> bool {
        false
    }

    /// Whether beacon ranging is available
    fn ranging_available(&self) -> bool {
        false
    }
}

/// Fixed capability answers, useful for constrained hosts and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCapabilities {
    pub services_enabled: bool,
    pub authorization_status: AuthorizationStatus,
    pub deferred_updates_available: bool,
    pub significant_change_monitoring_available: bool,
    pub heading_available: bool,
    pub ranging_available: bool,
}

impl CapabilitySource for StaticCapabilities {
    fn services_enabled(&self) -> bool {
        self.services_enabled
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        self.authorization_status
    }

    fn deferred_updates_available(&self) -> bool {
        self.deferred_updates_available
    }

    fn significant_change_monitoring_available(&self) -> bool {
        self.significant_change_monitoring_available
    }

    fn heading_available(&self) -> bool {
        self.heading_available
    }

    fn ranging_available(&self) -> bool {
        self.ranging_available
    }
}

/// One shared query per capability flag.
///
/// Concurrent subscribers to the same flag reuse a single execution; the raw
/// per-subscription form stays available through
/// [`crate::stream::query::query`].
pub(crate) struct CapabilityShares {
    pub(crate) services_enabled: Arc<SharedQuery<bool>>,
    pub(crate) authorization_status: Arc<SharedQuery<AuthorizationStatus>>,
    pub(crate) deferred_updates_available: Arc<SharedQuery<bool>>,
    pub(crate) significant_change_monitoring_available: Arc<SharedQuery<bool>>,
    pub(crate) heading_available: Arc<SharedQuery<bool>>,
    pub(crate) ranging_available: Arc<SharedQuery<bool>>,
}

impl CapabilityShares {
    pub(crate) fn new(source: &Arc<dyn CapabilitySource>) -> Self {
        CapabilityShares {
            services_enabled: {
                let source = Arc::clone(source);
                SharedQuery::new(move || source.services_enabled())
            },
            authorization_status: {
                let source = Arc::clone(source);
                SharedQuery::new(move || source.authorization_status())
            },
            deferred_updates_available: {
                let source = Arc::clone(source);
                SharedQuery::new(move || source.deferred_updates_available())
            },
            significant_change_monitoring_available: {
                let source = Arc::clone(source);
                SharedQuery::new(move || source.significant_change_monitoring_available())
            },
            heading_available: {
                let source = Arc::clone(source);
                SharedQuery::new(move || source.heading_available())
            },
            ranging_available: {
                let source = Arc::clone(source);
                SharedQuery::new(move || source.ranging_available())
            },
        }
    }
}
