//! OSCQuery Discovery
//!
//! The discovery capability consumed by the OSCQuery service:
//! - advertise / withdraw this process's service profiles
//! - browse for `_osc._udp` and `_oscjson._tcp` peers
//! - report newly visible peers as [`DiscoveryEvent`]s
//!
//! Implementations:
//! - [`mdns::MdnsDiscovery`] for real networks (feature `mdns`)
//! - [`memory::MemoryDiscovery`] for tests and single-process setups

pub mod error;
pub mod memory;
pub mod registry;
pub mod subscribers;

#[cfg(feature = "mdns")]
pub mod mdns;

pub use error::{DiscoveryError, Result};
pub use memory::{MemoryDiscovery, MemoryNetwork};
pub use registry::ServiceRegistry;
pub use subscribers::Subscribers;

#[cfg(feature = "mdns")]
pub use mdns::MdnsDiscovery;

use oscquery_core::{ServiceKind, ServiceProfile};
use std::collections::HashSet;
use tokio::sync::mpsc;

/// Discovery event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// A service became visible
    Found(ServiceProfile),
    /// A previously visible service went away
    Lost { name: String, kind: ServiceKind },
}

impl DiscoveryEvent {
    pub fn kind(&self) -> ServiceKind {
        match self {
            DiscoveryEvent::Found(profile) => profile.kind(),
            DiscoveryEvent::Lost { kind, .. } => *kind,
        }
    }
}

/// Service discovery capability
///
/// Events are delivered on unbounded channels; a subscriber that is dropped
/// is pruned on the next publish. Found events are de-duplicated here, not
/// by consumers.
pub trait Discovery: Send + Sync {
    /// Publish a profile so peers can find it
    fn advertise(&self, profile: &ServiceProfile) -> Result<()>;

    /// Withdraw a previously advertised profile
    fn unadvertise(&self, profile: &ServiceProfile) -> Result<()>;

    /// Start or restart browsing and re-emit currently visible services
    fn refresh_services(&self) -> Result<()>;

    /// Receive discovery events from now on
    fn subscribe(&self) -> mpsc::UnboundedReceiver<DiscoveryEvent>;

    /// Currently visible services of one kind
    fn services(&self, kind: ServiceKind) -> HashSet<ServiceProfile>;

    /// Withdraw every advertisement and stop browsing. Idempotent.
    fn shutdown(&self) -> Result<()>;

    fn osc_services(&self) -> HashSet<ServiceProfile> {
        self.services(ServiceKind::Osc)
    }

    fn oscquery_services(&self) -> HashSet<ServiceProfile> {
        self.services(ServiceKind::OscQuery)
    }
}
