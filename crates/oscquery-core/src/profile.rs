//! Service profiles
//!
//! A profile describes one endpoint on the network: either something this
//! process advertises, or a peer found by discovery. Profiles are immutable
//! once built.

use crate::{SERVICE_OSCJSON_TCP, SERVICE_OSC_UDP};
use std::collections::BTreeSet;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Kind of advertised service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceKind {
    /// Raw OSC over UDP
    Osc,
    /// OSCQuery over HTTP (TCP)
    OscQuery,
}

impl ServiceKind {
    /// Service type label, e.g. `_oscjson._tcp`
    pub fn service_type(&self) -> &'static str {
        match self {
            ServiceKind::Osc => SERVICE_OSC_UDP,
            ServiceKind::OscQuery => SERVICE_OSCJSON_TCP,
        }
    }

    /// Fully qualified mDNS service type, e.g. `_oscjson._tcp.local.`
    pub fn mdns_service_type(&self) -> String {
        format!("{}.local.", self.service_type())
    }

    /// Resolve a kind from a service type, with or without the `.local.` suffix
    pub fn from_service_type(ty: &str) -> Option<Self> {
        let ty = ty.trim_end_matches('.').trim_end_matches(".local");
        if ty == SERVICE_OSC_UDP {
            Some(ServiceKind::Osc)
        } else if ty == SERVICE_OSCJSON_TCP {
            Some(ServiceKind::OscQuery)
        } else {
            None
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Osc => write!(f, "OSC"),
            ServiceKind::OscQuery => write!(f, "OSCQuery"),
        }
    }
}

/// Description of one advertised or discovered endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceProfile {
    name: String,
    addresses: BTreeSet<IpAddr>,
    port: u16,
    kind: ServiceKind,
}

impl ServiceProfile {
    /// Create a profile; duplicate addresses collapse into one
    pub fn new<I>(name: impl Into<String>, addresses: I, port: u16, kind: ServiceKind) -> Self
    where
        I: IntoIterator<Item = IpAddr>,
    {
        Self {
            name: name.into(),
            addresses: addresses.into_iter().collect(),
            port,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Addresses in ascending order, without duplicates
    pub fn addresses(&self) -> impl Iterator<Item = &IpAddr> {
        self.addresses.iter()
    }

    pub fn address_count(&self) -> usize {
        self.addresses.len()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// Service type label for this profile's kind
    pub fn service_type(&self) -> &'static str {
        self.kind.service_type()
    }

    /// Socket address for each advertised IP
    pub fn socket_addrs(&self) -> impl Iterator<Item = SocketAddr> + '_ {
        self.addresses.iter().map(move |ip| SocketAddr::new(*ip, self.port))
    }

    /// Whether every address is the unspecified address (or none is given)
    pub fn is_wildcard(&self) -> bool {
        self.addresses.iter().all(|ip| ip.is_unspecified())
    }
}

impl fmt::Display for ServiceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) port {}", self.name, self.service_type(), self.port)
    }
}
