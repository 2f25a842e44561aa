//! Set of currently visible services, one set per kind

use oscquery_core::{ServiceKind, ServiceProfile};
use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct ServiceRegistry {
    osc: HashSet<ServiceProfile>,
    oscquery: HashSet<ServiceProfile>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, kind: ServiceKind) -> &HashSet<ServiceProfile> {
        match kind {
            ServiceKind::Osc => &self.osc,
            ServiceKind::OscQuery => &self.oscquery,
        }
    }

    fn set_mut(&mut self, kind: ServiceKind) -> &mut HashSet<ServiceProfile> {
        match kind {
            ServiceKind::Osc => &mut self.osc,
            ServiceKind::OscQuery => &mut self.oscquery,
        }
    }

    /// Record `profile`, replacing any entry with the same name and kind.
    /// Returns true if the profile was not already known as-is.
    pub fn upsert(&mut self, profile: ServiceProfile) -> bool {
        let set = self.set_mut(profile.kind());
        if set.contains(&profile) {
            return false;
        }
        set.retain(|known| known.name() != profile.name());
        set.insert(profile);
        true
    }

    /// Forget every service with this name and kind
    pub fn remove(&mut self, name: &str, kind: ServiceKind) -> bool {
        let set = self.set_mut(kind);
        let before = set.len();
        set.retain(|known| known.name() != name);
        set.len() != before
    }

    pub fn contains(&self, profile: &ServiceProfile) -> bool {
        self.set(profile.kind()).contains(profile)
    }

    pub fn services(&self, kind: ServiceKind) -> HashSet<ServiceProfile> {
        self.set(kind).clone()
    }

    /// Every known profile of both kinds
    pub fn all(&self) -> Vec<ServiceProfile> {
        self.osc.iter().chain(self.oscquery.iter()).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.osc.clear();
        self.oscquery.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn profile(name: &str, port: u16, kind: ServiceKind) -> ServiceProfile {
        ServiceProfile::new(name, [IpAddr::V4(Ipv4Addr::LOCALHOST)], port, kind)
    }

    #[test]
    fn test_upsert_deduplicates() {
        let mut registry = ServiceRegistry::new();
        assert!(registry.upsert(profile("a", 9000, ServiceKind::Osc)));
        assert!(!registry.upsert(profile("a", 9000, ServiceKind::Osc)));
        assert_eq!(registry.services(ServiceKind::Osc).len(), 1);
    }

    #[test]
    fn test_upsert_replaces_changed_profile() {
        let mut registry = ServiceRegistry::new();
        registry.upsert(profile("a", 9000, ServiceKind::Osc));
        assert!(registry.upsert(profile("a", 9001, ServiceKind::Osc)));

        let services = registry.services(ServiceKind::Osc);
        assert_eq!(services.len(), 1);
        assert!(services.contains(&profile("a", 9001, ServiceKind::Osc)));
    }

    #[test]
    fn test_kinds_are_separate() {
        let mut registry = ServiceRegistry::new();
        registry.upsert(profile("a", 9000, ServiceKind::Osc));
        registry.upsert(profile("a", 8080, ServiceKind::OscQuery));

        assert!(registry.remove("a", ServiceKind::Osc));
        assert!(registry.services(ServiceKind::Osc).is_empty());
        assert_eq!(registry.services(ServiceKind::OscQuery).len(), 1);
    }
}
