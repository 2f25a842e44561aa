//! In-process discovery
//!
//! A [`MemoryNetwork`] stands in for the LAN: every [`MemoryDiscovery`]
//! attached to the same network sees the profiles the others advertise.
//! Visibility changes are picked up on [`Discovery::refresh_services`].

use crate::{Discovery, DiscoveryError, DiscoveryEvent, Result, ServiceRegistry, Subscribers};
use oscquery_core::{ServiceKind, ServiceProfile};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Shared set of advertised profiles
#[derive(Debug, Clone, Default)]
pub struct MemoryNetwork {
    advertised: Arc<Mutex<Vec<ServiceProfile>>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    fn publish(&self, profile: &ServiceProfile) {
        let mut advertised = self.advertised.lock();
        if !advertised.contains(profile) {
            advertised.push(profile.clone());
        }
    }

    fn withdraw(&self, profile: &ServiceProfile) -> bool {
        let mut advertised = self.advertised.lock();
        let before = advertised.len();
        advertised.retain(|p| p != profile);
        advertised.len() != before
    }

    /// Everything currently advertised on this network
    pub fn visible(&self) -> Vec<ServiceProfile> {
        self.advertised.lock().clone()
    }
}

/// Discovery over a [`MemoryNetwork`]
pub struct MemoryDiscovery {
    network: MemoryNetwork,
    own: Mutex<Vec<ServiceProfile>>,
    registry: Mutex<ServiceRegistry>,
    subscribers: Subscribers<DiscoveryEvent>,
    shut_down: AtomicBool,
}

impl MemoryDiscovery {
    /// Discovery on a private network of its own
    pub fn new() -> Self {
        Self::on_network(MemoryNetwork::new())
    }

    pub fn on_network(network: MemoryNetwork) -> Self {
        Self {
            network,
            own: Mutex::new(Vec::new()),
            registry: Mutex::new(ServiceRegistry::new()),
            subscribers: Subscribers::new(),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn network(&self) -> &MemoryNetwork {
        &self.network
    }

    /// Profiles this instance currently advertises
    pub fn advertised(&self) -> Vec<ServiceProfile> {
        self.own.lock().clone()
    }

    fn ensure_running(&self) -> Result<()> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(DiscoveryError::ShutDown);
        }
        Ok(())
    }
}

impl Default for MemoryDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl Discovery for MemoryDiscovery {
    fn advertise(&self, profile: &ServiceProfile) -> Result<()> {
        self.ensure_running()?;
        self.network.publish(profile);
        let mut own = self.own.lock();
        if !own.contains(profile) {
            own.push(profile.clone());
        }
        info!("Advertising {}", profile);
        Ok(())
    }

    fn unadvertise(&self, profile: &ServiceProfile) -> Result<()> {
        let mut own = self.own.lock();
        if !own.contains(profile) {
            return Err(DiscoveryError::NotAdvertised(profile.to_string()));
        }
        own.retain(|p| p != profile);
        self.network.withdraw(profile);
        info!("Stopped advertising {}", profile);
        Ok(())
    }

    fn refresh_services(&self) -> Result<()> {
        self.ensure_running()?;
        let visible = self.network.visible();
        let visible_set: HashSet<&ServiceProfile> = visible.iter().collect();

        let mut events = Vec::new();
        {
            let mut registry = self.registry.lock();
            for gone in registry.all() {
                if !visible_set.contains(&gone) {
                    registry.remove(gone.name(), gone.kind());
                    events.push(DiscoveryEvent::Lost {
                        name: gone.name().to_string(),
                        kind: gone.kind(),
                    });
                }
            }
            for profile in &visible {
                registry.upsert(profile.clone());
                events.push(DiscoveryEvent::Found(profile.clone()));
            }
        }

        debug!("Memory discovery refresh: {} services visible", visible.len());
        for event in &events {
            self.subscribers.publish(event);
        }
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<DiscoveryEvent> {
        self.subscribers.subscribe()
    }

    fn services(&self, kind: ServiceKind) -> HashSet<ServiceProfile> {
        self.registry.lock().services(kind)
    }

    fn shutdown(&self) -> Result<()> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        for profile in self.own.lock().drain(..) {
            self.network.withdraw(&profile);
        }
        self.registry.lock().clear();
        self.subscribers.clear();
        Ok(())
    }
}
