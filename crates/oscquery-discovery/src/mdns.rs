//! mDNS/Bonjour discovery

use crate::{Discovery, DiscoveryError, DiscoveryEvent, Result, ServiceRegistry, Subscribers};
use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use oscquery_core::{ServiceKind, ServiceProfile};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const BROWSED_KINDS: [ServiceKind; 2] = [ServiceKind::Osc, ServiceKind::OscQuery];

/// State shared with the browse threads
struct Shared {
    registry: Mutex<ServiceRegistry>,
    subscribers: Subscribers<DiscoveryEvent>,
}

impl Shared {
    fn handle(&self, kind: ServiceKind, event: ServiceEvent) -> bool {
        match event {
            ServiceEvent::ServiceResolved(info) => {
                debug!("mDNS resolved: {:?}", info);
                let profile = profile_from_info(kind, &info);
                let is_new = self.registry.lock().upsert(profile.clone());
                if is_new {
                    info!("Discovered {} at {:?}", profile, profile.addresses().collect::<Vec<_>>());
                    self.subscribers.publish(&DiscoveryEvent::Found(profile));
                }
            }
            ServiceEvent::ServiceRemoved(ty, fullname) => {
                let name = instance_name(&fullname, &ty);
                if self.registry.lock().remove(&name, kind) {
                    info!("Service lost: {}", fullname);
                    self.subscribers
                        .publish(&DiscoveryEvent::Lost { name, kind });
                }
            }
            ServiceEvent::SearchStarted(ty) => {
                debug!("mDNS search started for {}", ty);
            }
            ServiceEvent::SearchStopped(ty) => {
                debug!("mDNS search stopped for {}", ty);
                return false;
            }
            _ => {}
        }
        true
    }
}

/// Strip the service type from a full instance name
fn instance_name(fullname: &str, ty_domain: &str) -> String {
    fullname
        .strip_suffix(ty_domain)
        .map(|s| s.trim_end_matches('.'))
        .unwrap_or(fullname)
        .to_string()
}

fn profile_from_info(kind: ServiceKind, info: &ServiceInfo) -> ServiceProfile {
    let addresses: Vec<IpAddr> = info
        .get_addresses()
        .iter()
        .map(|addr| IpAddr::from(*addr))
        .collect();
    ServiceProfile::new(
        instance_name(info.get_fullname(), info.get_type()),
        addresses,
        info.get_port(),
        kind,
    )
}

/// Discovery backed by an mDNS daemon
pub struct MdnsDiscovery {
    daemon: ServiceDaemon,
    host_name: String,
    shared: Arc<Shared>,
    advertised: Mutex<HashMap<ServiceProfile, String>>,
    browsing: AtomicBool,
    shut_down: AtomicBool,
}

impl MdnsDiscovery {
    pub fn new() -> Result<Self> {
        let daemon = ServiceDaemon::new().map_err(|e| DiscoveryError::Mdns(e.to_string()))?;
        let host = hostname::get()?;
        Ok(Self {
            daemon,
            host_name: format!("{}.local.", host.to_string_lossy()),
            shared: Arc::new(Shared {
                registry: Mutex::new(ServiceRegistry::new()),
                subscribers: Subscribers::new(),
            }),
            advertised: Mutex::new(HashMap::new()),
            browsing: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
        })
    }

    fn ensure_running(&self) -> Result<()> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(DiscoveryError::ShutDown);
        }
        Ok(())
    }

    /// (Re)start browsing one service type on a dedicated thread.
    /// The daemon ends a previous browse of the same type with `SearchStopped`.
    fn browse(&self, kind: ServiceKind) -> Result<()> {
        let receiver = self
            .daemon
            .browse(&kind.mdns_service_type())
            .map_err(|e| DiscoveryError::Mdns(e.to_string()))?;

        let shared = Arc::clone(&self.shared);
        std::thread::Builder::new()
            .name(format!("oscquery-browse-{}", kind.service_type()))
            .spawn(move || loop {
                match receiver.recv() {
                    Ok(event) => {
                        if !shared.handle(kind, event) {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("mDNS browse channel closed: {:?}", e);
                        break;
                    }
                }
            })?;

        info!("Browsing for {}", kind.mdns_service_type());
        Ok(())
    }
}

impl Discovery for MdnsDiscovery {
    fn advertise(&self, profile: &ServiceProfile) -> Result<()> {
        self.ensure_running()?;

        // The daemon announces IPv4 records only
        let ips: Vec<String> = profile
            .addresses()
            .filter(|ip| ip.is_ipv4() && !ip.is_unspecified())
            .map(ToString::to_string)
            .collect();
        let ip_list = ips.join(",");
        let properties: &[(&str, &str)] = &[("txtvers", "1")];

        let mut service_info = ServiceInfo::new(
            &profile.kind().mdns_service_type(),
            profile.name(),
            &self.host_name,
            ip_list.as_str(),
            profile.port(),
            properties,
        )
        .map_err(|e| DiscoveryError::Mdns(e.to_string()))?;

        if ips.is_empty() {
            service_info = service_info.enable_addr_auto();
        }

        let fullname = service_info.get_fullname().to_string();
        self.daemon
            .register(service_info)
            .map_err(|e| DiscoveryError::Mdns(e.to_string()))?;

        info!("Advertising {} as {}", profile, fullname);
        self.advertised.lock().insert(profile.clone(), fullname);
        Ok(())
    }

    fn unadvertise(&self, profile: &ServiceProfile) -> Result<()> {
        let fullname = self
            .advertised
            .lock()
            .remove(profile)
            .ok_or_else(|| DiscoveryError::NotAdvertised(profile.to_string()))?;

        self.daemon
            .unregister(&fullname)
            .map_err(|e| DiscoveryError::Mdns(e.to_string()))?;
        info!("Stopped advertising {}", fullname);
        Ok(())
    }

    fn refresh_services(&self) -> Result<()> {
        self.ensure_running()?;

        let known = self.shared.registry.lock().all();
        for profile in known {
            self.shared.subscribers.publish(&DiscoveryEvent::Found(profile));
        }

        for kind in BROWSED_KINDS {
            self.browse(kind)?;
        }
        self.browsing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<DiscoveryEvent> {
        self.shared.subscribers.subscribe()
    }

    fn services(&self, kind: ServiceKind) -> HashSet<ServiceProfile> {
        self.shared.registry.lock().services(kind)
    }

    fn shutdown(&self) -> Result<()> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let advertised: Vec<String> = self.advertised.lock().drain().map(|(_, name)| name).collect();
        for fullname in advertised {
            if let Err(e) = self.daemon.unregister(&fullname) {
                warn!("Failed to unregister {}: {}", fullname, e);
            }
        }

        if self.browsing.swap(false, Ordering::SeqCst) {
            for kind in BROWSED_KINDS {
                if let Err(e) = self.daemon.stop_browse(&kind.mdns_service_type()) {
                    debug!("Failed to stop browsing {}: {}", kind, e);
                }
            }
        }

        self.shared.subscribers.clear();
        self.daemon
            .shutdown()
            .map_err(|e| DiscoveryError::Mdns(e.to_string()))?;
        info!("mDNS discovery shut down");
        Ok(())
    }
}

impl Drop for MdnsDiscovery {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
