//! OSCQuery service orchestrator
//!
//! Owns the node tree and host descriptor, runs the HTTP pipeline on an
//! [`HttpTransport`], advertises this process over [`Discovery`] and
//! re-publishes discovered peers to the embedding application.

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::listener::AxumTransport;
use crate::middleware::HostInfoMiddleware;
use crate::pipeline::Pipeline;
use crate::transport::{HttpTransport, RequestHandler, ServerHandle};
use oscquery_core::{
    address, net, osc_type_tag, Access, HostInfo, OscQueryNode, OscQueryRootNode, ServiceKind,
    ServiceProfile,
};
use oscquery_discovery::{Discovery, DiscoveryEvent, Subscribers};
use parking_lot::{Mutex, RwLock};
use std::any::type_name;
use std::collections::HashSet;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, trace, warn};

/// An OSCQuery service
///
/// ```no_run
/// use oscquery_core::Access;
/// use oscquery_server::OscQueryServiceBuilder;
///
/// # async fn run() -> oscquery_server::Result<()> {
/// let service = OscQueryServiceBuilder::new()
///     .with_service_name("Synth")
///     .with_tcp_port(0)
///     .start()
///     .await?;
///
/// service.add_endpoint("/synth/cutoff", "f", Access::ReadWrite, Some("0.5"), None)?;
/// # Ok(())
/// # }
/// ```
pub struct OscQueryService {
    config: ServiceConfig,
    tree: Arc<RwLock<OscQueryRootNode>>,
    host_info: HostInfo,
    discovery: Arc<dyn Discovery>,
    transport: Arc<dyn HttpTransport>,
    server: Mutex<Option<ServerHandle>>,
    events: Mutex<Option<mpsc::UnboundedReceiver<DiscoveryEvent>>>,
    forwarder: Mutex<Option<JoinHandle<()>>>,
    osc_found: Arc<Subscribers<ServiceProfile>>,
    oscquery_found: Arc<Subscribers<ServiceProfile>>,
    advertised: Mutex<Vec<ServiceProfile>>,
    stopped: AtomicBool,
}

impl OscQueryService {
    /// Service served by axum
    pub fn new(config: ServiceConfig, discovery: Arc<dyn Discovery>) -> Result<Self> {
        Self::with_transport(config, discovery, Arc::new(AxumTransport::new()))
    }

    pub fn with_transport(
        mut config: ServiceConfig,
        discovery: Arc<dyn Discovery>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        config.validate()?;
        if config.osc_port == 0 {
            config.osc_port = net::available_udp_port()?;
        }

        let host_info = config.host_info();
        let events = discovery.subscribe();

        Ok(Self {
            config,
            tree: Arc::new(RwLock::new(OscQueryRootNode::new())),
            host_info,
            discovery,
            transport,
            server: Mutex::new(None),
            events: Mutex::new(Some(events)),
            forwarder: Mutex::new(None),
            osc_found: Arc::new(Subscribers::new()),
            oscquery_found: Arc::new(Subscribers::new()),
            advertised: Mutex::new(Vec::new()),
            stopped: AtomicBool::new(false),
        })
    }

    fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.config.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }

    async fn scoped<F: Future>(&self, fut: F) -> F::Output {
        match &self.config.dispatch {
            Some(dispatch) => fut.with_subscriber(dispatch.clone()).await,
            None => fut.await,
        }
    }

    /// Pipeline serving this service's tree and host info
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(
            self.tree.clone(),
            HostInfoMiddleware::new(self.host_info.clone(), self.config.use_dynamic_osc_ip),
            self.config.middleware.clone(),
            &self.config.resources_dir,
        )
        .with_dispatch(self.config.dispatch.clone())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Bind the HTTP listener, advertise and start browsing.
    ///
    /// Nothing keeps running if any step fails.
    pub async fn start(&self) -> Result<()> {
        self.scoped(self.start_inner()).await
    }

    async fn start_inner(&self) -> Result<()> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(ServiceError::Stopped);
        }
        if self.server.lock().is_some() {
            return Err(ServiceError::AlreadyRunning);
        }

        let handler: Arc<dyn RequestHandler> = Arc::new(self.pipeline());
        let addrs = self.config.bind_addrs(self.config.http_port);
        let handle = match self.transport.listen(&addrs, handler).await {
            Ok(handle) => handle,
            Err(e) => {
                error!(
                    "Could not start OSCQuery service {}: {}",
                    self.config.server_name, e
                );
                return Err(e);
            }
        };

        {
            let mut server = self.server.lock();
            if server.is_some() {
                return Err(ServiceError::AlreadyRunning);
            }
            *server = Some(handle);
        }

        if let Err(e) = self.announce() {
            self.withdraw_advertised();
            if let Some(mut handle) = self.server.lock().take() {
                handle.shutdown();
            }
            return Err(e);
        }

        self.spawn_forwarder();
        info!(
            "OSCQuery service {} running on port {} (OSC port {})",
            self.config.server_name,
            self.http_port(),
            self.config.osc_port
        );
        Ok(())
    }

    fn announce(&self) -> Result<()> {
        if self.config.advertise_oscquery {
            self.advertise_oscquery_service()?;
        }
        if self.config.advertise_osc {
            self.advertise_osc_service()?;
        }
        self.refresh_services()
    }

    fn spawn_forwarder(&self) {
        let Some(mut events) = self.events.lock().take() else {
            return;
        };
        let osc_found = self.osc_found.clone();
        let oscquery_found = self.oscquery_found.clone();

        let forward = async move {
            while let Some(event) = events.recv().await {
                match event {
                    DiscoveryEvent::Found(profile) => {
                        let delivered = match profile.kind() {
                            ServiceKind::Osc => osc_found.publish(&profile),
                            ServiceKind::OscQuery => oscquery_found.publish(&profile),
                        };
                        trace!("Found {} ({} listeners)", profile, delivered);
                    }
                    DiscoveryEvent::Lost { name, kind } => {
                        debug!("{} service {} is gone", kind, name);
                    }
                }
            }
        };

        let task = match &self.config.dispatch {
            Some(dispatch) => tokio::spawn(forward.with_subscriber(dispatch.clone())),
            None => tokio::spawn(forward),
        };
        *self.forwarder.lock() = Some(task);
    }

    fn withdraw_advertised(&self) {
        let advertised: Vec<ServiceProfile> = self.advertised.lock().drain(..).collect();
        for profile in advertised {
            if let Err(e) = self.discovery.unadvertise(&profile) {
                warn!("Could not withdraw {}: {}", profile, e);
            }
        }
    }

    /// Stop serving, withdraw advertisements and release discovery.
    ///
    /// Idempotent. A stopped service cannot be started again. In-flight
    /// requests are not awaited.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        self.in_scope(|| {
            if let Some(mut handle) = self.server.lock().take() {
                handle.shutdown();
            }
            if let Some(forwarder) = self.forwarder.lock().take() {
                forwarder.abort();
            }
            self.withdraw_advertised();
            if let Err(e) = self.discovery.shutdown() {
                warn!("Discovery shutdown failed: {}", e);
            }
            self.osc_found.clear();
            self.oscquery_found.clear();
            info!("OSCQuery service {} stopped", self.config.server_name);
        });
    }

    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst) && self.server.lock().is_some()
    }

    // ========================================================================
    // Endpoints
    // ========================================================================

    /// Register a new endpoint. Fails on a relative path or an existing node.
    pub fn add_endpoint(
        &self,
        path: &str,
        osc_type: &str,
        access: Access,
        value: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        self.in_scope(|| {
            if address::validate(path).is_err() {
                error!(
                    "An OSC path must start with a '/', your path {} does not.",
                    path
                );
                return Err(ServiceError::InvalidPath(path.to_string()));
            }

            let mut tree = self.tree.write();
            if tree.contains(path) {
                warn!("Path already exists, skipping: {}", path);
                return Err(ServiceError::EndpointExists(path.to_string()));
            }

            let mut node = OscQueryNode::new(path)
                .with_type(osc_type)
                .with_access(access);
            if let Some(value) = value {
                node = node.with_value(value);
            }
            if let Some(description) = description {
                node = node.with_description(description);
            }
            tree.add_node(node);
            debug!("Added endpoint {} ({})", path, osc_type);
            Ok(())
        })
    }

    /// [`add_endpoint`](Self::add_endpoint) with the OSC type derived from `T`
    pub fn add_endpoint_of<T: ?Sized + 'static>(
        &self,
        path: &str,
        access: Access,
        value: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        match osc_type_tag::<T>() {
            Some(tag) => self.add_endpoint(path, tag, access, value, description),
            None => self.in_scope(|| {
                error!(
                    "Could not add {}: type {} has no OSC type tag",
                    path,
                    type_name::<T>()
                );
                Err(ServiceError::UnsupportedType(type_name::<T>().to_string()))
            }),
        }
    }

    /// Remove an endpoint and everything below it
    pub fn remove_endpoint(&self, path: &str) -> Result<()> {
        self.in_scope(|| {
            if address::validate(path).is_err() || address::normalize(path) == "/" {
                error!("Cannot remove endpoint at {}", path);
                return Err(ServiceError::InvalidPath(path.to_string()));
            }

            match self.tree.write().remove_node(path) {
                Some(node) => {
                    debug!("Removed {} ({} nodes)", path, node.subtree_len());
                    Ok(())
                }
                None => {
                    warn!("No endpoint found for {}", path);
                    Err(ServiceError::EndpointNotFound(path.to_string()))
                }
            }
        })
    }

    /// Set the value at `path`, creating a bare node if there is none
    pub fn set_value(&self, path: &str, value: impl Into<String>) -> Result<()> {
        self.in_scope(|| {
            if address::validate(path).is_err() {
                error!(
                    "An OSC path must start with a '/', your path {} does not.",
                    path
                );
                return Err(ServiceError::InvalidPath(path.to_string()));
            }
            self.tree.write().set_value(path, value);
            Ok(())
        })
    }

    /// Snapshot of the node at `path`, with its subtree
    pub fn node(&self, path: &str) -> Option<OscQueryNode> {
        self.tree.read().get_node_with_path(path).cloned()
    }

    pub fn value(&self, path: &str) -> Option<String> {
        self.tree
            .read()
            .get_node_with_path(path)
            .and_then(|node| node.value.clone())
    }

    /// Run `f` against the tree under the read lock
    pub fn with_tree<R>(&self, f: impl FnOnce(&OscQueryRootNode) -> R) -> R {
        f(&self.tree.read())
    }

    // ========================================================================
    // Discovery
    // ========================================================================

    fn advertise(&self, profile: ServiceProfile) -> Result<ServiceProfile> {
        if let Err(e) = self.discovery.advertise(&profile) {
            error!("Could not advertise {}: {}", profile, e);
            return Err(e.into());
        }
        let mut advertised = self.advertised.lock();
        if !advertised.contains(&profile) {
            advertised.push(profile.clone());
        }
        Ok(profile)
    }

    /// Advertise the HTTP endpoint as `_oscjson._tcp`
    pub fn advertise_oscquery_service(&self) -> Result<ServiceProfile> {
        self.in_scope(|| {
            self.advertise(ServiceProfile::new(
                self.config.server_name.clone(),
                self.config.oscquery_addrs(),
                self.http_port(),
                ServiceKind::OscQuery,
            ))
        })
    }

    /// Advertise the described OSC endpoint as `_osc._udp`
    pub fn advertise_osc_service(&self) -> Result<ServiceProfile> {
        self.in_scope(|| {
            self.advertise(ServiceProfile::new(
                self.config.server_name.clone(),
                self.config.osc_addrs(),
                self.config.osc_port,
                ServiceKind::Osc,
            ))
        })
    }

    /// Profiles this service currently advertises
    pub fn advertised(&self) -> Vec<ServiceProfile> {
        self.advertised.lock().clone()
    }

    /// Re-scan and re-emit visible services
    pub fn refresh_services(&self) -> Result<()> {
        self.in_scope(|| {
            self.discovery.refresh_services().map_err(|e| {
                error!("Service refresh failed: {}", e);
                ServiceError::from(e)
            })
        })
    }

    /// OSC peers found from now on
    pub fn on_osc_service_found(&self) -> mpsc::UnboundedReceiver<ServiceProfile> {
        self.osc_found.subscribe()
    }

    /// OSCQuery peers found from now on
    pub fn on_oscquery_service_found(&self) -> mpsc::UnboundedReceiver<ServiceProfile> {
        self.oscquery_found.subscribe()
    }

    pub fn osc_services(&self) -> HashSet<ServiceProfile> {
        self.discovery.osc_services()
    }

    pub fn oscquery_services(&self) -> HashSet<ServiceProfile> {
        self.discovery.oscquery_services()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn server_name(&self) -> &str {
        &self.config.server_name
    }

    /// Static host descriptor served for `HOST_INFO`
    pub fn host_info(&self) -> &HostInfo {
        &self.host_info
    }

    /// Bound HTTP port while running, the configured one otherwise
    pub fn http_port(&self) -> u16 {
        self.server
            .lock()
            .as_ref()
            .and_then(|handle| handle.local_addrs().first().map(|addr| addr.port()))
            .unwrap_or(self.config.http_port)
    }

    pub fn osc_port(&self) -> u16 {
        self.config.osc_port
    }

    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        self.server
            .lock()
            .as_ref()
            .map(|handle| handle.local_addrs().to_vec())
            .unwrap_or_default()
    }

    pub fn discovery(&self) -> &Arc<dyn Discovery> {
        &self.discovery
    }
}

impl Drop for OscQueryService {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for OscQueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OscQueryService")
            .field("name", &self.config.server_name)
            .field("http_port", &self.http_port())
            .field("osc_port", &self.config.osc_port)
            .field("running", &self.is_running())
            .finish()
    }
}
