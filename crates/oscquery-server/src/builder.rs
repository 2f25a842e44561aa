//! Service builder

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::middleware::Middleware;
use crate::service::OscQueryService;
use crate::transport::HttpTransport;
use oscquery_discovery::Discovery;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for [`OscQueryService`]
///
/// Collects a [`ServiceConfig`] and the collaborators; nothing is shared
/// with the service until [`build`](Self::build).
#[derive(Default)]
pub struct OscQueryServiceBuilder {
    config: ServiceConfig,
    discovery: Option<Arc<dyn Discovery>>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl OscQueryServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: ServiceConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set the HTTP port (0 = ephemeral)
    pub fn with_tcp_port(mut self, port: u16) -> Self {
        self.config.http_port = port;
        self
    }

    /// Set the OSC port being described (0 = any free UDP port)
    pub fn with_udp_port(mut self, port: u16) -> Self {
        self.config.osc_port = port;
        self
    }

    pub fn with_host_ip(mut self, ip: IpAddr) -> Self {
        self.config = self.config.with_host_ip(ip);
        self
    }

    pub fn with_host_ips(mut self, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        self.config = self.config.with_host_ips(ips);
        self
    }

    pub fn with_osc_ip(mut self, ip: IpAddr) -> Self {
        self.config = self.config.with_osc_ip(ip);
        self
    }

    pub fn with_osc_ips(mut self, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        self.config = self.config.with_osc_ips(ips);
        self
    }

    /// Report each caller's own address as `OSC_IP`
    pub fn with_dynamic_osc_ip(mut self, enabled: bool) -> Self {
        self.config.use_dynamic_osc_ip = enabled;
        self
    }

    /// Bind every interface
    pub fn with_listen_any_host(mut self, enabled: bool) -> Self {
        self.config.listen_any_host = enabled;
        self
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.config.server_name = name.into();
        self
    }

    /// Add a user interceptor; they run in the order added
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.config.middleware.push(Arc::new(middleware));
        self
    }

    pub fn with_discovery(mut self, discovery: Arc<dyn Discovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_resources_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.resources_dir = dir.into();
        self
    }

    /// Send this service's logs to `dispatch`
    pub fn with_dispatch(mut self, dispatch: tracing::Dispatch) -> Self {
        self.config.dispatch = Some(dispatch);
        self
    }

    pub fn advertise_osc(mut self, enabled: bool) -> Self {
        self.config.advertise_osc = enabled;
        self
    }

    pub fn advertise_oscquery(mut self, enabled: bool) -> Self {
        self.config.advertise_oscquery = enabled;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Validate and construct, without binding anything
    pub fn build(self) -> Result<OscQueryService> {
        let discovery = match self.discovery {
            Some(discovery) => discovery,
            None => default_discovery()?,
        };
        match self.transport {
            Some(transport) => OscQueryService::with_transport(self.config, discovery, transport),
            None => OscQueryService::new(self.config, discovery),
        }
    }

    /// Build and start
    pub async fn start(self) -> Result<OscQueryService> {
        let service = self.build()?;
        service.start().await?;
        Ok(service)
    }
}

#[cfg(feature = "mdns")]
fn default_discovery() -> Result<Arc<dyn Discovery>> {
    Ok(Arc::new(oscquery_discovery::MdnsDiscovery::new()?))
}

#[cfg(not(feature = "mdns"))]
fn default_discovery() -> Result<Arc<dyn Discovery>> {
    Ok(Arc::new(oscquery_discovery::MemoryDiscovery::new()))
}
