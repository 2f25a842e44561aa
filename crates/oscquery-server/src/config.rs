//! Service configuration

use crate::error::{Result, ServiceError};
use crate::middleware::{default_resources_dir, Middleware};
use oscquery_core::{
    HostInfo, OscTransport, DEFAULT_PORT_HTTP, DEFAULT_PORT_OSC, DEFAULT_SERVER_NAME,
};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything an [`OscQueryService`](crate::OscQueryService) needs before it
/// starts. Validated once, at construction of the service.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Instance name advertised over discovery and reported as `NAME`
    pub server_name: String,
    /// HTTP port; 0 picks an ephemeral port at bind time
    pub http_port: u16,
    /// OSC port being described; 0 picks a free UDP port at construction
    pub osc_port: u16,
    /// Addresses the HTTP server binds; loopback when empty
    pub host_ips: Vec<IpAddr>,
    /// Bind `0.0.0.0` instead of `host_ips`
    pub listen_any_host: bool,
    /// Addresses advertised for OSC, the first is the static `OSC_IP`;
    /// loopback when empty
    pub osc_ips: Vec<IpAddr>,
    pub osc_transport: OscTransport,
    /// Report the caller's address as `OSC_IP`
    pub use_dynamic_osc_ip: bool,
    pub advertise_osc: bool,
    pub advertise_oscquery: bool,
    /// Directory holding `favicon.ico` and `OSCQueryExplorer.html`
    pub resources_dir: PathBuf,
    /// User interceptors, run in order between host info and the tree query
    pub middleware: Vec<Arc<dyn Middleware>>,
    /// Dispatcher for this service's logs; the ambient one when `None`
    pub dispatch: Option<tracing::Dispatch>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            http_port: DEFAULT_PORT_HTTP,
            osc_port: DEFAULT_PORT_OSC,
            host_ips: Vec::new(),
            listen_any_host: false,
            osc_ips: Vec::new(),
            osc_transport: OscTransport::Udp,
            use_dynamic_osc_ip: false,
            advertise_osc: true,
            advertise_oscquery: true,
            resources_dir: default_resources_dir(),
            middleware: Vec::new(),
            dispatch: None,
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let middleware: Vec<&str> = self.middleware.iter().map(|m| m.name()).collect();
        f.debug_struct("ServiceConfig")
            .field("server_name", &self.server_name)
            .field("http_port", &self.http_port)
            .field("osc_port", &self.osc_port)
            .field("host_ips", &self.host_ips)
            .field("listen_any_host", &self.listen_any_host)
            .field("osc_ips", &self.osc_ips)
            .field("osc_transport", &self.osc_transport)
            .field("use_dynamic_osc_ip", &self.use_dynamic_osc_ip)
            .field("advertise_osc", &self.advertise_osc)
            .field("advertise_oscquery", &self.advertise_oscquery)
            .field("resources_dir", &self.resources_dir)
            .field("middleware", &middleware)
            .field("dispatch", &self.dispatch.is_some())
            .finish()
    }
}

const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

fn push_unique(ips: &mut Vec<IpAddr>, ip: IpAddr) {
    if !ips.contains(&ip) {
        ips.push(ip);
    }
}

fn or_loopback(ips: &[IpAddr]) -> Vec<IpAddr> {
    if ips.is_empty() {
        vec![LOOPBACK]
    } else {
        ips.to_vec()
    }
}

impl ServiceConfig {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            ..Self::default()
        }
    }

    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    pub fn with_osc_port(mut self, port: u16) -> Self {
        self.osc_port = port;
        self
    }

    pub fn with_host_ip(mut self, ip: IpAddr) -> Self {
        push_unique(&mut self.host_ips, ip);
        self
    }

    pub fn with_host_ips(mut self, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        for ip in ips {
            push_unique(&mut self.host_ips, ip);
        }
        self
    }

    pub fn with_listen_any_host(mut self, any: bool) -> Self {
        self.listen_any_host = any;
        self
    }

    pub fn with_osc_ip(mut self, ip: IpAddr) -> Self {
        push_unique(&mut self.osc_ips, ip);
        self
    }

    pub fn with_osc_ips(mut self, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        for ip in ips {
            push_unique(&mut self.osc_ips, ip);
        }
        self
    }

    pub fn with_osc_transport(mut self, transport: OscTransport) -> Self {
        self.osc_transport = transport;
        self
    }

    pub fn with_dynamic_osc_ip(mut self, enabled: bool) -> Self {
        self.use_dynamic_osc_ip = enabled;
        self
    }

    pub fn with_resources_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resources_dir = dir.into();
        self
    }

    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn with_dispatch(mut self, dispatch: tracing::Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn advertise_osc(mut self, enabled: bool) -> Self {
        self.advertise_osc = enabled;
        self
    }

    pub fn advertise_oscquery(mut self, enabled: bool) -> Self {
        self.advertise_oscquery = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_name.trim().is_empty() {
            return Err(ServiceError::Config("server name is empty".to_string()));
        }
        if let Some(ip) = self
            .host_ips
            .iter()
            .find(|ip| ip.is_unspecified() || ip.is_multicast())
        {
            return Err(ServiceError::Config(format!(
                "cannot bind host address {}, use listen_any_host for all interfaces",
                ip
            )));
        }
        Ok(())
    }

    /// Socket addresses the HTTP server binds for `port`
    pub fn bind_addrs(&self, port: u16) -> Vec<SocketAddr> {
        if self.listen_any_host {
            vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)]
        } else {
            or_loopback(&self.host_ips)
                .into_iter()
                .map(|ip| SocketAddr::new(ip, port))
                .collect()
        }
    }

    /// Addresses advertised for the OSCQuery (HTTP) endpoint
    pub fn oscquery_addrs(&self) -> Vec<IpAddr> {
        if self.listen_any_host {
            vec![IpAddr::V4(Ipv4Addr::UNSPECIFIED)]
        } else {
            or_loopback(&self.host_ips)
        }
    }

    /// Addresses advertised for the OSC endpoint
    pub fn osc_addrs(&self) -> Vec<IpAddr> {
        or_loopback(&self.osc_ips)
    }

    /// Static host descriptor; `OSC_IP` is the first OSC address
    pub fn host_info(&self) -> HostInfo {
        let osc_ip = self.osc_ips.first().copied().unwrap_or(LOOPBACK);
        HostInfo::new(self.server_name.clone(), osc_ip.to_string(), self.osc_port)
            .with_transport(self.osc_transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.server_name, "OSCQueryService");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.osc_port, 9000);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.bind_addrs(8080),
            vec!["127.0.0.1:8080".parse::<SocketAddr>().unwrap()]
        );
    }

    #[test]
    fn test_host_ips_deduplicated() {
        let lan: IpAddr = "192.168.1.10".parse().unwrap();
        let config = ServiceConfig::default()
            .with_host_ip(lan)
            .with_host_ip(lan)
            .with_host_ips([LOOPBACK, lan]);

        assert_eq!(config.host_ips, vec![lan, LOOPBACK]);
        assert_eq!(config.bind_addrs(1).len(), 2);
    }

    #[test]
    fn test_listen_any_host() {
        let config = ServiceConfig::default()
            .with_host_ip(LOOPBACK)
            .with_listen_any_host(true);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.bind_addrs(0),
            vec!["0.0.0.0:0".parse::<SocketAddr>().unwrap()]
        );
    }

    #[test]
    fn test_invalid_configs() {
        assert!(ServiceConfig::new("  ").validate().is_err());
        assert!(ServiceConfig::default()
            .with_host_ip("0.0.0.0".parse().unwrap())
            .validate()
            .is_err());
        assert!(ServiceConfig::default()
            .with_host_ip("224.0.0.251".parse().unwrap())
            .validate()
            .is_err());
    }

    #[test]
    fn test_host_info_template() {
        let config = ServiceConfig::new("svc")
            .with_osc_port(9001)
            .with_osc_ip("10.0.0.5".parse().unwrap())
            .with_osc_ip("10.0.0.6".parse().unwrap())
            .with_osc_transport(OscTransport::Tcp);
        let info = config.host_info();

        assert_eq!(info.name, "svc");
        assert_eq!(info.osc_ip, "10.0.0.5");
        assert_eq!(info.osc_port, 9001);
        assert_eq!(info.osc_transport, OscTransport::Tcp);
        assert_eq!(config.osc_addrs().len(), 2);
    }
}
