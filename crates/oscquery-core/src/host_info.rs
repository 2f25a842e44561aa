//! Host descriptor served for `HOST_INFO` queries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Transport the described OSC server listens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OscTransport {
    #[default]
    Udp,
    Tcp,
}

/// Descriptor of this service's OSC endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "OSC_PORT")]
    pub osc_port: u16,
    #[serde(rename = "OSC_IP")]
    pub osc_ip: String,
    #[serde(rename = "OSC_TRANSPORT", default)]
    pub osc_transport: OscTransport,
    /// Optional OSCQuery features this server supports
    #[serde(rename = "EXTENSIONS", default)]
    pub extensions: BTreeMap<String, bool>,
}

impl HostInfo {
    pub fn new(name: impl Into<String>, osc_ip: impl Into<String>, osc_port: u16) -> Self {
        Self {
            name: name.into(),
            osc_port,
            osc_ip: osc_ip.into(),
            osc_transport: OscTransport::Udp,
            extensions: default_extensions(),
        }
    }

    pub fn with_transport(mut self, transport: OscTransport) -> Self {
        self.osc_transport = transport;
        self
    }

    /// Copy of this descriptor reporting a different OSC IP
    pub fn with_osc_ip(&self, osc_ip: impl Into<String>) -> Self {
        Self {
            osc_ip: osc_ip.into(),
            ..self.clone()
        }
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.extensions.get(extension).copied().unwrap_or(false)
    }
}

/// Extensions advertised by default
pub fn default_extensions() -> BTreeMap<String, bool> {
    [
        ("ACCESS", true),
        ("CLIPMODE", false),
        ("RANGE", true),
        ("TYPE", true),
        ("VALUE", true),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}
