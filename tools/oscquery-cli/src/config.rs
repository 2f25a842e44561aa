//! TOML service description for `oscquery serve`

use anyhow::{Context, Result};
use oscquery_core::Access;
use oscquery_server::ServiceConfig;
use serde::Deserialize;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub name: Option<String>,
    pub http_port: Option<u16>,
    pub osc_port: Option<u16>,
    #[serde(default)]
    pub host_ips: Vec<IpAddr>,
    #[serde(default)]
    pub osc_ips: Vec<IpAddr>,
    #[serde(default)]
    pub listen_any_host: bool,
    #[serde(default)]
    pub dynamic_osc_ip: bool,
    pub resources_dir: Option<PathBuf>,
    #[serde(default, rename = "endpoint")]
    pub endpoints: Vec<EndpointConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessName {
    #[default]
    None,
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl From<AccessName> for Access {
    fn from(name: AccessName) -> Self {
        match name {
            AccessName::None => Access::NoValue,
            AccessName::ReadOnly => Access::ReadOnly,
            AccessName::WriteOnly => Access::WriteOnly,
            AccessName::ReadWrite => Access::ReadWrite,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    pub path: String,
    #[serde(rename = "type")]
    pub osc_type: String,
    #[serde(default)]
    pub access: AccessName,
    pub value: Option<String>,
    pub description: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Service configuration described by this file
    pub fn service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::default()
            .with_host_ips(self.host_ips.iter().copied())
            .with_osc_ips(self.osc_ips.iter().copied())
            .with_listen_any_host(self.listen_any_host)
            .with_dynamic_osc_ip(self.dynamic_osc_ip);
        if let Some(name) = &self.name {
            config.server_name = name.clone();
        }
        if let Some(port) = self.http_port {
            config.http_port = port;
        }
        if let Some(port) = self.osc_port {
            config.osc_port = port;
        }
        if let Some(dir) = &self.resources_dir {
            config.resources_dir = dir.clone();
        }
        config
    }
}
