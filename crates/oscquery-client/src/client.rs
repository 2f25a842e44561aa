//! HTTP queries against an OSCQuery peer

use crate::error::{ClientError, Result};
use oscquery_core::{address, HostInfo, OscQueryNode, OscQueryRootNode, ServiceProfile, HOST_INFO};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches trees and host info from OSCQuery servers
#[derive(Debug, Clone)]
pub struct OscQueryClient {
    http: reqwest::Client,
}

impl OscQueryClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    async fn get(&self, url: String) -> Result<String> {
        debug!("GET {}", url);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("{} returned {}", url, status);
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    /// The whole tree served at `addr`
    pub async fn tree(&self, addr: SocketAddr) -> Result<OscQueryRootNode> {
        let body = self.get(format!("http://{}/", addr)).await?;
        Ok(OscQueryRootNode::from_json(&body)?)
    }

    /// The node at `path`, with its subtree
    pub async fn node(&self, addr: SocketAddr, path: &str) -> Result<OscQueryNode> {
        address::validate(path)?;
        let body = self.get(format!("http://{}{}", addr, path)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn host_info(&self, addr: SocketAddr) -> Result<HostInfo> {
        let body = self.get(format!("http://{}/?{}", addr, HOST_INFO)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Tree of a discovered OSCQuery service, from its first address
    pub async fn tree_of(&self, profile: &ServiceProfile) -> Result<OscQueryRootNode> {
        self.tree(first_addr(profile)?).await
    }

    /// Host info of a discovered OSCQuery service, from its first address
    pub async fn host_info_of(&self, profile: &ServiceProfile) -> Result<HostInfo> {
        self.host_info(first_addr(profile)?).await
    }
}

fn first_addr(profile: &ServiceProfile) -> Result<SocketAddr> {
    if profile.is_wildcard() {
        return Err(ClientError::NoAddress(profile.name().to_string()));
    }
    profile
        .socket_addrs()
        .find(|addr| !addr.ip().is_unspecified())
        .ok_or_else(|| ClientError::NoAddress(profile.name().to_string()))
}
