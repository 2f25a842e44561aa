//! OSCQuery Core
//!
//! Protocol primitives shared by the OSCQuery service, discovery and client:
//! - OSC address handling ([`address`])
//! - The addressable node tree ([`OscQueryNode`], [`OscQueryRootNode`])
//! - Host descriptor served for `HOST_INFO` queries ([`HostInfo`])
//! - Advertised / discovered endpoint descriptions ([`ServiceProfile`])
//! - Value type to OSC type-tag lookup ([`osc_type_tag`])

pub mod address;
pub mod error;
pub mod host_info;
pub mod net;
pub mod node;
pub mod profile;
pub mod tree;
pub mod types;

pub use error::{Error, Result};
pub use host_info::{HostInfo, OscTransport};
pub use node::{Access, OscQueryNode};
pub use profile::{ServiceKind, ServiceProfile};
pub use tree::OscQueryRootNode;
pub use types::osc_type_tag;

/// Default TCP port for the OSCQuery HTTP server
pub const DEFAULT_PORT_HTTP: u16 = 8080;

/// Default UDP port of the OSC server being described
pub const DEFAULT_PORT_OSC: u16 = 9000;

/// Default server name
pub const DEFAULT_SERVER_NAME: &str = "OSCQueryService";

/// Service type of a raw OSC endpoint
pub const SERVICE_OSC_UDP: &str = "_osc._udp";

/// Service type of an OSCQuery (HTTP + JSON) endpoint
pub const SERVICE_OSCJSON_TCP: &str = "_oscjson._tcp";

/// Query key requesting the host descriptor
pub const HOST_INFO: &str = "HOST_INFO";

/// Query key requesting the browser explorer page
pub const EXPLORER: &str = "EXPLORER";

/// Body of the response for an unknown OSC path
pub const PATH_NOT_FOUND: &str = "OSC Path not found";
