//! Service error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid OSC path: {0}")]
    InvalidPath(String),

    #[error("endpoint already exists: {0}")]
    EndpointExists(String),

    #[error("no endpoint found for {0}")]
    EndpointNotFound(String),

    #[error("unsupported value type: {0}")]
    UnsupportedType(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("service already running")]
    AlreadyRunning,

    #[error("service has been stopped")]
    Stopped,

    #[error("discovery error: {0}")]
    Discovery(#[from] oscquery_discovery::DiscoveryError),

    #[error("core error: {0}")]
    Core(#[from] oscquery_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
