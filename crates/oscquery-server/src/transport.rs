//! HTTP transport abstraction
//!
//! The service never touches sockets directly: it hands a
//! [`RequestHandler`] to an [`HttpTransport`], which listens and feeds every
//! request through it.

use crate::error::Result;
use crate::http::{OscQueryRequest, OscQueryResponse};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Produces a response for every request
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, request: OscQueryRequest) -> OscQueryResponse;
}

/// Something that can accept HTTP requests on a set of addresses
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Bind every address and start serving.
    ///
    /// Must fail without serving anything if any address cannot be bound.
    async fn listen(
        &self,
        addrs: &[SocketAddr],
        handler: Arc<dyn RequestHandler>,
    ) -> Result<ServerHandle>;
}

/// Running listeners. Dropping the handle stops them.
#[derive(Debug)]
pub struct ServerHandle {
    local_addrs: Vec<SocketAddr>,
    tasks: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn new(local_addrs: Vec<SocketAddr>, tasks: Vec<JoinHandle<()>>) -> Self {
        Self { local_addrs, tasks }
    }

    /// Addresses actually bound, with ephemeral ports resolved
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    /// Stop accepting connections. In-flight requests are not awaited.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
