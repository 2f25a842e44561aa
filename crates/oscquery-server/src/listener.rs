//! axum-backed HTTP transport

use crate::error::{Result, ServiceError};
use crate::http::OscQueryRequest;
use crate::transport::{HttpTransport, RequestHandler, ServerHandle};
use async_trait::async_trait;
use axum::extract::{ConnectInfo, State};
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Serves every path through one catch-all route
#[derive(Debug, Clone, Copy, Default)]
pub struct AxumTransport;

impl AxumTransport {
    pub fn new() -> Self {
        Self
    }

    fn router(handler: Arc<dyn RequestHandler>) -> Router {
        Router::new()
            .fallback(dispatch)
            .layer(TraceLayer::new_for_http())
            .with_state(handler)
    }
}

async fn dispatch(
    State(handler): State<Arc<dyn RequestHandler>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
) -> Response {
    let request = OscQueryRequest::from_parts(method, &uri, Some(remote));
    handler.handle(request).await.into_response()
}

#[async_trait]
impl HttpTransport for AxumTransport {
    async fn listen(
        &self,
        addrs: &[SocketAddr],
        handler: Arc<dyn RequestHandler>,
    ) -> Result<ServerHandle> {
        if addrs.is_empty() {
            return Err(ServiceError::Config("no address to listen on".to_string()));
        }

        // Bind everything before serving anything. An ephemeral port is
        // resolved by the first bind and shared by every other address.
        let mut listeners: Vec<TcpListener> = Vec::with_capacity(addrs.len());
        for addr in addrs {
            let mut addr = *addr;
            if addr.port() == 0 {
                if let Some(first) = listeners.first() {
                    addr.set_port(first.local_addr()?.port());
                }
            }
            let listener = TcpListener::bind(addr).await.map_err(|e| {
                error!("Failed to bind HTTP server on {}: {}", addr, e);
                ServiceError::Transport(format!("bind {} failed: {}", addr, e))
            })?;
            listeners.push(listener);
        }

        let mut local_addrs = Vec::with_capacity(listeners.len());
        let mut tasks = Vec::with_capacity(listeners.len());
        for listener in listeners {
            let local = listener.local_addr()?;
            let app = Self::router(handler.clone());

            info!("OSCQuery HTTP server listening on {}", local);
            tasks.push(tokio::spawn(async move {
                if let Err(e) = axum::serve(
                    listener,
                    app.into_make_service_with_connect_info::<SocketAddr>(),
                )
                .await
                {
                    error!("HTTP server on {} failed: {}", local, e);
                }
            }));
            local_addrs.push(local);
        }

        Ok(ServerHandle::new(local_addrs, tasks))
    }
}
