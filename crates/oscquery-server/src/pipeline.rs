//! Three-phase middleware pipeline
//!
//! Interceptors run strictly in order: pre (host info), then user
//! middleware in registration order, then post (static assets and the
//! tree-query fallback). The first interceptor returning
//! [`Flow::Handled`] ends the chain.

use crate::http::{HttpContext, OscQueryRequest, OscQueryResponse};
use crate::middleware::{
    ExplorerMiddleware, FaviconMiddleware, Flow, HostInfoMiddleware, Middleware,
    TreeQueryMiddleware,
};
use crate::transport::RequestHandler;
use async_trait::async_trait;
use futures::FutureExt;
use oscquery_core::OscQueryRootNode;
use parking_lot::RwLock;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use tracing::instrument::WithSubscriber;
use tracing::{error, trace};

pub struct Pipeline {
    pre: Vec<Arc<dyn Middleware>>,
    user: Vec<Arc<dyn Middleware>>,
    post: Vec<Arc<dyn Middleware>>,
    dispatch: Option<tracing::Dispatch>,
}

impl Pipeline {
    /// Standard pipeline over `tree`, with assets read from `resources_dir`
    pub fn new(
        tree: Arc<RwLock<OscQueryRootNode>>,
        host_info: HostInfoMiddleware,
        user: Vec<Arc<dyn Middleware>>,
        resources_dir: &Path,
    ) -> Self {
        Self {
            pre: vec![Arc::new(host_info)],
            user,
            post: vec![
                Arc::new(FaviconMiddleware::new(resources_dir)),
                Arc::new(ExplorerMiddleware::new(resources_dir)),
                Arc::new(TreeQueryMiddleware::new(tree)),
            ],
            dispatch: None,
        }
    }

    /// Log request handling through `dispatch` instead of the ambient dispatcher
    pub fn with_dispatch(mut self, dispatch: Option<tracing::Dispatch>) -> Self {
        self.dispatch = dispatch;
        self
    }

    fn interceptors(&self) -> impl Iterator<Item = &Arc<dyn Middleware>> {
        self.pre.iter().chain(&self.user).chain(&self.post)
    }

    /// Run the chain for one request
    pub async fn run(&self, request: OscQueryRequest) -> OscQueryResponse {
        match &self.dispatch {
            Some(dispatch) => self.run_chain(request).with_subscriber(dispatch.clone()).await,
            None => self.run_chain(request).await,
        }
    }

    async fn run_chain(&self, request: OscQueryRequest) -> OscQueryResponse {
        let mut ctx = HttpContext::new(request);

        for interceptor in self.interceptors() {
            let outcome = AssertUnwindSafe(interceptor.handle(&mut ctx))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Flow::Handled) => {
                    trace!("{} handled {}", interceptor.name(), ctx.request.path);
                    return ctx.response;
                }
                Ok(Flow::Next) => {}
                Err(_) => {
                    error!(
                        "Middleware {} panicked while handling {}",
                        interceptor.name(),
                        ctx.request.path
                    );
                    ctx.response = OscQueryResponse::new();
                }
            }
        }

        // Only reachable if the fallback itself failed
        ctx.response.set_not_found();
        ctx.response
    }
}

#[async_trait]
impl RequestHandler for Pipeline {
    async fn handle(&self, request: OscQueryRequest) -> OscQueryResponse {
        self.run(request).await
    }
}
