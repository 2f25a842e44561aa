use super::{Flow, Middleware};
use crate::http::HttpContext;
use async_trait::async_trait;
use oscquery_core::OscQueryRootNode;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error};

/// Fallback interceptor: answers every request from the node tree.
///
/// The node is serialized while the read lock is held and the lock is
/// released before the response leaves, so writers never wait on I/O.
pub struct TreeQueryMiddleware {
    tree: Arc<RwLock<OscQueryRootNode>>,
}

impl TreeQueryMiddleware {
    pub fn new(tree: Arc<RwLock<OscQueryRootNode>>) -> Self {
        Self { tree }
    }
}

#[async_trait]
impl Middleware for TreeQueryMiddleware {
    fn name(&self) -> &str {
        "tree-query"
    }

    async fn handle(&self, ctx: &mut HttpContext) -> Flow {
        let path = ctx.request.path.as_str();
        let lookup = self.tree.read().node_json(path);

        match lookup {
            None => {
                debug!("OSC path not found: {}", path);
                ctx.response.set_not_found();
            }
            Some(Ok(body)) => ctx.response.set_json(body),
            Some(Err(e)) => {
                error!("Could not serialize node {}: {}", path, e);
                ctx.response.set_json(Vec::new());
            }
        }
        Flow::Handled
    }
}
