use super::{Flow, Middleware};
use crate::http::HttpContext;
use async_trait::async_trait;
use oscquery_core::EXPLORER;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

const FAVICON_FILE: &str = "favicon.ico";
const EXPLORER_FILE: &str = "OSCQueryExplorer.html";

/// `Resources/` next to the running executable
pub fn default_resources_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("Resources")))
        .unwrap_or_else(|| PathBuf::from("Resources"))
}

/// Serve a file, or pass the request on if it cannot be read
async fn serve_static_file(path: &Path, content_type: &'static str, ctx: &mut HttpContext) -> Flow {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            debug!("Serving {} ({} bytes)", path.display(), bytes.len());
            ctx.response.set_body(content_type, bytes);
            Flow::Handled
        }
        Err(e) => {
            error!("Cannot find file at {} to serve: {}", path.display(), e);
            Flow::Next
        }
    }
}

/// Serves `favicon.ico` for any path ending in `/favicon.ico`
pub struct FaviconMiddleware {
    path: PathBuf,
}

impl FaviconMiddleware {
    pub fn new(resources_dir: &Path) -> Self {
        Self {
            path: resources_dir.join(FAVICON_FILE),
        }
    }
}

#[async_trait]
impl Middleware for FaviconMiddleware {
    fn name(&self) -> &str {
        "favicon"
    }

    async fn handle(&self, ctx: &mut HttpContext) -> Flow {
        if !ctx.request.path.ends_with("/favicon.ico") {
            return Flow::Next;
        }
        serve_static_file(&self.path, "image/x-icon", ctx).await
    }
}

/// Serves the browser explorer page for `?EXPLORER`
pub struct ExplorerMiddleware {
    path: PathBuf,
}

impl ExplorerMiddleware {
    pub fn new(resources_dir: &Path) -> Self {
        Self {
            path: resources_dir.join(EXPLORER_FILE),
        }
    }
}

#[async_trait]
impl Middleware for ExplorerMiddleware {
    fn name(&self) -> &str {
        "explorer"
    }

    async fn handle(&self, ctx: &mut HttpContext) -> Flow {
        if !ctx.request.has_query_key(EXPLORER) {
            return Flow::Next;
        }
        serve_static_file(&self.path, "text/html", ctx).await
    }
}
