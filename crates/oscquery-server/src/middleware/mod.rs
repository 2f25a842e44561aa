//! Request interceptors
//!
//! Every interceptor sees the shared [`HttpContext`] and either handles the
//! request ([`Flow::Handled`], the chain stops) or passes it on
//! ([`Flow::Next`]). The built-in interceptors are:
//! - [`HostInfoMiddleware`] for `?HOST_INFO`
//! - [`FaviconMiddleware`] and [`ExplorerMiddleware`] for static assets
//! - [`TreeQueryMiddleware`], the fallback that always answers

mod assets;
mod host_info;
mod tree;

pub use assets::{default_resources_dir, ExplorerMiddleware, FaviconMiddleware};
pub use host_info::HostInfoMiddleware;
pub use tree::TreeQueryMiddleware;

use crate::http::{HttpContext, OscQueryRequest, OscQueryResponse};
use async_trait::async_trait;

/// Outcome of one interceptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Not handled here, continue with the next interceptor
    Next,
    /// Response is complete, stop the chain
    Handled,
}

/// A request interceptor
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn handle(&self, ctx: &mut HttpContext) -> Flow;
}

/// Interceptor built from a closure.
///
/// The closure returns `Some(response)` to handle the request and `None` to
/// pass it on.
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&OscQueryRequest) -> Option<OscQueryResponse> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&OscQueryRequest) -> Option<OscQueryResponse> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, ctx: &mut HttpContext) -> Flow {
        match (self.f)(&ctx.request) {
            Some(response) => {
                ctx.response = response;
                Flow::Handled
            }
            None => Flow::Next,
        }
    }
}

/// Shorthand for [`FnMiddleware::new`]
pub fn middleware_fn<F>(name: impl Into<String>, f: F) -> FnMiddleware<F>
where
    F: Fn(&OscQueryRequest) -> Option<OscQueryResponse> + Send + Sync,
{
    FnMiddleware::new(name, f)
}
