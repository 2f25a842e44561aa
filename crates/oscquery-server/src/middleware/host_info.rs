use super::{Flow, Middleware};
use crate::http::HttpContext;
use async_trait::async_trait;
use oscquery_core::{HostInfo, HOST_INFO};
use std::borrow::Cow;
use tracing::error;

/// Answers `?HOST_INFO` with the host descriptor.
///
/// With dynamic OSC IP enabled, the reported `OSC_IP` is the caller's
/// observed address; the template itself is never modified.
pub struct HostInfoMiddleware {
    template: HostInfo,
    dynamic_osc_ip: bool,
}

impl HostInfoMiddleware {
    pub fn new(template: HostInfo, dynamic_osc_ip: bool) -> Self {
        Self {
            template,
            dynamic_osc_ip,
        }
    }

    pub fn template(&self) -> &HostInfo {
        &self.template
    }

    fn host_info_for(&self, ctx: &HttpContext) -> Cow<'_, HostInfo> {
        match ctx.request.remote_addr {
            Some(remote) if self.dynamic_osc_ip => {
                Cow::Owned(self.template.with_osc_ip(remote.ip().to_canonical().to_string()))
            }
            _ => Cow::Borrowed(&self.template),
        }
    }
}

#[async_trait]
impl Middleware for HostInfoMiddleware {
    fn name(&self) -> &str {
        "host-info"
    }

    async fn handle(&self, ctx: &mut HttpContext) -> Flow {
        if !ctx.request.has_query_key(HOST_INFO) {
            return Flow::Next;
        }

        let host_info = self.host_info_for(ctx);
        match serde_json::to_vec(host_info.as_ref()) {
            Ok(body) => ctx.response.set_json(body),
            Err(e) => error!("Could not construct and send Host Info: {}", e),
        }
        Flow::Handled
    }
}
