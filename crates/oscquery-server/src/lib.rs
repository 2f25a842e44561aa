//! OSCQuery Server
//!
//! Serves an OSC node tree over HTTP and advertises it over discovery.
//!
//! # Architecture
//!
//! ```text
//!            HttpTransport (axum)
//!                    │ OscQueryRequest
//!                    ▼
//!  ┌────────────── Pipeline ───────────────┐
//!  │ pre:  HostInfoMiddleware              │
//!  │ user: registered middleware, in order │
//!  │ post: Favicon, Explorer, TreeQuery    │
//!  └───────────────────────────────────────┘
//!                    │ reads
//!                    ▼
//!     OscQueryRootNode (RwLock) ◄── OscQueryService ──► Discovery
//! ```
//!
//! The first interceptor that handles a request ends the chain; the tree
//! query always handles, so every request gets a response.

pub mod builder;
pub mod config;
pub mod error;
pub mod http;
pub mod listener;
pub mod middleware;
pub mod pipeline;
pub mod service;
pub mod transport;

pub use builder::OscQueryServiceBuilder;
pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use http::{HttpContext, OscQueryRequest, OscQueryResponse};
pub use listener::AxumTransport;
pub use middleware::{middleware_fn, Flow, FnMiddleware, Middleware};
pub use pipeline::Pipeline;
pub use service::OscQueryService;
pub use transport::{HttpTransport, RequestHandler, ServerHandle};
