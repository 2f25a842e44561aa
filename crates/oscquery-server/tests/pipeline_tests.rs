//! Middleware Pipeline Tests
//!
//! Runs the request pipeline directly, without sockets:
//! - HOST_INFO with static and per-caller OSC IP
//! - Tree queries and 404s
//! - User middleware ordering and short-circuit
//! - Static assets and missing-asset fallthrough
//! - A panicking interceptor never leaves a request unanswered

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use oscquery_core::{Access, HostInfo, OscQueryNode, OscQueryRootNode};
use oscquery_server::middleware::HostInfoMiddleware;
use oscquery_server::{
    middleware_fn, Flow, HttpContext, Middleware, OscQueryRequest, OscQueryResponse, Pipeline,
};
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn sample_tree() -> Arc<RwLock<OscQueryRootNode>> {
    let mut tree = OscQueryRootNode::new();
    tree.add_node(
        OscQueryNode::new("/avatar/parameters/VelocityX")
            .with_access(Access::ReadOnly)
            .with_type("f")
            .with_value("0.25"),
    );
    Arc::new(RwLock::new(tree))
}

fn template() -> HostInfo {
    HostInfo::new("TestService", "127.0.0.1", 9000)
}

fn missing_resources() -> PathBuf {
    PathBuf::from("/nonexistent/oscquery-resources")
}

fn pipeline(dynamic_ip: bool, user: Vec<Arc<dyn Middleware>>, resources: &Path) -> Pipeline {
    Pipeline::new(
        sample_tree(),
        HostInfoMiddleware::new(template(), dynamic_ip),
        user,
        resources,
    )
}

fn from(addr: &str) -> SocketAddr {
    addr.parse().unwrap()
}

fn json(response: &OscQueryResponse) -> serde_json::Value {
    serde_json::from_slice(&response.body).expect("body should be JSON")
}

// ============================================================================
// Host info
// ============================================================================

#[tokio::test]
async fn test_host_info_dynamic_ip_per_caller() {
    let pipeline = pipeline(true, Vec::new(), &missing_resources());

    let first = pipeline
        .run(OscQueryRequest::get("/?HOST_INFO").with_remote_addr(from("192.168.1.20:50000")))
        .await;
    let second = pipeline
        .run(OscQueryRequest::get("/?HOST_INFO").with_remote_addr(from("10.0.0.7:41000")))
        .await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(json(&first)["OSC_IP"], "192.168.1.20");
    assert_eq!(json(&second)["OSC_IP"], "10.0.0.7");
    assert_eq!(json(&second)["OSC_PORT"], 9000);
}

#[tokio::test]
async fn test_host_info_ipv4_mapped_caller() {
    let pipeline = pipeline(true, Vec::new(), &missing_resources());

    let response = pipeline
        .run(OscQueryRequest::get("/?HOST_INFO").with_remote_addr(from("[::ffff:192.168.1.30]:5000")))
        .await;

    assert_eq!(json(&response)["OSC_IP"], "192.168.1.30");
}

#[tokio::test]
async fn test_host_info_static_ip() {
    let pipeline = pipeline(false, Vec::new(), &missing_resources());

    let response = pipeline
        .run(OscQueryRequest::get("/?HOST_INFO").with_remote_addr(from("192.168.1.20:50000")))
        .await;

    let body = json(&response);
    assert_eq!(body["OSC_IP"], "127.0.0.1");
    assert_eq!(body["NAME"], "TestService");
    assert_eq!(body["OSC_TRANSPORT"], "UDP");
    assert_eq!(body["EXTENSIONS"]["VALUE"], true);
    assert_eq!(response.content_type(), Some("application/json"));
    assert_eq!(
        response.headers.get(header::PRAGMA).unwrap(),
        "no-cache"
    );
}

// ============================================================================
// Tree query
// ============================================================================

#[tokio::test]
async fn test_unknown_path_is_404() {
    let pipeline = pipeline(false, Vec::new(), &missing_resources());

    let response = pipeline.run(OscQueryRequest::get("/does/not/exist")).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body_str(), Some("OSC Path not found"));
    assert!(response
        .content_type()
        .unwrap()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_node_query_returns_subtree() {
    let pipeline = pipeline(false, Vec::new(), &missing_resources());

    let response = pipeline.run(OscQueryRequest::get("/avatar")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers.get(header::PRAGMA).unwrap(),
        "no-cache"
    );

    let body = json(&response);
    assert_eq!(body["FULL_PATH"], "/avatar");
    assert_eq!(body["ACCESS"], 0);
    let leaf = &body["CONTENTS"]["parameters"]["CONTENTS"]["VelocityX"];
    assert_eq!(leaf["TYPE"], "f");
    assert_eq!(leaf["ACCESS"], 1);
    assert_eq!(leaf["VALUE"][0], "0.25");
}

#[tokio::test]
async fn test_root_query() {
    let pipeline = pipeline(false, Vec::new(), &missing_resources());

    let body = json(&pipeline.run(OscQueryRequest::get("/")).await);
    assert_eq!(body["FULL_PATH"], "/");
    assert_eq!(body["DESCRIPTION"], "root node");
    assert!(body["CONTENTS"]["avatar"].is_object());
}

// ============================================================================
// User middleware
// ============================================================================

#[tokio::test]
async fn test_user_middleware_short_circuits() {
    let intercept = middleware_fn("status", |req: &OscQueryRequest| {
        if req.path == "/does/not/exist" {
            let mut response = OscQueryResponse::new();
            response.set_body("text/plain", "intercepted");
            Some(response)
        } else {
            None
        }
    });
    let pipeline = pipeline(false, vec![Arc::new(intercept)], &missing_resources());

    let response = pipeline.run(OscQueryRequest::get("/does/not/exist")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body_str(), Some("intercepted"));

    // Other paths still reach the tree
    let response = pipeline.run(OscQueryRequest::get("/avatar")).await;
    assert_eq!(json(&response)["FULL_PATH"], "/avatar");
}

#[tokio::test]
async fn test_host_info_runs_before_user_middleware() {
    let everything = middleware_fn("catch-all", |_: &OscQueryRequest| {
        let mut response = OscQueryResponse::new();
        response.set_body("text/plain", "user");
        Some(response)
    });
    let pipeline = pipeline(false, vec![Arc::new(everything)], &missing_resources());

    let response = pipeline.run(OscQueryRequest::get("/?HOST_INFO")).await;
    assert_eq!(json(&response)["NAME"], "TestService");

    let response = pipeline.run(OscQueryRequest::get("/avatar")).await;
    assert_eq!(response.body_str(), Some("user"));
}

struct Counter {
    seen: Arc<AtomicUsize>,
}

#[async_trait]
impl Middleware for Counter {
    async fn handle(&self, _ctx: &mut HttpContext) -> Flow {
        self.seen.fetch_add(1, Ordering::SeqCst);
        Flow::Next
    }
}

#[tokio::test]
async fn test_user_middleware_in_registration_order() {
    let seen = Arc::new(AtomicUsize::new(0));
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let first_order = order.clone();
    let first = middleware_fn("first", move |_: &OscQueryRequest| {
        first_order.lock().push("first");
        None
    });
    let second_order = order.clone();
    let second = middleware_fn("second", move |_: &OscQueryRequest| {
        second_order.lock().push("second");
        None
    });

    let pipeline = pipeline(
        false,
        vec![
            Arc::new(first),
            Arc::new(Counter { seen: seen.clone() }),
            Arc::new(second),
        ],
        &missing_resources(),
    );

    let response = pipeline.run(OscQueryRequest::get("/avatar")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(*order.lock(), vec!["first", "second"]);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

struct Panicking;

#[async_trait]
impl Middleware for Panicking {
    async fn handle(&self, ctx: &mut HttpContext) -> Flow {
        ctx.response.set_body("text/plain", "half-written");
        panic!("interceptor failure");
    }
}

#[tokio::test]
async fn test_panicking_middleware_still_answers() {
    let pipeline = pipeline(false, vec![Arc::new(Panicking)], &missing_resources());

    let response = pipeline.run(OscQueryRequest::get("/does/not/exist")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body_str(), Some("OSC Path not found"));

    let response = pipeline.run(OscQueryRequest::get("/avatar")).await;
    assert_eq!(json(&response)["FULL_PATH"], "/avatar");
}

// ============================================================================
// Static assets
// ============================================================================

#[tokio::test]
async fn test_missing_assets_fall_through() {
    let pipeline = pipeline(false, Vec::new(), &missing_resources());

    let response = pipeline.run(OscQueryRequest::get("/favicon.ico")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    // Falls through to the tree, which answers for the root
    let response = pipeline.run(OscQueryRequest::get("/?EXPLORER")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(json(&response)["FULL_PATH"], "/");
}

#[tokio::test]
async fn test_assets_served_from_resources_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("favicon.ico"), [0u8, 0, 1, 0]).unwrap();
    std::fs::write(
        dir.path().join("OSCQueryExplorer.html"),
        "<html>explorer</html>",
    )
    .unwrap();
    let pipeline = pipeline(false, Vec::new(), dir.path());

    let icon = pipeline.run(OscQueryRequest::get("/favicon.ico")).await;
    assert_eq!(icon.status, StatusCode::OK);
    assert_eq!(icon.content_type(), Some("image/x-icon"));
    assert_eq!(&icon.body[..], &[0u8, 0, 1, 0]);

    let nested = pipeline.run(OscQueryRequest::get("/avatar/favicon.ico")).await;
    assert_eq!(nested.content_type(), Some("image/x-icon"));

    let page = pipeline.run(OscQueryRequest::get("/?EXPLORER")).await;
    assert_eq!(page.content_type(), Some("text/html"));
    assert_eq!(page.body_str(), Some("<html>explorer</html>"));
}
