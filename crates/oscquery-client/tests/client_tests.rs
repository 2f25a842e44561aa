//! Client Tests (oscquery-client)
//!
//! Queries a live service bound to 127.0.0.1:
//! - Full tree fetch and parse
//! - Single node fetch and 404 mapping
//! - Host info fetch, directly and through a discovered profile

use oscquery_client::{ClientError, OscQueryClient};
use oscquery_core::{Access, ServiceKind, ServiceProfile};
use oscquery_discovery::MemoryDiscovery;
use oscquery_server::{OscQueryService, OscQueryServiceBuilder};
use std::net::SocketAddr;
use std::sync::Arc;

async fn service() -> OscQueryService {
    let service = OscQueryServiceBuilder::new()
        .with_service_name("ClientTarget")
        .with_tcp_port(0)
        .with_udp_port(9001)
        .with_discovery(Arc::new(MemoryDiscovery::new()))
        .start()
        .await
        .expect("service should start");

    service
        .add_endpoint(
            "/avatar/parameters/Grounded",
            "T",
            Access::ReadOnly,
            Some("true"),
            None,
        )
        .unwrap();
    service
        .add_endpoint("/tracking/head", "fff", Access::WriteOnly, None, Some("head pose"))
        .unwrap();
    service
}

fn addr(service: &OscQueryService) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], service.http_port()))
}

#[tokio::test]
async fn test_fetch_tree() {
    let service = service().await;
    let client = OscQueryClient::new().unwrap();

    let tree = client.tree(addr(&service)).await.unwrap();

    let grounded = tree.get_node_with_path("/avatar/parameters/Grounded").unwrap();
    assert_eq!(grounded.osc_type.as_deref(), Some("T"));
    assert_eq!(grounded.value.as_deref(), Some("true"));
    assert_eq!(grounded.access, Some(Access::ReadOnly));

    let head = tree.get_node_with_path("/tracking/head").unwrap();
    assert_eq!(head.description.as_deref(), Some("head pose"));
    assert_eq!(tree.len(), service.with_tree(|t| t.len()));
}

#[tokio::test]
async fn test_fetch_node_and_missing_node() {
    let service = service().await;
    let client = OscQueryClient::new().unwrap();

    let node = client.node(addr(&service), "/tracking").await.unwrap();
    assert_eq!(node.full_path, "/tracking");
    assert!(node.child("head").is_some());

    match client.node(addr(&service), "/nothing/here").await {
        Err(ClientError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected 404, got {:?}", other),
    }
    assert!(client.node(addr(&service), "relative").await.is_err());
}

#[tokio::test]
async fn test_fetch_host_info() {
    let service = service().await;
    let client = OscQueryClient::new().unwrap();

    let info = client.host_info(addr(&service)).await.unwrap();
    assert_eq!(info.name, "ClientTarget");
    assert_eq!(info.osc_port, 9001);
    assert!(info.supports("VALUE"));

    let advertised = ServiceProfile::new(
        "ClientTarget",
        [addr(&service).ip()],
        service.http_port(),
        ServiceKind::OscQuery,
    );
    let via_profile = client.host_info_of(&advertised).await.unwrap();
    assert_eq!(via_profile, info);
}

#[tokio::test]
async fn test_wildcard_profile_has_no_address() {
    let client = OscQueryClient::new().unwrap();
    let wildcard = ServiceProfile::new(
        "Anywhere",
        ["0.0.0.0".parse().unwrap()],
        8080,
        ServiceKind::OscQuery,
    );

    match client.tree_of(&wildcard).await {
        Err(ClientError::NoAddress(name)) => assert_eq!(name, "Anywhere"),
        other => panic!("expected NoAddress, got {:?}", other.map(|t| t.len())),
    }
}
