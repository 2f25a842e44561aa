//! Node tree tests
//!
//! Tests for path lookup, insertion, removal and JSON round-trips.

use oscquery_core::{Access, OscQueryNode, OscQueryRootNode};

fn sample_tree() -> OscQueryRootNode {
    let mut tree = OscQueryRootNode::new();
    tree.add_node(
        OscQueryNode::new("/avatar/parameters/VelocityX")
            .with_access(Access::ReadOnly)
            .with_type("f")
            .with_value("0.25")
            .with_description("Forward velocity"),
    );
    tree.add_node(
        OscQueryNode::new("/avatar/parameters/Grounded")
            .with_access(Access::ReadWrite)
            .with_type("T"),
    );
    tree.add_node(
        OscQueryNode::new("/tracking/head")
            .with_access(Access::WriteOnly)
            .with_type("fff"),
    );
    tree
}

#[test]
fn test_registered_metadata_is_returned() {
    let tree = sample_tree();
    let node = tree
        .get_node_with_path("/avatar/parameters/VelocityX")
        .unwrap();

    assert_eq!(node.full_path, "/avatar/parameters/VelocityX");
    assert_eq!(node.access, Some(Access::ReadOnly));
    assert_eq!(node.osc_type.as_deref(), Some("f"));
    assert_eq!(node.value.as_deref(), Some("0.25"));
    assert_eq!(node.description.as_deref(), Some("Forward velocity"));
}

#[test]
fn test_ancestors_are_resolvable() {
    let tree = sample_tree();

    for path in ["/avatar", "/avatar/parameters", "/tracking"] {
        let node = tree.get_node_with_path(path).unwrap();
        assert_eq!(node.full_path, path);
        assert_eq!(node.access, Some(Access::NoValue));
        assert!(node.osc_type.is_none());
    }
}

#[test]
fn test_children_are_keyed_by_segment() {
    let tree = sample_tree();
    let params = tree.get_node_with_path("/avatar/parameters").unwrap();

    let names: Vec<&str> = params.contents.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["Grounded", "VelocityX"]);
    assert_eq!(params.child("Grounded").unwrap().name(), "Grounded");
}

#[test]
fn test_unknown_path_not_found() {
    let tree = sample_tree();
    assert!(tree.get_node_with_path("/does/not/exist").is_none());
    assert!(tree.get_node_with_path("/avatar/parameters/VelocityX/extra").is_none());
}

#[test]
fn test_remove_drops_subtree() {
    let mut tree = sample_tree();
    let removed = tree.remove_node("/avatar").unwrap();

    assert_eq!(removed.subtree_len(), 4);
    assert!(tree.get_node_with_path("/avatar/parameters/VelocityX").is_none());
    assert!(tree.get_node_with_path("/tracking/head").is_some());
}

#[test]
fn test_set_value_only_touches_value() {
    let mut tree = sample_tree();
    tree.set_value("/avatar/parameters/VelocityX", "0.75");

    let node = tree
        .get_node_with_path("/avatar/parameters/VelocityX")
        .unwrap();
    assert_eq!(node.value.as_deref(), Some("0.75"));
    assert_eq!(node.access, Some(Access::ReadOnly));
    assert_eq!(node.osc_type.as_deref(), Some("f"));
    assert_eq!(node.description.as_deref(), Some("Forward velocity"));
}

#[test]
fn test_json_round_trip() {
    let tree = sample_tree();
    let json = tree.to_json().unwrap();
    let parsed = OscQueryRootNode::from_json(&json).unwrap();

    assert_eq!(parsed, tree);

    let mut original_paths = Vec::new();
    tree.root().walk(&mut |n| original_paths.push(n.full_path.clone()));
    let mut parsed_paths = Vec::new();
    parsed.root().walk(&mut |n| parsed_paths.push(n.full_path.clone()));
    assert_eq!(original_paths, parsed_paths);
}

#[test]
fn test_subtree_json_nests_contents() {
    let tree = sample_tree();
    let bytes = tree.node_json("/avatar").unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["FULL_PATH"], "/avatar");
    assert_eq!(
        json["CONTENTS"]["parameters"]["CONTENTS"]["VelocityX"]["VALUE"],
        serde_json::json!(["0.25"])
    );
    assert!(tree.node_json("/missing").is_none());
}

#[test]
fn test_parse_peer_tree() {
    let json = r#"{
        "FULL_PATH": "/",
        "ACCESS": 0,
        "DESCRIPTION": "root node",
        "CONTENTS": {
            "foo": {
                "FULL_PATH": "/foo",
                "ACCESS": 3,
                "TYPE": "i",
                "VALUE": [42]
            }
        }
    }"#;

    let tree = OscQueryRootNode::from_json(json).unwrap();
    let foo = tree.get_node_with_path("/foo").unwrap();
    assert_eq!(foo.value.as_deref(), Some("42"));
    assert_eq!(foo.access, Some(Access::ReadWrite));
}
