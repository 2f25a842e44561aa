//! The OSC address tree
//!
//! A strict tree rooted at `/`: every node is owned by its parent and keyed
//! by its last path segment. Missing ancestors are created on insertion as
//! `NoValue` containers.

use crate::address;
use crate::node::{Access, OscQueryNode};
use crate::{Error, Result};
use std::collections::btree_map::Entry;

/// Description given to the root node
pub const ROOT_DESCRIPTION: &str = "root node";

/// Root of an OSC address tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OscQueryRootNode {
    root: OscQueryNode,
}

impl OscQueryRootNode {
    pub fn new() -> Self {
        Self {
            root: OscQueryNode::container("/").with_description(ROOT_DESCRIPTION),
        }
    }

    /// Wrap an existing root node (e.g. one fetched from a peer)
    pub fn from_node(mut root: OscQueryNode) -> Result<Self> {
        if address::normalize(&root.full_path) != "/" {
            return Err(Error::InvalidAddress(format!(
                "root node must have path '/', got {}",
                root.full_path
            )));
        }
        root.full_path = "/".to_string();
        Ok(Self { root })
    }

    pub fn root(&self) -> &OscQueryNode {
        &self.root
    }

    pub fn into_node(self) -> OscQueryNode {
        self.root
    }

    /// Exact-match lookup; `/` and the empty path return the root
    pub fn get_node_with_path(&self, path: &str) -> Option<&OscQueryNode> {
        let mut current = &self.root;
        for seg in address::segments(path) {
            current = current.contents.get(seg)?;
        }
        Some(current)
    }

    pub fn get_node_with_path_mut(&mut self, path: &str) -> Option<&mut OscQueryNode> {
        let mut current = &mut self.root;
        for seg in address::segments(path) {
            current = current.contents.get_mut(seg)?;
        }
        Some(current)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get_node_with_path(path).is_some()
    }

    /// Insert `node` at its `full_path`, replacing any node already there.
    ///
    /// The replaced node's subtree goes with it. Missing ancestors are
    /// created as `NoValue` containers. Inserting at `/` swaps the root but
    /// keeps its access at `NoValue`.
    pub fn add_node(&mut self, mut node: OscQueryNode) -> &mut OscQueryNode {
        let segments: Vec<String> = address::segments(&node.full_path)
            .map(str::to_string)
            .collect();
        node.full_path = address::join(&segments);

        let Some((last, parents)) = segments.split_last() else {
            node.access = Some(Access::NoValue);
            self.root = node;
            return &mut self.root;
        };

        let mut current = &mut self.root;
        let mut path = String::new();
        for seg in parents {
            path.push('/');
            path.push_str(seg);
            current = current
                .contents
                .entry(seg.clone())
                .or_insert_with(|| OscQueryNode::container(path.clone()));
        }

        match current.contents.entry(last.clone()) {
            Entry::Occupied(mut slot) => {
                slot.insert(node);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(node),
        }
    }

    /// Detach the node at `path` together with its subtree.
    ///
    /// Returns the removed node, or `None` if nothing was there. The root
    /// cannot be removed.
    pub fn remove_node(&mut self, path: &str) -> Option<OscQueryNode> {
        let segments: Vec<&str> = address::segments(path).collect();
        let (last, parents) = segments.split_last()?;

        let mut current = &mut self.root;
        for seg in parents {
            current = current.contents.get_mut(*seg)?;
        }
        current.contents.remove(*last)
    }

    /// Set the value at `path`, creating a bare node there if needed
    pub fn set_value(&mut self, path: &str, value: impl Into<String>) {
        let value = value.into();
        match self.get_node_with_path_mut(path) {
            Some(target) => target.value = Some(value),
            None => {
                self.add_node(OscQueryNode::new(path).with_value(value));
            }
        }
    }

    /// Total number of nodes, including the root
    pub fn len(&self) -> usize {
        self.root.subtree_len()
    }

    /// True when the root has no children
    pub fn is_empty(&self) -> bool {
        self.root.is_leaf()
    }

    /// Serialize the node at `path` (and its subtree) to JSON
    pub fn node_json(&self, path: &str) -> Option<Result<Vec<u8>>> {
        self.get_node_with_path(path).map(|node| {
            serde_json::to_vec(node).map_err(|e| Error::EncodeError(e.to_string()))
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.root).map_err(|e| Error::EncodeError(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let root: OscQueryNode =
            serde_json::from_str(json).map_err(|e| Error::DecodeError(e.to_string()))?;
        Self::from_node(root)
    }
}

impl Default for OscQueryRootNode {
    fn default() -> Self {
        Self::new()
    }
}
