//! Nodes of the OSC address tree
//!
//! Serialized with the uppercase attribute names OSCQuery peers expect:
//! ```json
//! {
//!   "FULL_PATH": "/avatar",
//!   "ACCESS": 0,
//!   "CONTENTS": {
//!     "gain": { "FULL_PATH": "/avatar/gain", "ACCESS": 3, "TYPE": "f", "VALUE": ["0.5"] }
//!   }
//! }
//! ```

use crate::address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Access mode of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Access {
    /// Container only, no value
    #[default]
    NoValue = 0,
    ReadOnly = 1,
    WriteOnly = 2,
    ReadWrite = 3,
}

impl Access {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Access::NoValue),
            1 => Some(Access::ReadOnly),
            2 => Some(Access::WriteOnly),
            3 => Some(Access::ReadWrite),
            _ => None,
        }
    }
}

impl Serialize for Access {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for Access {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        Access::from_u8(raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid ACCESS value: {}", raw)))
    }
}

/// One addressable entry in the OSC tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OscQueryNode {
    /// Absolute path of this node
    #[serde(rename = "FULL_PATH")]
    pub full_path: String,

    /// Access mode, unset for bare value nodes
    #[serde(rename = "ACCESS", default, skip_serializing_if = "Option::is_none")]
    pub access: Option<Access>,

    /// OSC type-tag string, e.g. `"if"`
    #[serde(rename = "TYPE", default, skip_serializing_if = "Option::is_none")]
    pub osc_type: Option<String>,

    /// Current value in string form
    #[serde(
        rename = "VALUE",
        default,
        skip_serializing_if = "Option::is_none",
        with = "value_format"
    )]
    pub value: Option<String>,

    /// Human-readable label
    #[serde(rename = "DESCRIPTION", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Children keyed by path segment
    #[serde(rename = "CONTENTS", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contents: BTreeMap<String, OscQueryNode>,
}

impl OscQueryNode {
    /// Create a bare node with no metadata
    pub fn new(full_path: impl Into<String>) -> Self {
        Self {
            full_path: full_path.into(),
            access: None,
            osc_type: None,
            value: None,
            description: None,
            contents: BTreeMap::new(),
        }
    }

    /// Create an intermediate container node
    pub fn container(full_path: impl Into<String>) -> Self {
        Self::new(full_path).with_access(Access::NoValue)
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_type(mut self, osc_type: impl Into<String>) -> Self {
        self.osc_type = Some(osc_type.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Last path segment, empty for the root
    pub fn name(&self) -> &str {
        address::segments(&self.full_path).last().unwrap_or("")
    }

    /// Direct child by segment name
    pub fn child(&self, segment: &str) -> Option<&OscQueryNode> {
        self.contents.get(segment)
    }

    pub fn children(&self) -> impl Iterator<Item = &OscQueryNode> {
        self.contents.values()
    }

    pub fn is_leaf(&self) -> bool {
        self.contents.is_empty()
    }

    /// Number of nodes in this subtree, including this one
    pub fn subtree_len(&self) -> usize {
        1 + self.children().map(OscQueryNode::subtree_len).sum::<usize>()
    }

    /// Visit this node and every descendant, parents before children
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a OscQueryNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

/// `VALUE` is written as a one-element array and read back from either a
/// bare scalar or an array whose first element is a scalar.
mod value_format {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_seq(std::iter::once(v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        match raw {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => match items.into_iter().next() {
                None => Ok(None),
                Some(first) => scalar(first).map_err(serde::de::Error::custom),
            },
            Some(other) => scalar(other).map_err(serde::de::Error::custom),
        }
    }

    fn scalar(value: Value) -> Result<Option<String>, String> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(format!("unsupported VALUE: {}", other)),
        }
    }
}
