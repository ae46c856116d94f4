//! Node representation: one declared resource in one group

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identifier of a group (one deployable document, a "stack")
///
/// Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GroupId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Composite node identity: owning group plus local name
///
/// Displays as `group/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub group: GroupId,
    pub name: String,
}

impl NodeId {
    pub fn new(group: impl Into<GroupId>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Parse a `group/name` address. The group is everything before the
    /// first slash; local names may not be empty.
    pub fn parse(address: &str) -> Option<Self> {
        let (group, name) = address.split_once('/')?;
        if group.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(group, name))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

/// Recursive property tree value
///
/// Maps keep insertion order so regenerated documents read like their input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<PropertyValue>),
    Object(Properties),
}

/// Ordered key/value map with unique keys
pub type Properties = IndexMap<String, PropertyValue>;

impl PropertyValue {
    /// An empty map, the default property tree of a node
    pub fn empty_object() -> Self {
        Self::Object(Properties::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Properties> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// True for `null` and for an empty map
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Build a single-key map, the shape of every intrinsic function
    pub fn single(key: impl Into<String>, value: PropertyValue) -> Self {
        let mut map = Properties::new();
        map.insert(key.into(), value);
        Self::Object(map)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// A node in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Composite identity; `id.group` is the owning group
    pub id: NodeId,
    /// Resource type tag (e.g., "AWS::SNS::Topic")
    pub kind: String,
    /// Property tree
    pub properties: PropertyValue,
    /// Side-channel attributes kept outside the property tree
    /// (deletion policy, metadata, conditions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Properties>,
}

impl Node {
    /// Create a node with an empty property tree
    pub fn new(id: NodeId, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            properties: PropertyValue::empty_object(),
            metadata: None,
        }
    }

    /// Add a top-level property
    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        match &mut self.properties {
            PropertyValue::Object(map) => {
                map.insert(key.into(), value);
            }
            other => {
                *other = PropertyValue::single(key, value);
            }
        }
        self
    }

    /// Replace the whole property tree
    pub fn with_properties(mut self, properties: PropertyValue) -> Self {
        self.properties = properties;
        self
    }

    /// Set one side-channel attribute
    pub fn with_metadata(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.metadata
            .get_or_insert_with(Properties::new)
            .insert(key.into(), value);
        self
    }

    /// Owning group
    pub fn group(&self) -> &GroupId {
        &self.id.group
    }
}
