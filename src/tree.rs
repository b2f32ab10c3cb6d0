//! Generic value tree shared by every resolution pass.
//!
//! Every format backend parses into this model and every pass (parent
//! overlay, directive resolution, overrides, materialization) walks it.
//! Mappings preserve insertion order and sequences are dense.

use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::registry::ClassRef;
use crate::resolve::IMPORT_PREFIX;

/// Insertion-ordered mapping of attribute names to values.
pub type Mapping = IndexMap<String, Node>;

/// Universal tree node: scalar, sequence, mapping, or a resolved class
/// reference left behind by an `import::` directive.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Node>),
    Mapping(Mapping),
    Class(ClassRef),
}

impl Node {
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Number(number) => number.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Number(number) => number.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Live reference to the entry addressed by `key`.
    pub fn entry(&self, key: &Key) -> Option<&Node> {
        match (self, key) {
            (Node::Mapping(map), Key::Name(name)) => map.get(name),
            (Node::Sequence(items), Key::Index(index)) => items.get(*index),
            _ => None,
        }
    }

    /// Live mutable reference to the entry addressed by `key`.
    ///
    /// Mutating through this reference mutates the original tree; the
    /// override engine relies on that.
    pub fn entry_mut(&mut self, key: &Key) -> Option<&mut Node> {
        match (self, key) {
            (Node::Mapping(map), Key::Name(name)) => map.get_mut(name),
            (Node::Sequence(items), Key::Index(index)) => items.get_mut(*index),
            _ => None,
        }
    }
}

/// Address of an entry inside a container node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Mapping key.
    Name(String),
    /// Sequence index.
    Index(usize),
}

/// The "valid key" rule for dotted-path traversal.
///
/// A mapping matches the literal segment as a key (checked first); a
/// sequence matches a segment that parses as an in-range index. The two
/// addressing schemes dispatch on the container type and are never unified.
pub fn valid_key(container: &Node, segment: &str) -> Option<Key> {
    if let Node::Mapping(map) = container {
        if map.contains_key(segment) {
            return Some(Key::Name(segment.to_string()));
        }
    }
    if let Node::Sequence(items) = container {
        if let Ok(index) = segment.parse::<usize>() {
            if index < items.len() {
                return Some(Key::Index(index));
            }
        }
    }
    None
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(value) => Node::Bool(value),
            Value::Number(number) => Node::Number(number),
            Value::String(value) => Node::String(value),
            Value::Array(items) => Node::Sequence(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => {
                Node::Mapping(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        match node {
            Node::Null => Value::Null,
            Node::Bool(value) => Value::Bool(*value),
            Node::Number(number) => Value::Number(number.clone()),
            Node::String(value) => Value::String(value.clone()),
            Node::Sequence(items) => Value::Array(items.iter().map(Value::from).collect()),
            Node::Mapping(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
            }
            // A resolved import serializes back to its source form.
            Node::Class(class) => Value::String(format!("{IMPORT_PREFIX}{}", class.qualified_name())),
        }
    }
}

/// Convert a root mapping to a `serde_json::Value` object.
pub fn mapping_to_value(map: &Mapping) -> Value {
    Value::Object(map.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
}
