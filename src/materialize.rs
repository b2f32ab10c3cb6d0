//! Lazy object materialization from `class`/`params` specifications.
//!
//! A mapping carrying a `class` key is an object specification: the class is
//! resolved through the import capability and invoked with the materialized
//! `params`. Materialization runs on read, never at load time, and nothing is
//! memoized — every read constructs a fresh instance.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, error};

use crate::error::ConfigError;
use crate::registry::{ClassRef, Object, Resolve};
use crate::tree::{Mapping, Node};

/// Reserved key naming the qualified class of an object specification.
pub const CLASS_KEY: &str = "class";
/// Reserved key holding constructor parameters.
pub const PARAMS_KEY: &str = "params";

/// Output of materialization: plain data with constructed objects spliced in.
#[derive(Clone)]
pub enum Loaded {
    /// Scalar passthrough.
    Value(Node),
    Sequence(Vec<Loaded>),
    Mapping(IndexMap<String, Loaded>),
    /// Uninstantiated class reference.
    Class(ClassRef),
    /// Freshly constructed instance.
    Object(Object),
}

impl Loaded {
    pub fn as_value(&self) -> Option<&Node> {
        match self {
            Loaded::Value(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Node::as_i64)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Node::as_str)
    }

    pub fn as_sequence(&self) -> Option<&[Loaded]> {
        match self {
            Loaded::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Loaded>> {
        match self {
            Loaded::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Downcast a constructed instance to its concrete type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Loaded::Object(object) => Arc::clone(object).downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Reassemble into a plain tree; `None` if any constructed object remains.
    pub fn into_node(self) -> Option<Node> {
        match self {
            Loaded::Value(node) => Some(node),
            Loaded::Sequence(items) => items
                .into_iter()
                .map(Loaded::into_node)
                .collect::<Option<Vec<_>>>()
                .map(Node::Sequence),
            Loaded::Mapping(map) => map
                .into_iter()
                .map(|(key, value)| value.into_node().map(|node| (key, node)))
                .collect::<Option<Mapping>>()
                .map(Node::Mapping),
            Loaded::Class(class) => Some(Node::Class(class)),
            Loaded::Object(_) => None,
        }
    }
}

impl fmt::Debug for Loaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Loaded::Value(node) => node.fmt(f),
            Loaded::Sequence(items) => f.debug_list().entries(items).finish(),
            Loaded::Mapping(map) => f.debug_map().entries(map).finish(),
            Loaded::Class(class) => class.fmt(f),
            Loaded::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl PartialEq for Loaded {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Loaded::Value(a), Loaded::Value(b)) => a == b,
            (Loaded::Sequence(a), Loaded::Sequence(b)) => a == b,
            (Loaded::Mapping(a), Loaded::Mapping(b)) => a == b,
            (Loaded::Class(a), Loaded::Class(b)) => a == b,
            // Instances compare by identity.
            (Loaded::Object(a), Loaded::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Recursively materialize `node`, constructing every object specification.
///
/// `args`/`kwargs` are caller-supplied construction arguments, threaded to
/// every specification reached outside of a `params` value. Keyword
/// collisions resolve in favor of file-supplied params; sequence params
/// append after the caller's positionals. With `instantiate` false, classes
/// resolve but are returned unconstructed.
pub fn materialize(
    node: &Node,
    resolver: &Arc<dyn Resolve>,
    args: &[Loaded],
    kwargs: &IndexMap<String, Loaded>,
    instantiate: bool,
) -> Result<Loaded, ConfigError> {
    match node {
        Node::Sequence(items) => items
            .iter()
            .map(|item| materialize(item, resolver, args, kwargs, instantiate))
            .collect::<Result<Vec<_>, _>>()
            .map(Loaded::Sequence),
        Node::Mapping(map) if map.contains_key(CLASS_KEY) => {
            construct_object(map, resolver, args, kwargs, instantiate)
        }
        Node::Mapping(map) => materialize_entries(map, resolver, args, kwargs, instantiate),
        Node::Class(class) => Ok(Loaded::Class(class.clone())),
        scalar => Ok(Loaded::Value(scalar.clone())),
    }
}

fn materialize_entries(
    map: &Mapping,
    resolver: &Arc<dyn Resolve>,
    args: &[Loaded],
    kwargs: &IndexMap<String, Loaded>,
    instantiate: bool,
) -> Result<Loaded, ConfigError> {
    let mut out = IndexMap::with_capacity(map.len());
    for (key, value) in map {
        out.insert(
            key.clone(),
            materialize(value, resolver, args, kwargs, instantiate)?,
        );
    }
    Ok(Loaded::Mapping(out))
}

fn construct_object(
    spec: &Mapping,
    resolver: &Arc<dyn Resolve>,
    args: &[Loaded],
    kwargs: &IndexMap<String, Loaded>,
    instantiate: bool,
) -> Result<Loaded, ConfigError> {
    let Some(name) = spec.get(CLASS_KEY).and_then(Node::as_str) else {
        error!("object specification has a non-string class; leaving it as data");
        return materialize_entries(spec, resolver, args, kwargs, instantiate);
    };

    let class = match resolver.resolve(name) {
        Ok(class) => class,
        Err(err) => {
            error!(class = %name, error = %err, "unable to resolve class; leaving specification as data");
            return materialize_entries(spec, resolver, args, kwargs, instantiate);
        }
    };

    if !instantiate {
        return Ok(Loaded::Class(class));
    }

    // Params materialize inside-out, without the caller's arguments.
    let params = match spec.get(PARAMS_KEY) {
        Some(node) => materialize(node, resolver, &[], &IndexMap::new(), true)?,
        None => Loaded::Mapping(IndexMap::new()),
    };

    let mut call_args: Vec<Loaded> = args.to_vec();
    let mut call_kwargs: IndexMap<String, Loaded> = kwargs.clone();
    match params {
        Loaded::Mapping(params) => {
            // Caller kwargs act as defaults; file params win on collision.
            for (key, value) in params {
                call_kwargs.insert(key, value);
            }
        }
        Loaded::Sequence(params) => call_args.extend(params),
        _ => {
            return Err(ConfigError::MalformedParams {
                class: name.to_string(),
            });
        }
    }

    debug!(class = %name, "constructing object");
    class.construct(call_args, call_kwargs).map(Loaded::Object)
}
