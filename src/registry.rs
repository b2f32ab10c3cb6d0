//! Injectable import capability: qualified names resolved to class references.
//!
//! There is no reflection to lean on, so the capability is a hand-maintained
//! registry mapping qualified names to factory functions. Anything that needs
//! dynamic resolution takes a `Resolve` implementation.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::materialize::Loaded;

/// A constructed instance returned by a factory.
pub type Object = Arc<dyn Any + Send + Sync>;

/// Factory registered under a qualified class name.
pub trait Construct: Send + Sync {
    /// Qualified name the factory is registered under.
    fn qualified_name(&self) -> &str;

    /// Build an instance from positional and keyword arguments.
    fn construct(
        &self,
        args: Vec<Loaded>,
        kwargs: IndexMap<String, Loaded>,
    ) -> Result<Object, ConfigError>;
}

/// Cheaply cloneable handle to a registered factory.
#[derive(Clone)]
pub struct ClassRef(Arc<dyn Construct>);

impl ClassRef {
    pub fn new(inner: Arc<dyn Construct>) -> Self {
        Self(inner)
    }

    pub fn qualified_name(&self) -> &str {
        self.0.qualified_name()
    }

    pub fn construct(
        &self,
        args: Vec<Loaded>,
        kwargs: IndexMap<String, Loaded>,
    ) -> Result<Object, ConfigError> {
        self.0.construct(args, kwargs)
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassRef").field(&self.qualified_name()).finish()
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.qualified_name() == other.qualified_name()
    }
}

/// Resolves a qualified dotted name to a class reference.
pub trait Resolve: Send + Sync {
    /// Returns `ConfigError::UnresolvedImport` when the name is unknown.
    fn resolve(&self, qualified_name: &str) -> Result<ClassRef, ConfigError>;
}

/// Hand-maintained name -> factory table backing `Resolve`.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    entries: HashMap<String, ClassRef>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under its qualified name.
    pub fn register(&mut self, class: ClassRef) {
        self.entries.insert(class.qualified_name().to_string(), class);
    }

    /// Register a plain closure as a factory.
    pub fn register_fn<F>(&mut self, qualified_name: impl Into<String>, factory: F)
    where
        F: Fn(Vec<Loaded>, IndexMap<String, Loaded>) -> Result<Object, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        let name = qualified_name.into();
        self.register(ClassRef::new(Arc::new(FnConstruct {
            name,
            factory: Box::new(factory),
        })));
    }
}

impl Resolve for Registry {
    fn resolve(&self, qualified_name: &str) -> Result<ClassRef, ConfigError> {
        self.entries
            .get(qualified_name)
            .cloned()
            .ok_or_else(|| ConfigError::UnresolvedImport(qualified_name.to_string()))
    }
}

type FactoryFn =
    Box<dyn Fn(Vec<Loaded>, IndexMap<String, Loaded>) -> Result<Object, ConfigError> + Send + Sync>;

/// Adapter exposing a closure as a `Construct` implementation.
struct FnConstruct {
    name: String,
    factory: FactoryFn,
}

impl Construct for FnConstruct {
    fn qualified_name(&self) -> &str {
        &self.name
    }

    fn construct(
        &self,
        args: Vec<Loaded>,
        kwargs: IndexMap<String, Loaded>,
    ) -> Result<Object, ConfigError> {
        (self.factory)(args, kwargs)
    }
}
