//! Hierarchical configuration loading.
//!
//! A config file can inherit from a parent file, splice in other files via
//! `include::` values, resolve qualified names via `import::` values,
//! declare constructible objects with `class`/`params` mappings, and be
//! overridden from the command line with dotted-path keys.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod materialize;
pub mod overrides;
pub mod registry;
pub mod resolve;
pub mod tree;

pub use config::{Config, LoadOptions};
pub use error::ConfigError;
pub use materialize::Loaded;
pub use registry::{ClassRef, Construct, Object, Registry, Resolve};
pub use tree::{Key, Mapping, Node};
