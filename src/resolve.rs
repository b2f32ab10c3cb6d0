//! Directive resolution: `include::` and `import::` markers.
//!
//! Directives are recognized by a prefix test on raw string values and
//! resolved depth-first, in place. Resolution output is never re-scanned;
//! an included file resolves its own directives while it loads.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error};

use crate::config::Config;
use crate::error::ConfigError;
use crate::registry::Resolve;
use crate::tree::Node;

/// Top-level key naming a parent config file.
pub const PARENT_KEY: &str = "parent";
/// Prefix splicing in another config file.
pub const INCLUDE_PREFIX: &str = "include::";
/// Prefix resolving a qualified name through the import capability.
pub const IMPORT_PREFIX: &str = "import::";

/// Resolve every directive reachable from `node`.
///
/// Include paths are taken relative to `base_dir`, the directory of the file
/// that produced this tree. An unresolvable import is logged and left in
/// place; a failing include load propagates.
pub(crate) fn resolve_directives(
    node: &mut Node,
    base_dir: &Path,
    resolver: &Arc<dyn Resolve>,
) -> Result<(), ConfigError> {
    match node {
        Node::String(value) => {
            if let Some(name) = value.strip_prefix(IMPORT_PREFIX) {
                let name = name.to_string();
                debug!(name = %name, "resolving import directive");
                match resolver.resolve(&name) {
                    Ok(class) => *node = Node::Class(class),
                    Err(err) => {
                        error!(name = %name, error = %err, "unable to resolve import, leaving value in place");
                    }
                }
            } else if let Some(rest) = value.strip_prefix(INCLUDE_PREFIX) {
                let path = base_dir.join(rest);
                debug!(path = %path.display(), "resolving include directive");
                let nested = Config::from_file(&path, Arc::clone(resolver))?;
                *node = Node::Mapping(nested.into_attrs());
            }
        }
        Node::Sequence(items) => {
            for item in items {
                resolve_directives(item, base_dir, resolver)?;
            }
        }
        Node::Mapping(map) => {
            for value in map.values_mut() {
                resolve_directives(value, base_dir, resolver)?;
            }
        }
        _ => {}
    }
    Ok(())
}
